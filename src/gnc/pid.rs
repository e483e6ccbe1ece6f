use crate::config::PidGains;

// ---------------------------------------------------------------------------
// PID control law (single axis)
// ---------------------------------------------------------------------------

/// Elapsed-time deltas below this are degenerate; derivative and integral
/// updates are skipped rather than dividing toward infinity.
pub const MIN_DT: f64 = 1.0e-6;

/// PID state separated from its gains: callers that gain-schedule (the
/// altitude axis swaps cruise and landing sets) pass the gains per update.
#[derive(Debug, Clone)]
pub struct Pid {
    integral: f64,
    prev_error: f64,
    derivative: f64,
    integral_limit: f64,
    area_weight: f64,
    primed: bool,
}

impl Pid {
    pub fn new(integral_limit: f64, area_weight: f64) -> Self {
        Self {
            integral: 0.0,
            prev_error: 0.0,
            derivative: 0.0,
            integral_limit,
            area_weight,
            primed: false,
        }
    }

    /// Advance the law one step and return the control output.
    ///
    /// A degenerate `dt` leaves integral and derivative at their previous
    /// values; only the proportional term tracks the fresh error.
    pub fn update(&mut self, gains: &PidGains, error: f64, dt: f64) -> f64 {
        if dt > MIN_DT {
            self.integral =
                (self.integral + self.area_weight * error * dt).clamp(-self.integral_limit, self.integral_limit);
            if self.primed {
                self.derivative = (error - self.prev_error) / dt;
            }
        }
        self.prev_error = error;
        self.primed = true;
        gains.kp * error + gains.ki * self.integral + gains.kd * self.derivative
    }

    /// Zero the accumulated integral. Called on every new target so windup
    /// from one command never bleeds into the next.
    pub fn reset_integral(&mut self) {
        self.integral = 0.0;
    }

    pub fn integral(&self) -> f64 {
        self.integral
    }

    /// Rate of change of the error as of the last update.
    pub fn derivative(&self) -> f64 {
        self.derivative
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GAINS: PidGains = PidGains { kp: 1.0, ki: 1.0, kd: 1.0 };

    #[test]
    fn proportional_only() {
        let mut pid = Pid::new(100.0, 1.0);
        let g = PidGains { kp: 2.0, ki: 0.0, kd: 0.0 };
        let out = pid.update(&g, 0.5, 0.01);
        assert!((out - 1.0).abs() < 1e-12, "pure P should output kp * error");
    }

    #[test]
    fn integral_stays_clamped_under_sustained_error() {
        let mut pid = Pid::new(1.5, 1.0);
        for _ in 0..1000 {
            pid.update(&GAINS, 50.0, 0.1);
            assert!(pid.integral().abs() <= 1.5, "integral escaped the clamp");
        }
        for _ in 0..1000 {
            pid.update(&GAINS, -50.0, 0.1);
            assert!(pid.integral().abs() <= 1.5);
        }
    }

    #[test]
    fn derivative_needs_two_samples() {
        let mut pid = Pid::new(100.0, 1.0);
        pid.update(&GAINS, 1.0, 0.1);
        assert_eq!(pid.derivative(), 0.0, "no derivative from a single sample");
        pid.update(&GAINS, 0.5, 0.1);
        assert!((pid.derivative() + 5.0).abs() < 1e-12);
    }

    #[test]
    fn degenerate_dt_holds_integral_and_derivative() {
        let mut pid = Pid::new(100.0, 1.0);
        pid.update(&GAINS, 1.0, 0.1);
        pid.update(&GAINS, 2.0, 0.1);
        let (i, d) = (pid.integral(), pid.derivative());
        let out = pid.update(&GAINS, 3.0, 0.0);
        assert_eq!(pid.integral(), i);
        assert_eq!(pid.derivative(), d);
        assert!(out.is_finite());
    }

    #[test]
    fn area_weight_scales_accumulation() {
        let mut a = Pid::new(100.0, 1.0);
        let mut b = Pid::new(100.0, 2.0);
        a.update(&GAINS, 1.0, 0.1);
        b.update(&GAINS, 1.0, 0.1);
        assert!((b.integral() - 2.0 * a.integral()).abs() < 1e-12);
    }
}
