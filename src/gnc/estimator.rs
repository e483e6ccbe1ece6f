use crate::gnc::pid::MIN_DT;

// ---------------------------------------------------------------------------
// Finite-difference rate/accel estimation with noise rejection
// ---------------------------------------------------------------------------

/// First and second finite differences of a sampled signal, EMA-smoothed,
/// with single-sample spike rejection.
///
/// The raw rate is compared against the smoothed one before blending: a jump
/// beyond `spike_limit` is a one-frame sensor glitch and the previous value
/// is held instead, so outliers never reach the PID derivative path.
#[derive(Debug, Clone)]
pub struct RateEstimator {
    value: f64,
    rate: f64,
    accel: f64,
    ema_weight: f64,
    spike_limit: f64,
    primed: bool,
}

impl RateEstimator {
    pub fn new(ema_weight: f64, spike_limit: f64) -> Self {
        Self { value: 0.0, rate: 0.0, accel: 0.0, ema_weight, spike_limit, primed: false }
    }

    /// Feed one sample. Degenerate `dt` holds all estimates.
    pub fn update(&mut self, value: f64, dt: f64) {
        if !self.primed {
            self.value = value;
            self.primed = true;
            return;
        }
        if dt <= MIN_DT {
            return;
        }
        let raw_rate = (value - self.value) / dt;
        self.value = value;
        if (raw_rate - self.rate).abs() > self.spike_limit {
            // implausible jump: hold previous estimates
            return;
        }
        let smoothed = blend(self.rate, raw_rate, self.ema_weight);
        let raw_accel = (smoothed - self.rate) / dt;
        self.accel = blend(self.accel, raw_accel, self.ema_weight);
        self.rate = smoothed;
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn accel(&self) -> f64 {
        self.accel
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.ema_weight, self.spike_limit);
    }
}

fn blend(old: f64, new: f64, weight: f64) -> f64 {
    old * (1.0 - weight) + new * weight
}
