use std::collections::VecDeque;

use crate::config::HeadingConfig;
use crate::fsm::{EventSource, Hooks, Machine};
use crate::gnc::angle::{heading_error, normalize_360};
use crate::gnc::pid::{Pid, MIN_DT};
use crate::telemetry::channel;
use crate::telem;

// ---------------------------------------------------------------------------
// Heading axis: PID on wrapped heading error driving tail rotor speed
// ---------------------------------------------------------------------------
//
// The error is computed in (-180, 180] so the controller always turns the
// short way, and the derivative is taken on the wrapped error's own history
// so the 359 -> 1 seam never corrupts it. Output is a correction around the
// stable tail speed (zero yaw rate).

const TAG: &str = "head";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeadState {
    AtHeading,
    Turning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeadEvent {
    NewHeadingSet,
    TurnComplete,
}

pub struct HeadCore {
    cfg: HeadingConfig,
    events: VecDeque<HeadEvent>,
    target: f64,
    actual: f64,
    desired_speed: f64,
    correction: f64,
    error: f64,
    pid: Pid,
}

impl EventSource<HeadEvent> for HeadCore {
    fn next_event(&mut self) -> Option<HeadEvent> {
        self.events.pop_front()
    }
}

impl HeadCore {
    fn stable(&self) -> bool {
        self.error.abs() <= self.cfg.tolerance && self.pid.derivative().abs() < self.cfg.settle_rate
    }

    fn at_heading(core: &mut HeadCore) {
        core.desired_speed = core.cfg.stable_speed;
    }

    fn turning(core: &mut HeadCore) {
        let out = core.cfg.stable_speed + core.correction;
        core.desired_speed = out.clamp(core.cfg.min_speed, core.cfg.max_speed);
        if core.stable() {
            core.events.push_back(HeadEvent::TurnComplete);
        }
    }
}

pub struct HeadingController {
    fsm: Machine<HeadState, HeadEvent, HeadCore>,
    core: HeadCore,
    last_t: Option<f64>,
}

impl HeadingController {
    pub fn new(cfg: HeadingConfig) -> Self {
        let core = HeadCore {
            events: VecDeque::new(),
            target: 0.0,
            actual: 0.0,
            desired_speed: cfg.stable_speed,
            correction: 0.0,
            error: 0.0,
            pid: Pid::new(cfg.integral_limit, 1.0),
            cfg,
        };
        let fsm = Machine::new(
            "HeadFsm",
            HeadState::AtHeading,
            &[
                (HeadState::AtHeading, HeadEvent::NewHeadingSet, HeadState::Turning, None),
                (HeadState::Turning, HeadEvent::NewHeadingSet, HeadState::Turning, None),
                (HeadState::Turning, HeadEvent::TurnComplete, HeadState::AtHeading, None),
            ],
            &[
                (
                    HeadState::AtHeading,
                    Hooks { enter: None, handle: Some(HeadCore::at_heading), leave: None },
                ),
                (HeadState::Turning, Hooks { enter: None, handle: Some(HeadCore::turning), leave: None }),
            ],
        );
        Self { fsm, core, last_t: None }
    }

    /// One control step: actual heading (degrees), measured tail rotor speed
    /// and sample timestamp. Returns the desired tail rotor speed.
    pub fn tick(&mut self, heading: f64, _tail_speed: f64, t: f64) -> f64 {
        let dt = match self.last_t {
            Some(last) if t - last > MIN_DT => t - last,
            Some(_) => return self.core.desired_speed,
            None => 0.0,
        };
        self.last_t = Some(t);

        let core = &mut self.core;
        core.actual = normalize_360(heading);
        core.error = heading_error(core.target, core.actual);
        core.correction = core.pid.update(&core.cfg.gains, core.error, dt);
        telem!(
            TAG,
            channel::HEADING,
            "trg: {:.2}, act: {:.2}, err: {:.3}, der: {:.4}, des tail: {:.2}",
            core.target,
            core.actual,
            core.error,
            core.pid.derivative(),
            core.desired_speed
        );

        self.fsm.run_handle(&mut self.core);
        self.fsm.process(&mut self.core);
        self.core.desired_speed
    }

    /// Command a new heading. Input may be any angle; it is normalized into
    /// [0, 360). Resets the integral and requests a turn.
    pub fn set_heading(&mut self, heading: f64) {
        self.core.target = normalize_360(heading);
        self.core.error = heading_error(self.core.target, self.core.actual);
        self.core.pid.reset_integral();
        self.fsm.send(HeadEvent::NewHeadingSet);
    }

    pub fn state(&self) -> HeadState {
        self.fsm.state()
    }

    pub fn target(&self) -> f64 {
        self.core.target
    }

    pub fn actual(&self) -> f64 {
        self.core.actual
    }

    /// Wrapped error as of the last tick, in (-180, 180].
    pub fn error(&self) -> f64 {
        self.core.error
    }

    pub fn is_stable(&self) -> bool {
        self.core.stable()
    }

    /// Rate of change of the wrapped error (deg/s).
    pub fn turn_rate(&self) -> f64 {
        self.core.pid.derivative()
    }
}

impl Default for HeadingController {
    fn default() -> Self {
        Self::new(HeadingConfig::default())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    /// Toy yaw plant: 3 deg/s per RPM of tail offset from stable, the rate
    /// the vehicle model turns at.
    struct Plant {
        heading: f64,
    }

    impl Plant {
        fn step(&mut self, tail_cmd: f64, dt: f64) -> f64 {
            self.heading = normalize_360(self.heading + 3.0 * (tail_cmd - 100.0) * dt);
            self.heading
        }
    }

    fn run_to_target(ctrl: &mut HeadingController, plant: &mut Plant, max_ticks: usize) -> (f64, usize) {
        let dt = 0.1;
        let mut t = 0.0;
        let mut cmd = 100.0;
        let mut turned = 0.0;
        for i in 0..max_ticks {
            t += dt;
            let prev = plant.heading;
            let h = plant.step(cmd, dt);
            turned += heading_error(h, prev).abs();
            cmd = ctrl.tick(h, cmd, t);
            if ctrl.state() == HeadState::AtHeading && i > 2 {
                return (turned, i);
            }
        }
        panic!("never reached heading; act {:.2} trg {:.2}", plant.heading, ctrl.target());
    }

    #[test]
    fn converges_to_commanded_heading() {
        let mut ctrl = HeadingController::default();
        let mut plant = Plant { heading: 0.0 };
        ctrl.tick(0.0, 100.0, 0.0);
        ctrl.set_heading(90.0);
        run_to_target(&mut ctrl, &mut plant, 3000);
        assert!(
            heading_error(90.0, plant.heading).abs() <= 0.5,
            "stopped at {:.2}",
            plant.heading
        );
    }

    #[test]
    fn seam_crossing_takes_the_short_way() {
        let mut ctrl = HeadingController::default();
        let mut plant = Plant { heading: 359.0 };
        ctrl.tick(359.0, 100.0, 0.0);
        ctrl.set_heading(1.0);
        let (turned, _) = run_to_target(&mut ctrl, &mut plant, 3000);
        assert!(turned < 30.0, "took the long way around: {turned:.1} degrees of travel");
        assert!(heading_error(1.0, plant.heading).abs() <= 0.5);
    }

    #[test]
    fn negative_input_normalized() {
        let mut ctrl = HeadingController::default();
        ctrl.set_heading(-90.0);
        assert!((ctrl.target() - 270.0).abs() < 1e-12);
    }

    #[test]
    fn tail_speed_stays_in_hardware_range() {
        let mut ctrl = HeadingController::default();
        ctrl.tick(0.0, 100.0, 0.0);
        ctrl.set_heading(180.0);
        let mut t = 0.0;
        for _ in 0..100 {
            t += 0.1;
            let cmd = ctrl.tick(0.0, 100.0, t); // vehicle refuses to turn
            assert!((80.0..=120.0).contains(&cmd), "tail cmd {cmd} out of range");
        }
    }

    #[test]
    fn integral_clamped_under_sustained_error() {
        let mut ctrl = HeadingController::default();
        ctrl.tick(0.0, 100.0, 0.0);
        ctrl.set_heading(180.0);
        let mut t = 0.0;
        for _ in 0..5000 {
            t += 0.1;
            ctrl.tick(0.0, 100.0, t);
            assert!(ctrl.core.pid.integral().abs() <= 200.0);
        }
    }
}
