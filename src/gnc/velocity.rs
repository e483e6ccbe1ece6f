use std::collections::VecDeque;

use nalgebra::Vector2;

use crate::config::VelocityConfig;
use crate::fsm::{EventSource, Hooks, Machine};
use crate::gnc::angle::{heading_dot, normalize_360};
use crate::gnc::estimator::RateEstimator;
use crate::gnc::pid::{Pid, MIN_DT};
use crate::telemetry::channel;
use crate::telem;

// ---------------------------------------------------------------------------
// Velocity axis: PID on forward ground speed driving tilt angle
// ---------------------------------------------------------------------------
//
// Ground speed is measured from position displacement. The sign convention
// is relative to the nose: when the displacement heading is more than 90
// degrees off the facing the vehicle is moving backward and the speed is
// negated. Tilt is computed directly from the PID sum (not nudged
// incrementally), which keeps the command drift-free.

const TAG: &str = "vel";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VelState {
    Idle,
    Active,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VelEvent {
    Engage,
    Idle,
}

pub struct VelCore {
    cfg: VelocityConfig,
    events: VecDeque<VelEvent>,
    target: f64,
    speed: f64,
    velocity_heading: f64,
    facing: f64,
    actual_tilt: f64,
    desired_tilt: f64,
    correction: f64,
    est: RateEstimator,
    pid: Pid,
}

impl EventSource<VelEvent> for VelCore {
    fn next_event(&mut self) -> Option<VelEvent> {
        self.events.pop_front()
    }
}

impl VelCore {
    fn idle(core: &mut VelCore) {
        core.pid.reset_integral();
        core.desired_tilt = 0.0;
    }

    fn active(core: &mut VelCore) {
        core.desired_tilt = core.correction.clamp(-core.cfg.max_tilt, core.cfg.max_tilt);
    }
}

pub struct VelocityController {
    fsm: Machine<VelState, VelEvent, VelCore>,
    core: VelCore,
    last_pos: Option<Vector2<f64>>,
    last_t: Option<f64>,
}

impl VelocityController {
    pub fn new(cfg: VelocityConfig) -> Self {
        let core = VelCore {
            events: VecDeque::new(),
            target: 0.0,
            speed: 0.0,
            velocity_heading: 0.0,
            facing: 0.0,
            actual_tilt: 0.0,
            desired_tilt: 0.0,
            correction: 0.0,
            est: RateEstimator::new(cfg.ema_weight, cfg.spike_limit),
            pid: Pid::new(cfg.integral_limit, 1.0),
            cfg,
        };
        let fsm = Machine::new(
            "VelFsm",
            VelState::Idle,
            &[
                (VelState::Idle, VelEvent::Engage, VelState::Active, None),
                (VelState::Active, VelEvent::Engage, VelState::Active, None),
                (VelState::Active, VelEvent::Idle, VelState::Idle, None),
                (VelState::Idle, VelEvent::Idle, VelState::Idle, None),
            ],
            &[
                (VelState::Idle, Hooks { enter: None, handle: Some(VelCore::idle), leave: None }),
                (VelState::Active, Hooks { enter: None, handle: Some(VelCore::active), leave: None }),
            ],
        );
        Self { fsm, core, last_pos: None, last_t: None }
    }

    /// One control step: 2D position, measured tilt, facing (degrees) and
    /// sample timestamp. Returns the desired tilt in degrees, signed.
    pub fn tick(&mut self, pos: Vector2<f64>, tilt: f64, facing: f64, t: f64) -> f64 {
        let dt = match self.last_t {
            Some(last) if t - last > MIN_DT => t - last,
            Some(_) => return self.core.desired_tilt,
            None => 0.0,
        };
        self.last_t = Some(t);

        let core = &mut self.core;
        core.actual_tilt = tilt;
        core.facing = normalize_360(facing);

        match self.last_pos {
            None => {
                core.speed = 0.0;
                core.velocity_heading = core.facing;
            }
            Some(last) => {
                let disp = pos - last;
                let len = disp.norm();
                if dt > MIN_DT {
                    if len > 1.0e-9 {
                        core.velocity_heading = normalize_360(disp.y.atan2(disp.x).to_degrees());
                    }
                    let mut speed = len / dt;
                    // Nose-relative sign: opposed displacement means
                    // backward motion.
                    if heading_dot(core.velocity_heading, core.facing) < 0.0 {
                        speed = -speed;
                    }
                    core.speed = speed;
                }
            }
        }
        self.last_pos = Some(pos);
        core.est.update(core.speed, dt);

        let error = core.target - core.speed;
        core.correction = core.pid.update(&core.cfg.gains, error, dt);
        telem!(
            TAG,
            channel::VELOCITY,
            "trg: {:.4}, spd: {:.4}, hdg: {:.2}, face: {:.2}, tilt: {:.3}/{:.3}",
            core.target,
            core.speed,
            core.velocity_heading,
            core.facing,
            core.desired_tilt,
            core.actual_tilt
        );

        self.fsm.run_handle(&mut self.core);
        self.fsm.process(&mut self.core);
        self.core.desired_tilt
    }

    /// Command a forward speed. Zero keeps the loop active so it brakes to
    /// a stop; use [`idle`](Self::idle) to drop the axis entirely.
    pub fn set_speed(&mut self, speed: f64) {
        if speed.abs() < 1.0e-4 {
            self.core.target = 0.0;
        } else {
            // Callers re-command the speed every tick as the remaining
            // distance shrinks; only a genuinely new set-point restarts the
            // integrator and re-locks the motion direction to the nose.
            if (speed - self.core.target).abs() > self.core.cfg.tolerance {
                self.core.pid.reset_integral();
                self.core.velocity_heading = self.core.facing;
            }
            self.core.target = speed;
        }
        self.fsm.send(VelEvent::Engage);
    }

    /// Drop to idle: integral zeroed, tilt forced flat.
    pub fn idle(&mut self) {
        self.core.target = 0.0;
        self.fsm.send(VelEvent::Idle);
    }

    pub fn state(&self) -> VelState {
        self.fsm.state()
    }

    pub fn target(&self) -> f64 {
        self.core.target
    }

    /// Signed ground speed (m/s), negative when moving tail-first.
    pub fn speed(&self) -> f64 {
        self.core.speed
    }

    /// Compass heading of the last measured displacement.
    pub fn velocity_heading(&self) -> f64 {
        self.core.velocity_heading
    }

    /// Smoothed rate of change of ground speed (m/s^2).
    pub fn accel(&self) -> f64 {
        self.core.est.rate()
    }

    pub fn actual_tilt(&self) -> f64 {
        self.core.actual_tilt
    }

    /// Motion is aligned (or exactly opposed) with the nose, or the vehicle
    /// is stopped. False means lateral drift the position loop must fix.
    pub fn is_along_path(&self) -> bool {
        let dot = heading_dot(self.core.velocity_heading, self.core.facing);
        (dot.abs() - 1.0).abs() <= self.core.cfg.along_path_tol || self.is_stopped()
    }

    /// Moving nose-first (or stopped).
    pub fn is_forward(&self) -> bool {
        let dot = heading_dot(self.core.velocity_heading, self.core.facing);
        (dot - 1.0).abs() <= self.core.cfg.along_path_tol || self.is_stopped()
    }

    pub fn is_stopped(&self) -> bool {
        self.core.speed.abs() <= self.core.cfg.stopped_speed
            && self.core.est.rate().abs() <= self.core.cfg.settle_rate
            && self.core.actual_tilt.abs() <= self.core.cfg.stopped_tilt
    }

    pub fn is_settled(&self) -> bool {
        (self.core.target - self.core.speed).abs() <= self.core.cfg.tolerance
            && self.core.pid.derivative().abs() <= self.core.cfg.settle_rate
    }
}

impl Default for VelocityController {
    fn default() -> Self {
        Self::new(VelocityConfig::default())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
