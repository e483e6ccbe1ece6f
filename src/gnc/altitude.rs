use std::collections::VecDeque;

use crate::config::AltitudeConfig;
use crate::fsm::{EventSource, Hooks, Machine};
use crate::gnc::estimator::RateEstimator;
use crate::gnc::pid::{Pid, MIN_DT};
use crate::telemetry::channel;
use crate::telem;

// ---------------------------------------------------------------------------
// Altitude axis: PID on altitude error driving main rotor speed
// ---------------------------------------------------------------------------
//
// Gain and operating-band scheduling follows the fuel fraction: a lighter
// vehicle hovers at a lower rotor speed, so the hover reference and the band
// around it are linear in remaining fuel. Landing uses a stiffer gain set
// than cruise.

const TAG: &str = "alt";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AltState {
    OnGround,
    ChangingAltitude,
    AtAltitude,
    ShuttingDown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AltEvent {
    RotorStarted,
    NewTargetSet,
    AtAltitude,
    Stop,
}

pub struct AltCore {
    cfg: AltitudeConfig,
    events: VecDeque<AltEvent>,
    target: f64,
    actual: f64,
    fuel: f64,
    rotor_actual: f64,
    desired_rotor: f64,
    correction: f64,
    error: f64,
    est: RateEstimator,
    pid: Pid,
}

impl EventSource<AltEvent> for AltCore {
    fn next_event(&mut self) -> Option<AltEvent> {
        self.events.pop_front()
    }
}

impl AltCore {
    /// Rotor speed that holds altitude at the current fuel load (RPM).
    fn hover_speed(&self) -> f64 {
        let c = &self.cfg;
        c.hover_speed_empty + (c.hover_speed_full - c.hover_speed_empty) * self.fuel
    }

    /// Fuel-scheduled operating bounds around the hover speed.
    fn operating_bounds(&self) -> (f64, f64) {
        let band = self.cfg.band_base + self.cfg.band_gain * self.fuel;
        let hover = self.hover_speed();
        ((hover - band).max(0.0), (hover + band).min(self.cfg.max_rotor_speed))
    }

    fn landing(&self) -> bool {
        self.target < self.actual
    }

    fn settled(&self) -> bool {
        self.error.abs() <= self.cfg.tolerance && self.pid.derivative().abs() < self.cfg.settle_rate
    }

    fn command_rotor(&mut self, speed: f64) {
        let (lo, hi) = self.operating_bounds();
        self.desired_rotor = speed.clamp(lo, hi);
    }

    // --- state hooks -------------------------------------------------------

    fn on_ground(core: &mut AltCore) {
        if core.error.abs() > core.cfg.tolerance && core.target > core.actual {
            let hover = core.hover_speed();
            core.command_rotor(hover);
            telem!(TAG, channel::ALTITUDE, "spooling to {hover:.1} rpm for takeoff");
            core.events.push_back(AltEvent::RotorStarted);
        }
    }

    fn changing(core: &mut AltCore) {
        let out = core.hover_speed() + core.correction;
        core.command_rotor(out);
        if core.settled() {
            core.events.push_back(AltEvent::AtAltitude);
        }
    }

    fn holding(core: &mut AltCore) {
        let out = core.hover_speed() + core.correction;
        core.command_rotor(out);
    }

    fn enter_shutdown(core: &mut AltCore) {
        core.target = 0.0;
        core.pid.reset_integral();
    }

    fn shutting_down(core: &mut AltCore) {
        if core.actual <= core.cfg.tolerance {
            core.desired_rotor = 0.0;
        } else {
            let out = core.hover_speed() + core.correction;
            core.command_rotor(out);
        }
    }
}

pub struct AltitudeController {
    fsm: Machine<AltState, AltEvent, AltCore>,
    core: AltCore,
    last_t: Option<f64>,
}

impl AltitudeController {
    pub fn new(cfg: AltitudeConfig) -> Self {
        let core = AltCore {
            events: VecDeque::new(),
            target: 0.0,
            actual: 0.0,
            fuel: 1.0,
            rotor_actual: 0.0,
            desired_rotor: 0.0,
            correction: 0.0,
            error: 0.0,
            est: RateEstimator::new(cfg.ema_weight, cfg.spike_limit),
            pid: Pid::new(cfg.integral_limit, cfg.area_weight),
            cfg,
        };
        let fsm = Machine::new(
            "AltFsm",
            AltState::OnGround,
            &[
                (AltState::OnGround, AltEvent::RotorStarted, AltState::ChangingAltitude, None),
                (AltState::OnGround, AltEvent::NewTargetSet, AltState::OnGround, None),
                (AltState::ChangingAltitude, AltEvent::AtAltitude, AltState::AtAltitude, None),
                (AltState::ChangingAltitude, AltEvent::NewTargetSet, AltState::ChangingAltitude, None),
                (AltState::ChangingAltitude, AltEvent::Stop, AltState::ShuttingDown, None),
                (AltState::AtAltitude, AltEvent::NewTargetSet, AltState::ChangingAltitude, None),
                (AltState::AtAltitude, AltEvent::Stop, AltState::ShuttingDown, None),
                (AltState::ShuttingDown, AltEvent::NewTargetSet, AltState::ChangingAltitude, None),
            ],
            &[
                (AltState::OnGround, Hooks { enter: None, handle: Some(AltCore::on_ground), leave: None }),
                (
                    AltState::ChangingAltitude,
                    Hooks { enter: None, handle: Some(AltCore::changing), leave: None },
                ),
                (AltState::AtAltitude, Hooks { enter: None, handle: Some(AltCore::holding), leave: None }),
                (
                    AltState::ShuttingDown,
                    Hooks {
                        enter: Some(AltCore::enter_shutdown),
                        handle: Some(AltCore::shutting_down),
                        leave: None,
                    },
                ),
            ],
        );
        Self { fsm, core, last_t: None }
    }

    /// One control step: actual altitude, measured main rotor speed, fuel
    /// fraction in [0, 1], and the sample timestamp (s). Returns the desired
    /// main rotor speed.
    pub fn tick(&mut self, altitude: f64, rotor_speed: f64, fuel: f64, t: f64) -> f64 {
        let dt = match self.last_t {
            Some(last) if t - last > MIN_DT => t - last,
            Some(_) => {
                // Degenerate or repeated timestamp: hold the last command.
                return self.core.desired_rotor;
            }
            None => 0.0,
        };
        self.last_t = Some(t);

        let core = &mut self.core;
        core.actual = altitude;
        core.rotor_actual = rotor_speed;
        core.fuel = fuel.clamp(0.0, 1.0);
        core.est.update(altitude, dt);
        core.error = core.target - core.actual;
        let gains = if core.landing() { core.cfg.landing_gains } else { core.cfg.cruise_gains };
        core.correction = core.pid.update(&gains, core.error, dt);
        telem!(
            TAG,
            channel::ALTITUDE,
            "trg: {:.2}, act: {:.2}, rate: {:.4}, err: {:.3}, int: {:.3}, der: {:.4}, des rot: {:.2}",
            core.target,
            core.actual,
            core.est.rate(),
            core.error,
            core.pid.integral(),
            core.pid.derivative(),
            core.desired_rotor
        );

        self.fsm.run_handle(&mut self.core);
        self.fsm.process(&mut self.core);
        self.core.desired_rotor
    }

    /// Command a new target altitude. Resets the integral so windup from
    /// the previous command cannot carry over.
    pub fn set_target(&mut self, altitude: f64) {
        self.core.target = altitude;
        self.core.error = self.core.target - self.core.actual;
        self.core.pid.reset_integral();
        self.fsm.send(AltEvent::NewTargetSet);
    }

    /// Begin the shutdown descent to the ground.
    pub fn stop(&mut self) {
        self.fsm.send(AltEvent::Stop);
    }

    pub fn state(&self) -> AltState {
        self.fsm.state()
    }

    pub fn target(&self) -> f64 {
        self.core.target
    }

    pub fn is_settled(&self) -> bool {
        self.core.settled()
    }

    /// Smoothed vertical rate (m/s).
    pub fn climb_rate(&self) -> f64 {
        self.core.est.rate()
    }

    pub fn desired_rotor_speed(&self) -> f64 {
        self.core.desired_rotor
    }
}

impl Default for AltitudeController {
    fn default() -> Self {
        Self::new(AltitudeConfig::default())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
