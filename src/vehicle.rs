use nalgebra::{Vector2, Vector3};

// ---------------------------------------------------------------------------
// Vehicle boundary types
// ---------------------------------------------------------------------------
//
// The stack reads one sample per tick and writes one command per tick.
// No physics lives here; the surrounding simulation owns the dynamics.

/// Sensor snapshot read at the start of a control tick.
#[derive(Debug, Clone, Copy)]
pub struct VehicleSample {
    /// World position (m); `z` is altitude above ground.
    pub pos: Vector3<f64>,
    /// Sample timestamp (s). Monotonic; repeated values hold the last
    /// command.
    pub t: f64,
    /// Compass heading (degrees).
    pub heading: f64,
    /// Measured main rotor speed (RPM).
    pub main_rotor: f64,
    /// Measured tail rotor speed (RPM).
    pub tail_rotor: f64,
    /// Measured tilt (degrees).
    pub tilt: f64,
    /// Remaining fuel fraction in [0, 1].
    pub fuel: f64,
}

impl VehicleSample {
    /// Ground-plane position.
    pub fn pos_2d(&self) -> Vector2<f64> {
        Vector2::new(self.pos.x, self.pos.y)
    }
}

/// Actuator set-points written back at the end of a control tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ActuatorCommand {
    pub main_rotor: f64,
    pub tail_rotor: f64,
    pub tilt: f64,
}
