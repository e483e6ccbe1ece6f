// ---------------------------------------------------------------------------
// Guidance / navigation / control
// ---------------------------------------------------------------------------
//
// One controller per vehicle axis (altitude, heading, velocity), each built
// on the same event-machine engine, plus the composite position controller
// that owns all three and sequences a delivery mission through them.

pub mod altitude;
pub mod angle;
pub mod estimator;
pub mod heading;
pub mod pid;
pub mod position;
pub mod velocity;

pub use altitude::{AltState, AltitudeController};
pub use heading::{HeadState, HeadingController};
pub use position::{PosState, PositionController};
pub use velocity::{VelState, VelocityController};
