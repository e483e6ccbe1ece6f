pub mod config;
pub mod fsm;
pub mod gnc;
pub mod route;
pub mod telemetry;
pub mod vehicle;

// One-stop imports for embedding the stack in a simulation loop.
pub mod types {
    pub use crate::config::{
        AltitudeConfig, GncConfig, HeadingConfig, PidGains, PositionConfig, RouteConfig,
        VelocityConfig,
    };
    pub use crate::gnc::position::{PosState, PositionController};
    pub use crate::route::{RouteError, RouteSearch, RouteSolution};
    pub use crate::vehicle::{ActuatorCommand, VehicleSample};
}
