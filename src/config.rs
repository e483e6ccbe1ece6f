// ---------------------------------------------------------------------------
// Tuned parameters
// ---------------------------------------------------------------------------
//
// Every gain and operating bound the controllers use lives here with a
// Default carrying the consolidated tuning. The physical limits (rotor
// speeds, tilt, heading rate) mirror the vehicle model this stack was tuned
// against: main rotor 0..400 RPM, tail rotor 80..120 RPM stable at 100,
// tilt magnitude 10 degrees.

/// One PID gain set. Controllers that gain-schedule keep several of these
/// and pick per tick.
#[derive(Debug, Clone, Copy)]
pub struct PidGains {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
}

#[derive(Debug, Clone)]
pub struct AltitudeConfig {
    /// Hover rotor speed with dry tanks (RPM).
    pub hover_speed_empty: f64,
    /// Hover rotor speed with full tanks (RPM).
    pub hover_speed_full: f64,
    /// Operating band half-width around the scheduled hover speed at zero
    /// fuel; widens by `band_gain` per unit fuel fraction.
    pub band_base: f64,
    pub band_gain: f64,
    /// Absolute rotor ceiling (RPM).
    pub max_rotor_speed: f64,
    /// Gain set for general altitude seeking.
    pub cruise_gains: PidGains,
    /// Larger set used when the target is below the current altitude.
    pub landing_gains: PidGains,
    pub integral_limit: f64,
    pub area_weight: f64,
    /// Altitude capture tolerance (m).
    pub tolerance: f64,
    /// Error-derivative magnitude below which the axis counts as settled.
    pub settle_rate: f64,
    /// EMA weight for new rate/accel samples.
    pub ema_weight: f64,
    /// Raw-rate jump (m/s) beyond which a sample is rejected as noise.
    pub spike_limit: f64,
}

impl Default for AltitudeConfig {
    fn default() -> Self {
        Self {
            hover_speed_empty: 320.0,
            hover_speed_full: 360.0,
            band_base: 40.0,
            band_gain: 40.0,
            max_rotor_speed: 400.0,
            cruise_gains: PidGains { kp: 12.0, ki: 0.02, kd: 6.0 },
            landing_gains: PidGains { kp: 14.0, ki: 0.02, kd: 9.0 },
            integral_limit: 200.0,
            area_weight: 1.0,
            tolerance: 1.0,
            settle_rate: 0.1,
            ema_weight: 0.05,
            spike_limit: 10.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HeadingConfig {
    /// Tail rotor speed that produces zero yaw rate (RPM).
    pub stable_speed: f64,
    pub min_speed: f64,
    pub max_speed: f64,
    pub gains: PidGains,
    pub integral_limit: f64,
    /// Heading capture tolerance (degrees).
    pub tolerance: f64,
    pub settle_rate: f64,
}

impl Default for HeadingConfig {
    fn default() -> Self {
        Self {
            stable_speed: 100.0,
            min_speed: 80.0,
            max_speed: 120.0,
            gains: PidGains { kp: 0.35, ki: 0.0005, kd: 0.25 },
            integral_limit: 200.0,
            tolerance: 0.5,
            settle_rate: 0.05,
        }
    }
}

#[derive(Debug, Clone)]
pub struct VelocityConfig {
    /// Commanded tilt magnitude limit (degrees).
    pub max_tilt: f64,
    pub gains: PidGains,
    pub integral_limit: f64,
    /// Speed capture tolerance (m/s).
    pub tolerance: f64,
    pub settle_rate: f64,
    /// Below this speed magnitude the vehicle counts as stopped.
    pub stopped_speed: f64,
    /// Actual tilt magnitude below which the vehicle counts as stopped.
    pub stopped_tilt: f64,
    /// |dot| distance from 1 within which motion counts as along the nose.
    pub along_path_tol: f64,
    pub ema_weight: f64,
    pub spike_limit: f64,
}

impl Default for VelocityConfig {
    fn default() -> Self {
        Self {
            max_tilt: 10.0,
            gains: PidGains { kp: 6.0, ki: 0.5, kd: 2.0 },
            integral_limit: 10.0,
            tolerance: 0.01,
            settle_rate: 0.01,
            stopped_speed: 0.05,
            stopped_tilt: 0.1,
            along_path_tol: 0.01,
            ema_weight: 0.05,
            spike_limit: 5.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PositionConfig {
    /// Transit altitude between waypoints (m).
    pub cruise_altitude: f64,
    /// Climb to within this many meters of the cruise altitude before any
    /// lateral motion.
    pub cruise_margin: f64,
    /// Altitude held while decelerating over the target (m).
    pub approach_altitude: f64,
    /// Target speed = speed_per_distance * remaining + min_speed.
    pub speed_per_distance: f64,
    pub min_speed: f64,
    /// Fraction of the initial distance at which deceleration may begin.
    pub decel_fraction: f64,
    /// Safety factor on the kinematic stopping distance.
    pub stop_margin: f64,
    /// 2D distance within which landing is attempted (m).
    pub land_distance: f64,
    /// Heading misalignment (degrees) that forces a re-turn before a
    /// fine-adjustment move.
    pub realign_tolerance: f64,
    /// Altitude/sink-rate thresholds for touchdown and settling.
    pub touch_down_altitude: f64,
    pub touch_down_rate: f64,
    pub settle_altitude: f64,
    /// Distance under which turning in place is skipped.
    pub turn_skip_distance: f64,
    /// Seconds between went-too-far baseline refreshes.
    pub baseline_period: f64,
    /// Distance growth beyond the baseline that counts as overshoot.
    pub overshoot_slack: f64,
    /// Floor for the observed-acceleration estimate (divide-by-zero guard).
    pub min_accel: f64,
}

impl Default for PositionConfig {
    fn default() -> Self {
        Self {
            cruise_altitude: 75.0,
            cruise_margin: 15.0,
            approach_altitude: 30.0,
            speed_per_distance: 0.0015,
            min_speed: 0.25,
            decel_fraction: 0.525,
            stop_margin: 1.06,
            land_distance: 0.7,
            realign_tolerance: 0.2,
            touch_down_altitude: 0.2,
            touch_down_rate: 0.1,
            settle_altitude: 0.5,
            turn_skip_distance: 4.0,
            baseline_period: 0.6,
            overshoot_slack: 0.5,
            min_accel: 1.0e-4,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RouteConfig {
    /// Divisors folding a leg's bearing change (radians) and length into one
    /// score.
    pub heading_divisor: f64,
    pub distance_divisor: f64,
    /// Legs longer than this get penalized, shorter than `short_leg`
    /// rewarded.
    pub long_leg: f64,
    pub long_leg_penalty: f64,
    pub short_leg: f64,
    pub short_leg_bonus: f64,
    /// Largest waypoint count the exhaustive search will take on.
    pub max_exhaustive: usize,
    /// Worker thread count; 0 picks from available parallelism.
    pub workers: usize,
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            heading_divisor: 16.2,
            distance_divisor: 550.0,
            long_leg: 310.0,
            long_leg_penalty: 1.7,
            short_leg: 36.0,
            short_leg_bonus: 0.7,
            max_exhaustive: 11,
            workers: 0,
        }
    }
}

/// Full configuration bundle for the flight stack.
#[derive(Debug, Clone, Default)]
pub struct GncConfig {
    pub altitude: AltitudeConfig,
    pub heading: HeadingConfig,
    pub velocity: VelocityConfig,
    pub position: PositionConfig,
    pub route: RouteConfig,
}
