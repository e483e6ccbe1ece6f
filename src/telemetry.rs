use std::sync::atomic::{AtomicU32, Ordering};

// ---------------------------------------------------------------------------
// Telemetry: fire-and-forget debug channels
// ---------------------------------------------------------------------------
//
// Each controller owns a bit in a process-wide channel mask. Records are
// line-oriented, tagged by component name, and forwarded to the `log`
// facade; nothing in the control stack ever reads them back.

pub mod channel {
    pub const ALTITUDE: u32 = 0x02;
    pub const HEADING: u32 = 0x04;
    pub const VELOCITY: u32 = 0x08;
    pub const POSITION: u32 = 0x10;
    pub const ROUTE: u32 = 0x20;
    pub const FSM: u32 = 0x40;
    pub const ALL: u32 = u32::MAX;
}

static DEBUG_MASK: AtomicU32 = AtomicU32::new(0);

/// Enable/disable debug channels for the whole process.
pub fn set_debug_mask(mask: u32) {
    DEBUG_MASK.store(mask, Ordering::Relaxed);
}

pub fn debug_mask() -> u32 {
    DEBUG_MASK.load(Ordering::Relaxed)
}

/// Emit one record on `chan`, tagged with the component name.
pub fn dbg(tag: &str, chan: u32, args: std::fmt::Arguments<'_>) {
    if DEBUG_MASK.load(Ordering::Relaxed) & chan != 0 {
        log::debug!(target: "heli_gnc", "{tag}> {args}");
    }
}

/// `dbg!`-style convenience wrapper used by the controllers.
#[macro_export]
macro_rules! telem {
    ($tag:expr, $chan:expr, $($arg:tt)*) => {
        $crate::telemetry::dbg($tag, $chan, format_args!($($arg)*))
    };
}
