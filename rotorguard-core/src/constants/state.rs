//! Operating State Thresholds

/// Trailing window over which the operating state is classified (hours).
pub const DEFAULT_STATE_WINDOW_HOURS: u64 = 2;

/// Speed readings at or below this are treated as stopped (rpm).
pub const DEFAULT_NEAR_ZERO_SPEED: f64 = 10.0;

/// Share of near-zero readings above which the unit is shut down.
pub const DEFAULT_SHUTDOWN_FRACTION: f64 = 0.8;

/// Trailing readings averaged for the "just stopped" check.
pub const SHUTDOWN_TAIL_READINGS: usize = 5;

/// Fraction of nominal speed below which the unit is at low speed.
pub const DEFAULT_LOW_SPEED_FRACTION: f64 = 0.5;

/// Low-speed floor when no nominal speed is configured (rpm).
pub const DEFAULT_ABSOLUTE_LOW_SPEED: f64 = 50.0;

/// Score multiplier applied while running at low speed.
///
/// Low-speed operation is noisier, so scores are damped by 1.5x.
pub const DEFAULT_LOW_SPEED_MULTIPLIER: f64 = 1.0 / 1.5;
