//! Time-Related Constants
//!
//! Tick-to-second conversion factors, the width of the narrow tick
//! snapshot, skew bounds and the default schedule of the sync driver.

// ===== TIME UNIT CONVERSIONS =====

/// Milliseconds per second.
///
/// The tick source is a millisecond counter, so one epoch second is
/// credited for every 1000 ticks.
pub const MS_PER_SECOND: u16 = 1000;

/// Seconds per minute.
pub const SECONDS_PER_MINUTE: u32 = 60;

/// Seconds per hour.
pub const SECONDS_PER_HOUR: u32 = 60 * SECONDS_PER_MINUTE;

// ===== TICK SNAPSHOT =====

/// Rollover window of the 16-bit tick snapshot (milliseconds).
///
/// The system clock remembers only the low 16 bits of the tick counter.
/// Elapsed ticks are recovered by wrapping subtraction, which is only
/// correct while fewer than this many ticks pass between two calls to
/// `query_now()` / `keep_alive()`.
pub const TICK_WINDOW_MS: u32 = 1 << 16;

/// Longest interval between keep-alive calls that loses no seconds (milliseconds).
pub const MAX_KEEP_ALIVE_INTERVAL_MS: u32 = TICK_WINDOW_MS - 1;

// ===== CLOCK SKEW =====

/// Largest positive skew that can be recorded (seconds).
///
/// Skew is stored as `i16`, just over 9 hours. Larger differences are
/// clamped to this value.
pub const MAX_CLOCK_SKEW_S: i16 = i16::MAX;

/// Largest negative skew that can be recorded (seconds).
pub const MIN_CLOCK_SKEW_S: i16 = i16::MIN;

// ===== SYNC SCHEDULE =====

/// Steady-state interval between reference syncs (seconds).
pub const DEFAULT_SYNC_PERIOD_S: u32 = SECONDS_PER_HOUR;

/// Interval between sync attempts right after boot or after a failure (seconds).
///
/// Failed attempts double this interval until it reaches the steady-state
/// period.
pub const DEFAULT_INITIAL_SYNC_PERIOD_S: u32 = 5;

/// How long a pending reference request may stay unanswered (milliseconds).
pub const DEFAULT_REQUEST_TIMEOUT_MS: u32 = 1000;

/// Number of recent skews kept by the sync driver.
pub const SKEW_HISTORY_LEN: usize = 8;
