//! RTC Constants

/// Raw RTC readings below this Unix time are treated as "never set" (seconds).
///
/// 2024-05-01T00:00:00Z. An RTC that lost its backup battery restarts
/// counting near zero, far below this floor.
pub const MIN_VALID_UNIX_SECONDS: i64 = 1_714_521_600;

/// Offset from the Unix epoch to the crate epoch (seconds).
///
/// Zero means epoch seconds are Unix seconds.
pub const UNIX_EPOCH_OFFSET_S: i64 = 0;
