//! Constants for EpochSync Core
//!
//! Centralized numeric values used by the system clock, the periodic
//! sync driver and the RTC adapter. Every value carries its unit in the
//! name.
//!
//! ## Organization
//!
//! - **Time**: tick window, skew limits, sync periods and timeouts
//! - **RTC**: battery-backed clock validity floor

/// Tick arithmetic, skew limits and sync scheduling defaults.
pub mod time;

/// Battery-backed RTC validity thresholds.
pub mod rtc;

pub use time::{
    MS_PER_SECOND, TICK_WINDOW_MS, MAX_CLOCK_SKEW_S, MIN_CLOCK_SKEW_S,
    DEFAULT_SYNC_PERIOD_S, DEFAULT_INITIAL_SYNC_PERIOD_S, DEFAULT_REQUEST_TIMEOUT_MS,
};

pub use rtc::{MIN_VALID_UNIX_SECONDS, UNIX_EPOCH_OFFSET_S};
