//! Error Types for Clock Capabilities and the Sync Driver
//!
//! The system clock itself never fails: an unknown time is reported as
//! [`INVALID_SECONDS`](crate::time::INVALID_SECONDS) and a missing
//! reference or backup clock turns the affected operation into a no-op.
//! The types here describe what can go wrong *around* it:
//!
//! - a reference clock answering a request with no valid time,
//! - a reference request that is never answered,
//! - a driver misconfiguration.
//!
//! Like the rest of the crate the errors are `Copy`, hold no heap data and
//! fit in 8 bytes, so they can be stored in driver state without cost.
//!
//! ```rust
//! use epochsync_core::{ClockError, Clock, ManualClock, INVALID_SECONDS};
//!
//! let rtc = ManualClock::new(INVALID_SECONDS);
//! rtc.send_request();
//! match rtc.poll_response() {
//!     Ok(_seconds) => {}
//!     Err(nb::Error::WouldBlock) => {} // poll again later
//!     Err(nb::Error::Other(ClockError::InvalidTime)) => {} // RTC never set
//!     Err(nb::Error::Other(_)) => {}
//! }
//! ```

use thiserror_no_std::Error;

/// Result type for clock capability operations
pub type ClockResult<T> = Result<T, ClockError>;

/// Errors reported by reference clocks and the sync driver
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockError {
    /// The clock answered, but has no valid time
    #[error("Clock has no valid time")]
    InvalidTime,

    /// A request was sent but no response arrived in time
    #[error("Reference request timed out after {waited_ms} ms")]
    Timeout {
        /// Milliseconds spent waiting before giving up
        waited_ms: u32,
    },

    /// No reference clock is configured
    #[error("No reference clock configured")]
    NoReference,
}

/// Errors returned when validating a driver configuration
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A period or timeout was zero
    #[error("{field} must be non-zero")]
    ZeroDuration {
        /// Name of the offending setting
        field: &'static str,
    },

    /// The initial sync period is longer than the steady-state period
    #[error("Initial sync period {initial_s}s exceeds sync period {period_s}s")]
    InitialExceedsPeriod {
        /// Initial period in seconds
        initial_s: u32,
        /// Steady-state period in seconds
        period_s: u32,
    },
}

#[cfg(feature = "defmt")]
impl defmt::Format for ClockError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::InvalidTime =>
                defmt::write!(fmt, "Clock has no valid time"),
            Self::Timeout { waited_ms } =>
                defmt::write!(fmt, "Request timed out after {} ms", waited_ms),
            Self::NoReference =>
                defmt::write!(fmt, "No reference clock"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for ConfigError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::ZeroDuration { field } =>
                defmt::write!(fmt, "{} must be non-zero", field),
            Self::InitialExceedsPeriod { initial_s, period_s } =>
                defmt::write!(fmt, "Initial period {}s exceeds {}s", initial_s, period_s),
        }
    }
}
