//! Epoch-seconds system clock for edge devices
//!
//! Keeps wall-clock time on a device whose only always-running time base
//! is a free-running millisecond counter, corrected from an authoritative
//! reference clock and preserved across power loss in a battery-backed
//! RTC.
//!
//! Key constraints:
//! - No heap allocation, `no_std` capable
//! - Bounded work per call: at most 65 loop iterations per query
//! - Never fails: unknown time is `INVALID_SECONDS`, missing devices are no-ops
//!
//! ```no_run
//! use epochsync_core::{ManualClock, ManualTicks, SystemClock};
//!
//! let ticks = ManualTicks::new(0);
//! let rtc = ManualClock::new(1_750_000_000);
//!
//! let mut clock = SystemClock::new(&ticks, None, Some(&rtc));
//! clock.restore_from_backup();
//!
//! loop {
//!     let now = clock.query_now(); // call at least every 65 s
//!     // display(now);
//! }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

#[macro_use]
mod logging;

pub mod constants;
pub mod errors;
pub mod system_clock;
pub mod time;
pub mod traits;

#[cfg(feature = "driver")]
pub mod driver;

#[cfg(feature = "rtc")]
pub mod rtc;

// Public API
pub use errors::{ClockError, ClockResult, ConfigError};
pub use system_clock::{ClockStatus, SyncPolicy, SystemClock};
pub use time::{ClockSkew, EpochSeconds, ManualClock, ManualTicks, INVALID_SECONDS};
pub use traits::{Clock, TickSource, Ticks};

#[cfg(feature = "std")]
pub use time::StdTicks;

#[cfg(feature = "driver")]
pub use driver::{SyncLoop, SyncLoopConfig, SyncStatus};

#[cfg(feature = "rtc")]
pub use rtc::{RawRtc, RtcClock};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
