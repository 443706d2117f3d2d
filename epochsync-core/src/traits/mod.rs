//! Capability Traits for EpochSync
//!
//! The system clock depends on two kinds of external capability, both
//! injected rather than hard-wired:
//!
//! - [`tick`] - the free-running millisecond counter it advances from
//! - [`clock`] - epoch-seconds devices used as reference and backup
//!
//! ## Usage Example
//!
//! ```rust
//! use epochsync_core::{ManualClock, ManualTicks, SystemClock};
//!
//! let ticks = ManualTicks::new(0);
//! let rtc = ManualClock::new(1_000);
//!
//! let mut clock = SystemClock::new(&ticks, None, Some(&rtc));
//! clock.restore_from_backup();
//! assert_eq!(clock.query_now(), 1_000);
//! ```

pub mod clock;
pub mod tick;

pub use clock::{same_device, Clock};
pub use tick::{TickSource, Ticks};
