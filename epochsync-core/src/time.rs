//! Time primitives for edge devices
//!
//! Defines the epoch-seconds representation shared by every clock in the
//! crate, plus the simple tick sources and clocks used for hosting,
//! simulation and tests:
//! - `ManualTicks` (hand-driven millisecond counter)
//! - `StdTicks` (monotonic host counter, requires `std`)
//! - `ManualClock` (in-memory epoch-seconds clock)

use core::cell::Cell;

use crate::traits::{Clock, TickSource, Ticks};

/// Seconds since the crate epoch
///
/// Signed so that times before the epoch can be expressed. With the
/// default zero offset this is Unix time, which fits until 2038.
pub type EpochSeconds = i32;

/// Sentinel for "no valid time"
pub const INVALID_SECONDS: EpochSeconds = EpochSeconds::MIN;

/// Difference between the local estimate and a reference, in seconds
///
/// Negative means the local clock was behind.
pub type ClockSkew = i16;

/// Whether `seconds` holds a real time rather than the sentinel
pub const fn is_valid(seconds: EpochSeconds) -> bool {
    seconds != INVALID_SECONDS
}

/// Millisecond counter advanced by hand
///
/// Interior mutability lets a test keep advancing the counter while a
/// `SystemClock` holds a shared reference to it.
#[derive(Debug, Default)]
pub struct ManualTicks {
    ticks: Cell<Ticks>,
}

impl ManualTicks {
    /// Create a counter starting at `ticks`
    pub fn new(ticks: Ticks) -> Self {
        Self { ticks: Cell::new(ticks) }
    }

    /// Jump to an absolute counter value
    pub fn set(&self, ticks: Ticks) {
        self.ticks.set(ticks);
    }

    /// Advance by `ms`, wrapping like a hardware counter
    pub fn advance(&self, ms: u32) {
        self.ticks.set(self.ticks.get().wrapping_add(ms));
    }
}

impl TickSource for ManualTicks {
    fn now(&self) -> Ticks {
        self.ticks.get()
    }
}

/// Host millisecond counter (requires std)
///
/// Counts from construction and truncates to 32 bits, mimicking the
/// wrapping hardware counters of embedded targets.
#[cfg(feature = "std")]
#[derive(Debug, Clone)]
pub struct StdTicks {
    start: std::time::Instant,
}

#[cfg(feature = "std")]
impl StdTicks {
    /// Start counting from zero now
    pub fn new() -> Self {
        Self { start: std::time::Instant::now() }
    }
}

#[cfg(feature = "std")]
impl Default for StdTicks {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "std")]
impl TickSource for StdTicks {
    fn now(&self) -> Ticks {
        self.start.elapsed().as_millis() as Ticks
    }
}

/// In-memory clock
///
/// Holds whatever it was last set to and does not advance on its own.
/// Useful as a RAM-backed reference that a user sets manually, and as a
/// stand-in device in tests. Counts writes so callers can observe
/// write-through traffic.
#[derive(Debug)]
pub struct ManualClock {
    seconds: Cell<EpochSeconds>,
    writes: Cell<u32>,
}

impl ManualClock {
    /// Create a clock reading `seconds`
    pub fn new(seconds: EpochSeconds) -> Self {
        Self {
            seconds: Cell::new(seconds),
            writes: Cell::new(0),
        }
    }

    /// Number of `set_now()` calls received
    pub fn write_count(&self) -> u32 {
        self.writes.get()
    }

    /// Change the reported time without counting a write
    pub fn adjust(&self, seconds: EpochSeconds) {
        self.seconds.set(seconds);
    }
}

impl Clock for ManualClock {
    fn get_now(&self) -> EpochSeconds {
        self.seconds.get()
    }

    fn set_now(&self, epoch_seconds: EpochSeconds) {
        self.seconds.set(epoch_seconds);
        self.writes.set(self.writes.get() + 1);
    }
}
