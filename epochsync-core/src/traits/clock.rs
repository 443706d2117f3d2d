//! Epoch-Seconds Clock Capability
//!
//! A [`Clock`] is anything that can report and accept the current time in
//! epoch seconds: an NTP client, a GPS receiver, a battery-backed RTC chip.
//! The system clock uses one as its *reference* (authoritative, possibly
//! slow) and optionally one as its *backup* (survives power loss).
//!
//! ## Blocking and Non-Blocking Access
//!
//! `get_now()` may take hundreds of milliseconds on a network or I2C
//! device. Periodic syncing therefore goes through a three-step protocol
//! that never blocks:
//!
//! ```text
//! send_request() ──→ is_response_ready()? ──yes──→ read_response()
//!                          │ no
//!                          └──→ come back on the next loop pass
//! ```
//!
//! [`Clock::poll_response`] wraps the last two steps in an `nb::Result`.
//! Devices that answer instantly can rely on the default methods, which
//! treat every request as immediately ready.
//!
//! ## Shared Devices
//!
//! Every method takes `&self`. The same device may be installed as both
//! reference and backup; the system clock detects this with
//! [`same_device`] and skips the redundant write-back. Implementations
//! that hold mutable state use `Cell`/`RefCell` or talk to hardware
//! registers directly.

use crate::errors::ClockError;
use crate::time::{EpochSeconds, INVALID_SECONDS};

/// Source and sink of epoch seconds
pub trait Clock {
    /// Current time, or `INVALID_SECONDS` if the device has no valid time
    ///
    /// May block.
    fn get_now(&self) -> EpochSeconds;

    /// Set the device time. Best effort, no result.
    fn set_now(&self, epoch_seconds: EpochSeconds);

    /// Start a non-blocking time request
    fn send_request(&self) {}

    /// Whether the response to the last `send_request()` has arrived
    fn is_response_ready(&self) -> bool {
        true
    }

    /// Read the response to the last `send_request()`
    ///
    /// Only meaningful once `is_response_ready()` returned true.
    fn read_response(&self) -> EpochSeconds {
        self.get_now()
    }

    /// Poll for the response to the last request
    ///
    /// Returns:
    /// - `Ok(seconds)` - A valid time arrived
    /// - `Err(nb::Error::WouldBlock)` - No response yet
    /// - `Err(nb::Error::Other(ClockError::InvalidTime))` - The device
    ///   answered with `INVALID_SECONDS`
    fn poll_response(&self) -> nb::Result<EpochSeconds, ClockError> {
        if !self.is_response_ready() {
            return Err(nb::Error::WouldBlock);
        }
        match self.read_response() {
            INVALID_SECONDS => Err(nb::Error::Other(ClockError::InvalidTime)),
            seconds => Ok(seconds),
        }
    }
}

/// Whether two clock handles refer to the same device
///
/// Compares object addresses, never the reported time. Two distinct
/// devices that happen to agree are not the same device.
///
/// Zero-sized devices share one address, so they are never reported as
/// the same device. Installing one as both reference and backup costs a
/// redundant write-back, never a lost one.
pub fn same_device<'a>(a: &'a dyn Clock, b: &'a dyn Clock) -> bool {
    core::mem::size_of_val(a) != 0 && core::ptr::addr_eq(a, b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::ManualClock;

    #[test]
    fn poll_maps_invalid_to_error() {
        let clock = ManualClock::new(INVALID_SECONDS);
        clock.send_request();
        assert_eq!(clock.poll_response(), Err(nb::Error::Other(ClockError::InvalidTime)));

        clock.set_now(42);
        assert_eq!(clock.poll_response(), Ok(42));
    }

    #[test]
    fn identity_not_value() {
        let a = ManualClock::new(100);
        let b = ManualClock::new(100);

        assert!(same_device(&a, &a));
        assert!(!same_device(&a, &b));
    }

    struct OnChipRtc;
    struct GpsReceiver;

    impl Clock for OnChipRtc {
        fn get_now(&self) -> EpochSeconds {
            1_750_000_000
        }

        fn set_now(&self, _epoch_seconds: EpochSeconds) {}
    }

    impl Clock for GpsReceiver {
        fn get_now(&self) -> EpochSeconds {
            1_750_000_005
        }

        fn set_now(&self, _epoch_seconds: EpochSeconds) {}
    }

    static RTC: OnChipRtc = OnChipRtc;
    static GPS: GpsReceiver = GpsReceiver;

    #[test]
    fn zero_sized_devices_are_distinct() {
        assert!(!same_device(&RTC, &GPS));

        let rtc = OnChipRtc;
        let gps = GpsReceiver;
        assert!(!same_device(&rtc, &gps));
    }
}
