//! Battery-Backed RTC Adapter
//!
//! Most RTC chips (DS3231, PCF8523, the on-chip RTC of Teensy and STM32)
//! keep Unix seconds across power loss but start over from zero when the
//! backup battery dies. [`RtcClock`] turns such a raw counter into a
//! [`Clock`] suitable as a backup (or reference) for the system clock:
//!
//! - converts between Unix seconds and crate epoch seconds,
//! - reports `INVALID_SECONDS` for readings below a validity floor, so a
//!   reset chip is never mistaken for a real time,
//! - ignores attempts to write `INVALID_SECONDS`.
//!
//! The register-level driver stays outside the crate; it only has to
//! implement [`RawRtc`].

use crate::constants::rtc::{MIN_VALID_UNIX_SECONDS, UNIX_EPOCH_OFFSET_S};
use crate::traits::Clock;
use crate::time::{EpochSeconds, INVALID_SECONDS};

/// Raw seconds counter of an RTC chip
pub trait RawRtc {
    /// Seconds since the Unix epoch as kept by the chip
    fn read_unix(&self) -> i64;

    /// Load the chip counter with Unix seconds
    fn write_unix(&self, unix_seconds: i64);
}

/// [`Clock`] view of a [`RawRtc`]
#[derive(Debug)]
pub struct RtcClock<R: RawRtc> {
    rtc: R,
    epoch_offset: i64,
    min_valid_unix: i64,
}

impl<R: RawRtc> RtcClock<R> {
    /// Wrap a chip using Unix epoch seconds and the default validity floor
    pub fn new(rtc: R) -> Self {
        Self {
            rtc,
            epoch_offset: UNIX_EPOCH_OFFSET_S,
            min_valid_unix: MIN_VALID_UNIX_SECONDS,
        }
    }

    /// Use an epoch that starts `offset` seconds after the Unix epoch
    pub fn with_epoch_offset(mut self, offset: i64) -> Self {
        self.epoch_offset = offset;
        self
    }

    /// Treat raw readings below `unix_seconds` as unset
    pub fn with_min_valid_unix(mut self, unix_seconds: i64) -> Self {
        self.min_valid_unix = unix_seconds;
        self
    }

    /// Borrow the underlying chip
    pub fn inner(&self) -> &R {
        &self.rtc
    }

    /// Release the underlying chip
    pub fn into_inner(self) -> R {
        self.rtc
    }
}

impl<R: RawRtc> Clock for RtcClock<R> {
    fn get_now(&self) -> EpochSeconds {
        let unix = self.rtc.read_unix();
        if unix < self.min_valid_unix {
            log_debug!("RTC reads {} below validity floor", unix);
            return INVALID_SECONDS;
        }

        match EpochSeconds::try_from(unix.saturating_sub(self.epoch_offset)) {
            Ok(INVALID_SECONDS) | Err(_) => {
                log_warn!("RTC value {} outside epoch range", unix);
                INVALID_SECONDS
            }
            Ok(seconds) => seconds,
        }
    }

    fn set_now(&self, epoch_seconds: EpochSeconds) {
        if epoch_seconds == INVALID_SECONDS {
            return;
        }
        self.rtc.write_unix(i64::from(epoch_seconds).saturating_add(self.epoch_offset));
    }
}
