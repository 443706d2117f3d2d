//! System Clock: Epoch Seconds from a Millisecond Counter
//!
//! ## Overview
//!
//! [`SystemClock`] keeps a running estimate of the current time in epoch
//! seconds on a device whose only always-available time base is a
//! free-running millisecond counter. It can be corrected from a more
//! accurate *reference* clock and can mirror its corrections into a
//! battery-backed *backup* clock that is read once at boot.
//!
//! ```text
//!  TickSource ──ms──→ ┌─────────────┐ ──write-through──→ backup (RTC)
//!                     │ SystemClock │
//!  reference ──secs─→ └─────────────┘ ←──restore at boot── backup
//! ```
//!
//! ## Advancing
//!
//! Only the low 16 bits of the tick counter are remembered. On every
//! [`query_now`](SystemClock::query_now) the elapsed ticks are recovered
//! by wrapping subtraction and one second is credited per full 1000 ticks;
//! the sub-second remainder stays in the snapshot, so nothing drifts and
//! nothing is counted twice.
//!
//! ```text
//! prev = 64_000, now = 1_500 (wrapped)
//! elapsed = 1_500 - 64_000 (mod 2^16) = 3_036
//! → +3 seconds, prev = 64_000 + 3_000 (mod 2^16) = 1_464
//! ```
//!
//! **Caller obligation:** call `query_now()` or
//! [`keep_alive`](SystemClock::keep_alive) at least once every 65.535 s.
//! A longer gap wraps the 16-bit window and the missing multiple of
//! 65.536 s is silently lost; the clock cannot detect it.
//!
//! ## Merging
//!
//! Every correction goes through [`merge_time`](SystemClock::merge_time):
//! it records the sync time and the skew, then steps the estimate to the
//! candidate. A candidate that already agrees is recorded but changes
//! nothing else, sparing the backup a write.
//!
//! ## Concurrency
//!
//! Single execution context only. Every mutating method takes `&mut self`;
//! wrap the whole clock in one mutex if several threads must share it.

use crate::constants::time::{MAX_CLOCK_SKEW_S, MIN_CLOCK_SKEW_S, MS_PER_SECOND};
use crate::traits::{same_device, Clock, TickSource};
use crate::time::{ClockSkew, EpochSeconds, INVALID_SECONDS};

/// How corrections that move the clock backwards are reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SyncPolicy {
    /// Step to the corrected time immediately, even if that is earlier
    #[default]
    Step,
    /// Never report a time earlier than one already reported
    ///
    /// After a backward correction `query_now()` repeats the highest value
    /// it returned until the corrected estimate catches up. Skew, sync
    /// time and backup writes are unaffected.
    Monotonic,
}

/// Snapshot of the clock state for diagnostics and telemetry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClockStatus {
    /// Current estimate, or `INVALID_SECONDS`
    pub epoch_seconds: EpochSeconds,
    /// Time of the last accepted correction, or `INVALID_SECONDS`
    pub last_sync_time: EpochSeconds,
    /// Local minus reference at the last correction
    pub clock_skew: ClockSkew,
    /// Whether any correction has been applied
    pub is_initialized: bool,
}

/// Epoch-seconds clock driven by a millisecond tick source
///
/// `T` is the injected tick source; pass `&ticks` to keep control of a
/// [`ManualTicks`](crate::ManualTicks) in tests. Reference and backup
/// clocks are borrowed for `'a` and may be the same device.
pub struct SystemClock<'a, T: TickSource> {
    ticks: T,
    reference: Option<&'a dyn Clock>,
    backup: Option<&'a dyn Clock>,
    policy: SyncPolicy,

    epoch_seconds: EpochSeconds,
    last_sync_time: EpochSeconds,
    /// Low 16 bits of the tick counter at the last whole second
    prev_ticks: u16,
    clock_skew: ClockSkew,
    is_init: bool,
    /// Highest value returned by `query_now()`, used by `Monotonic`
    high_water: EpochSeconds,
}

impl<'a, T: TickSource> SystemClock<'a, T> {
    /// Create an uninitialized clock
    ///
    /// No device is touched. Call [`restore_from_backup`] once at startup
    /// to pick up the time preserved across power loss.
    ///
    /// [`restore_from_backup`]: SystemClock::restore_from_backup
    pub fn new(
        ticks: T,
        reference: Option<&'a dyn Clock>,
        backup: Option<&'a dyn Clock>,
    ) -> Self {
        Self {
            ticks,
            reference,
            backup,
            policy: SyncPolicy::Step,
            epoch_seconds: INVALID_SECONDS,
            last_sync_time: INVALID_SECONDS,
            prev_ticks: 0,
            clock_skew: 0,
            is_init: false,
            high_water: INVALID_SECONDS,
        }
    }

    /// Select how backward corrections are reported
    pub fn with_policy(mut self, policy: SyncPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Re-wire the reference and backup clocks and forget the current time
    ///
    /// Leaves the clock exactly as `new()` would, keeping the tick source
    /// and policy. No device is touched.
    pub fn init(&mut self, reference: Option<&'a dyn Clock>, backup: Option<&'a dyn Clock>) {
        self.reference = reference;
        self.backup = backup;

        self.epoch_seconds = INVALID_SECONDS;
        self.last_sync_time = INVALID_SECONDS;
        self.prev_ticks = 0;
        self.clock_skew = 0;
        self.is_init = false;
        self.high_water = INVALID_SECONDS;
    }

    /// Load the time preserved by the backup clock
    ///
    /// Merged exactly like a reference sync: a differing value is written
    /// through to the backup unless it is the reference device itself.
    /// The reference is not seeded; [`set_now`](SystemClock::set_now)
    /// does that. A backup with no valid time leaves the clock untouched.
    /// No-op without a backup.
    pub fn restore_from_backup(&mut self) {
        let Some(backup) = self.backup else {
            return;
        };

        let seconds = backup.get_now();
        if seconds == INVALID_SECONDS {
            log_warn!("Backup clock has no valid time; running unset");
            return;
        }

        log_info!("Restoring time from backup: {}", seconds);
        self.merge_time(seconds);
    }

    /// Current time in epoch seconds, or `INVALID_SECONDS` if never set
    ///
    /// Credits every whole second elapsed on the tick source since the
    /// previous call. Must be called (directly or via `keep_alive()`)
    /// more often than every 65.535 s.
    pub fn query_now(&mut self) -> EpochSeconds {
        if !self.is_init {
            return INVALID_SECONDS;
        }

        self.advance();

        if self.policy == SyncPolicy::Monotonic {
            self.high_water = self.high_water.max(self.epoch_seconds);
        }
        self.reported()
    }

    /// Advance the clock without reading it
    ///
    /// For periodic drivers that only need to keep the 16-bit tick window
    /// from wrapping.
    pub fn keep_alive(&mut self) {
        let _ = self.query_now();
    }

    /// Apply a correction from a reference or an explicit set
    ///
    /// - `INVALID_SECONDS` is ignored entirely.
    /// - Otherwise the sync time and skew are always recorded. The skew is
    ///   computed exactly and then clamped to `i16`, so differences beyond
    ///   ±32767 s (about 9 hours) read as `i16::MIN` / `i16::MAX`.
    /// - A candidate equal to the current estimate stops there.
    /// - A differing candidate replaces the estimate, restarts the tick
    ///   snapshot and is written through to the backup clock, unless the
    ///   backup is the reference device itself.
    ///
    /// The stored estimate is compared as-is, without crediting ticks
    /// elapsed since the last `query_now()`.
    pub fn merge_time(&mut self, candidate: EpochSeconds) {
        if candidate == INVALID_SECONDS {
            log_trace!("Ignoring invalid candidate");
            return;
        }

        self.last_sync_time = candidate;
        let skew = i64::from(self.epoch_seconds) - i64::from(candidate);
        self.clock_skew = saturate_skew(skew);
        if skew == 0 {
            log_trace!("Clock agrees with {}", candidate);
            return;
        }

        if self.is_init && i64::from(self.clock_skew) != skew {
            log_warn!("Skew {}s clamped to {}s", skew, self.clock_skew);
        }
        log_debug!("Clock stepped {} -> {} (skew {}s)", self.epoch_seconds, candidate, self.clock_skew);

        self.epoch_seconds = candidate;
        self.prev_ticks = self.ticks.now() as u16;
        self.is_init = true;

        match self.backup {
            Some(_) if self.backup_aliases_reference() => {
                log_debug!("Skipping write-back to shared reference/backup");
            }
            Some(backup) => backup.set_now(candidate),
            None => {}
        }
    }

    /// Set the time explicitly, e.g. from user input
    ///
    /// Merges like [`merge_time`](SystemClock::merge_time) and also
    /// forwards the value to the reference clock, which a sync pulled
    /// *from* the reference never does. `INVALID_SECONDS` is ignored.
    pub fn set_now(&mut self, epoch_seconds: EpochSeconds) {
        if epoch_seconds == INVALID_SECONDS {
            log_trace!("Ignoring invalid set");
            return;
        }

        self.merge_time(epoch_seconds);

        if let Some(reference) = self.reference {
            reference.set_now(epoch_seconds);
        }
    }

    /// Read the reference clock and merge the result
    ///
    /// **Blocks** for as long as the reference `get_now()` takes, which
    /// can be seconds for network sources. Intended for diagnostics; the
    /// periodic driver uses the non-blocking request protocol instead.
    /// Never writes to the reference. No-op without a reference.
    pub fn force_sync(&mut self) {
        if let Some(reference) = self.reference {
            let seconds = reference.get_now();
            self.merge_time(seconds);
        }
    }

    /// Time of the last accepted correction, or `INVALID_SECONDS`
    pub fn last_sync_time(&self) -> EpochSeconds {
        self.last_sync_time
    }

    /// Local minus reference at the last correction, clamped to `i16`
    ///
    /// Negative means this clock was behind.
    pub fn clock_skew(&self) -> ClockSkew {
        self.clock_skew
    }

    /// Whether a valid time has ever been applied
    pub fn is_initialized(&self) -> bool {
        self.is_init
    }

    /// Policy for backward corrections
    pub fn policy(&self) -> SyncPolicy {
        self.policy
    }

    /// State snapshot, without advancing the clock
    ///
    /// `epoch_seconds` is what `query_now()` last reported or would report
    /// for the stored estimate, so under `Monotonic` it is held at the
    /// high-water mark after a backward correction.
    pub fn status(&self) -> ClockStatus {
        ClockStatus {
            epoch_seconds: self.reported(),
            last_sync_time: self.last_sync_time,
            clock_skew: self.clock_skew,
            is_initialized: self.is_init,
        }
    }

    /// Whether a reference clock is configured
    pub fn has_reference(&self) -> bool {
        self.reference.is_some()
    }

    /// Whether a backup clock is configured
    pub fn has_backup(&self) -> bool {
        self.backup.is_some()
    }

    /// The reference clock, if any
    pub fn reference(&self) -> Option<&'a dyn Clock> {
        self.reference
    }

    /// The backup clock, if any
    pub fn backup(&self) -> Option<&'a dyn Clock> {
        self.backup
    }

    /// Whether backup and reference are the same device
    pub fn backup_aliases_reference(&self) -> bool {
        match (self.backup, self.reference) {
            (Some(backup), Some(reference)) => same_device(backup, reference),
            _ => false,
        }
    }

    /// The injected tick source
    pub fn ticks(&self) -> &T {
        &self.ticks
    }

    fn reported(&self) -> EpochSeconds {
        match (self.is_init, self.policy) {
            (false, _) => INVALID_SECONDS,
            (true, SyncPolicy::Step) => self.epoch_seconds,
            (true, SyncPolicy::Monotonic) => self.high_water.max(self.epoch_seconds),
        }
    }

    fn advance(&mut self) {
        let now = self.ticks.now() as u16;
        while now.wrapping_sub(self.prev_ticks) >= MS_PER_SECOND {
            self.prev_ticks = self.prev_ticks.wrapping_add(MS_PER_SECOND);
            self.epoch_seconds = self.epoch_seconds.saturating_add(1);
        }
    }
}

/// Clamp an exact skew to the representable `ClockSkew` range
pub fn saturate_skew(skew: i64) -> ClockSkew {
    skew.clamp(i64::from(MIN_CLOCK_SKEW_S), i64::from(MAX_CLOCK_SKEW_S)) as ClockSkew
}
