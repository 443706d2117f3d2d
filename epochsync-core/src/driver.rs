//! Polling-Loop Sync Driver
//!
//! [`SyncLoop`] performs the two maintenance duties a [`SystemClock`]
//! cannot do by itself:
//!
//! 1. **Keep-alive.** Every [`poll`](SyncLoop::poll) advances the clock,
//!    so the 16-bit tick window never wraps as long as the main loop runs.
//! 2. **Reference sync.** Periodically asks the reference clock for the
//!    time using the non-blocking request protocol and merges the answer.
//!
//! Call `poll()` from the application main loop, as often as convenient:
//!
//! ```rust
//! use epochsync_core::{ManualClock, ManualTicks, SystemClock};
//! use epochsync_core::driver::{SyncLoop, SyncLoopConfig};
//!
//! let ticks = ManualTicks::new(0);
//! let ntp = ManualClock::new(1_700_000_000);
//!
//! let clock = SystemClock::new(&ticks, Some(&ntp), None);
//! let mut sync = SyncLoop::new(clock, SyncLoopConfig::default()).unwrap();
//! sync.setup();
//!
//! sync.poll(); // sends the request
//! sync.poll(); // merges the response
//! assert_eq!(sync.query_now(), 1_700_000_000);
//! ```
//!
//! ## Schedule
//!
//! ```text
//!        ┌──────────── period elapsed or clock unset ────────────┐
//!        ↓                                                       │
//!     Idle ──send_request()──→ Sent ──response ok──→ period = sync_period
//!                               │ ──invalid──────→ backoff ──────┘
//!                               └─ ──timeout──────→ backoff
//! ```
//!
//! After a failure the retry interval starts at the initial sync period
//! and doubles until it reaches the steady-state period.

use fugit::{MillisDurationU32, SecsDurationU32};
use heapless::HistoryBuffer;

use crate::constants::time::{
    DEFAULT_INITIAL_SYNC_PERIOD_S, DEFAULT_REQUEST_TIMEOUT_MS, DEFAULT_SYNC_PERIOD_S,
    SKEW_HISTORY_LEN,
};
use crate::errors::{ClockError, ClockResult, ConfigError};
use crate::system_clock::SystemClock;
use crate::traits::{TickSource, Ticks};
use crate::time::{ClockSkew, EpochSeconds};

/// Driver schedule
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyncLoopConfig {
    /// Interval between successful syncs
    pub sync_period: SecsDurationU32,
    /// Retry interval after boot or a failed sync
    pub initial_sync_period: SecsDurationU32,
    /// Time a request may stay unanswered
    pub request_timeout: MillisDurationU32,
}

impl Default for SyncLoopConfig {
    fn default() -> Self {
        Self {
            sync_period: SecsDurationU32::secs(DEFAULT_SYNC_PERIOD_S),
            initial_sync_period: SecsDurationU32::secs(DEFAULT_INITIAL_SYNC_PERIOD_S),
            request_timeout: MillisDurationU32::millis(DEFAULT_REQUEST_TIMEOUT_MS),
        }
    }
}

impl SyncLoopConfig {
    /// Set the steady-state sync interval
    pub fn with_sync_period(mut self, period: SecsDurationU32) -> Self {
        self.sync_period = period;
        self
    }

    /// Set the retry interval used after boot and failures
    pub fn with_initial_sync_period(mut self, period: SecsDurationU32) -> Self {
        self.initial_sync_period = period;
        self
    }

    /// Set how long to wait for a reference response
    pub fn with_request_timeout(mut self, timeout: MillisDurationU32) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Check that the schedule is usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sync_period.to_secs() == 0 {
            return Err(ConfigError::ZeroDuration { field: "sync_period" });
        }
        if self.initial_sync_period.to_secs() == 0 {
            return Err(ConfigError::ZeroDuration { field: "initial_sync_period" });
        }
        if self.request_timeout.to_millis() == 0 {
            return Err(ConfigError::ZeroDuration { field: "request_timeout" });
        }
        if self.initial_sync_period.to_secs() > self.sync_period.to_secs() {
            return Err(ConfigError::InitialExceedsPeriod {
                initial_s: self.initial_sync_period.to_secs(),
                period_s: self.sync_period.to_secs(),
            });
        }
        Ok(())
    }
}

/// Outcome of the most recent sync attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SyncStatus {
    /// No attempt has completed yet
    #[default]
    Unknown,
    /// The reference answered with a valid time
    Ok,
    /// The reference answered without a valid time
    Error,
    /// The reference did not answer in time
    TimedOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RequestState {
    Idle,
    Sent { started: Ticks },
}

/// Periodic driver for a [`SystemClock`]
pub struct SyncLoop<'a, T: TickSource> {
    clock: SystemClock<'a, T>,
    config: SyncLoopConfig,
    current_period_s: u32,
    last_attempt: Ticks,
    request: RequestState,
    sync_requested: bool,
    status: SyncStatus,
    last_error: Option<ClockError>,
    skews: HistoryBuffer<ClockSkew, SKEW_HISTORY_LEN>,
}

impl<'a, T: TickSource> SyncLoop<'a, T> {
    /// Wrap a clock with the given schedule
    pub fn new(clock: SystemClock<'a, T>, config: SyncLoopConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let last_attempt = clock.ticks().now();
        Ok(Self {
            clock,
            config,
            current_period_s: config.initial_sync_period.to_secs(),
            last_attempt,
            request: RequestState::Idle,
            sync_requested: false,
            status: SyncStatus::Unknown,
            last_error: None,
            skews: HistoryBuffer::new(),
        })
    }

    /// Restore the clock from its backup and start the schedule
    ///
    /// Call once at startup, before the first `poll()`.
    pub fn setup(&mut self) {
        self.clock.restore_from_backup();
        self.last_attempt = self.clock.ticks().now();
    }

    /// Run one maintenance step; never blocks
    ///
    /// Must be called more often than every 65.535 s, and frequently
    /// enough to notice reference responses promptly.
    pub fn poll(&mut self) {
        if let Some(reference) = self.clock.reference() {
            let now = self.clock.ticks().now();
            if self.sync_due(now) {
                match self.request {
                    RequestState::Idle => {
                        log_debug!("Requesting reference time");
                        reference.send_request();
                        self.request = RequestState::Sent { started: now };
                    }
                    RequestState::Sent { started } => match reference.poll_response() {
                        Ok(seconds) => self.complete(now, seconds),
                        Err(nb::Error::WouldBlock) => {
                            let waited_ms = now.wrapping_sub(started);
                            if waited_ms >= self.config.request_timeout.to_millis() {
                                log_warn!("Reference request timed out after {} ms", waited_ms);
                                self.fail(now, SyncStatus::TimedOut, ClockError::Timeout { waited_ms });
                            }
                        }
                        Err(nb::Error::Other(err)) => {
                            log_warn!("Reference returned no valid time");
                            self.fail(now, SyncStatus::Error, err);
                        }
                    },
                }
            }
        }

        self.clock.keep_alive();
    }

    /// Start a sync on the next `poll()` regardless of the schedule
    pub fn request_sync(&mut self) -> ClockResult<()> {
        if self.clock.reference().is_none() {
            return Err(ClockError::NoReference);
        }
        self.sync_requested = true;
        Ok(())
    }

    /// Current time, see [`SystemClock::query_now`]
    pub fn query_now(&mut self) -> EpochSeconds {
        self.clock.query_now()
    }

    /// Outcome of the most recent completed attempt
    pub fn sync_status(&self) -> SyncStatus {
        self.status
    }

    /// Error from the most recent failed attempt, cleared on success
    pub fn last_error(&self) -> Option<ClockError> {
        self.last_error
    }

    /// Whether a request is waiting for its response
    pub fn is_request_pending(&self) -> bool {
        matches!(self.request, RequestState::Sent { .. })
    }

    /// Whole seconds since the last attempt completed (or since startup)
    pub fn seconds_since_sync_attempt(&self) -> u32 {
        self.clock.ticks().now().wrapping_sub(self.last_attempt) / 1000
    }

    /// Whole seconds until the next attempt is due
    pub fn seconds_to_sync_attempt(&self) -> u32 {
        self.current_period_s.saturating_sub(self.seconds_since_sync_attempt())
    }

    /// Interval currently applied between attempts
    pub fn current_sync_period(&self) -> SecsDurationU32 {
        SecsDurationU32::secs(self.current_period_s)
    }

    /// Skews of recent successful syncs, oldest first
    ///
    /// Only syncs applied to an already running clock are recorded; the
    /// first sync after boot has no meaningful skew.
    pub fn skew_history(&self) -> impl Iterator<Item = ClockSkew> + '_ {
        self.skews.oldest_ordered().copied()
    }

    /// Most recent recorded skew
    pub fn latest_skew(&self) -> Option<ClockSkew> {
        self.skews.recent().copied()
    }

    /// The driven clock
    pub fn clock(&self) -> &SystemClock<'a, T> {
        &self.clock
    }

    /// The driven clock, mutably, e.g. for `set_now()`
    pub fn clock_mut(&mut self) -> &mut SystemClock<'a, T> {
        &mut self.clock
    }

    /// Stop driving and return the clock
    pub fn into_clock(self) -> SystemClock<'a, T> {
        self.clock
    }

    fn sync_due(&self, now: Ticks) -> bool {
        let elapsed_ms = now.wrapping_sub(self.last_attempt);
        self.sync_requested
            || !self.clock.is_initialized()
            || elapsed_ms >= self.current_period_s.saturating_mul(1000)
    }

    fn complete(&mut self, now: Ticks, seconds: EpochSeconds) {
        let was_running = self.clock.is_initialized();
        self.clock.merge_time(seconds);
        if was_running {
            self.skews.write(self.clock.clock_skew());
        }
        log_debug!("Synced to {} (skew {}s)", seconds, self.clock.clock_skew());

        self.current_period_s = self.config.sync_period.to_secs();
        self.status = SyncStatus::Ok;
        self.last_error = None;
        self.finish(now);
    }

    fn fail(&mut self, now: Ticks, status: SyncStatus, err: ClockError) {
        self.backoff();
        self.status = status;
        self.last_error = Some(err);
        self.finish(now);
    }

    fn finish(&mut self, now: Ticks) {
        self.last_attempt = now;
        self.request = RequestState::Idle;
        self.sync_requested = false;
    }

    fn backoff(&mut self) {
        let period_s = self.config.sync_period.to_secs();
        self.current_period_s = if self.current_period_s >= period_s / 2 {
            period_s
        } else {
            self.current_period_s * 2
        };
        log_debug!("Next sync attempt in {}s", self.current_period_s);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::{ManualClock, ManualTicks, INVALID_SECONDS};
    use fugit::ExtU32;

    #[test]
    fn default_config_is_valid() {
        let config = SyncLoopConfig::default();
        assert_eq!(config.sync_period.to_secs(), 3600);
        assert_eq!(config.initial_sync_period.to_secs(), 5);
        assert_eq!(config.request_timeout.to_millis(), 1000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_bad_config() {
        let config = SyncLoopConfig::default().with_sync_period(0.secs());
        assert_eq!(config.validate(), Err(ConfigError::ZeroDuration { field: "sync_period" }));

        let config = SyncLoopConfig::default()
            .with_sync_period(10.secs())
            .with_initial_sync_period(20.secs());
        assert_eq!(
            config.validate(),
            Err(ConfigError::InitialExceedsPeriod { initial_s: 20, period_s: 10 })
        );
    }

    #[test]
    fn syncs_immediately_when_unset() {
        let ticks = ManualTicks::new(0);
        let ntp = ManualClock::new(5000);
        let clock = SystemClock::new(&ticks, Some(&ntp), None);
        let mut sync = SyncLoop::new(clock, SyncLoopConfig::default()).unwrap();

        sync.poll();
        assert!(sync.is_request_pending());
        sync.poll();

        assert_eq!(sync.sync_status(), SyncStatus::Ok);
        assert_eq!(sync.query_now(), 5000);
        assert_eq!(sync.current_sync_period().to_secs(), 3600);
        assert_eq!(sync.skew_history().count(), 0);
    }

    #[test]
    fn backoff_doubles_then_caps() {
        let ticks = ManualTicks::new(0);
        let ntp = ManualClock::new(INVALID_SECONDS);
        let clock = SystemClock::new(&ticks, Some(&ntp), None);
        let config = SyncLoopConfig::default().with_sync_period(30.secs());
        let mut sync = SyncLoop::new(clock, config).unwrap();

        let mut periods = [0u32; 4];
        for period in periods.iter_mut() {
            sync.poll();
            sync.poll();
            assert_eq!(sync.sync_status(), SyncStatus::Error);
            *period = sync.current_sync_period().to_secs();
        }
        assert_eq!(periods, [10, 20, 30, 30]);
        assert_eq!(sync.last_error(), Some(ClockError::InvalidTime));
    }

    #[test]
    fn no_reference_only_keeps_alive() {
        let ticks = ManualTicks::new(0);
        let clock = SystemClock::new(&ticks, None, None);
        let mut sync = SyncLoop::new(clock, SyncLoopConfig::default()).unwrap();

        sync.clock_mut().set_now(100);
        ticks.advance(60_000);
        sync.poll();
        ticks.advance(60_000);
        sync.poll();

        assert_eq!(sync.query_now(), 220);
        assert_eq!(sync.sync_status(), SyncStatus::Unknown);
        assert_eq!(sync.request_sync(), Err(ClockError::NoReference));
    }

    #[test]
    fn request_sync_skips_schedule() {
        let ticks = ManualTicks::new(0);
        let ntp = ManualClock::new(100);
        let clock = SystemClock::new(&ticks, Some(&ntp), None);
        let mut sync = SyncLoop::new(clock, SyncLoopConfig::default()).unwrap();

        sync.poll();
        sync.poll();
        assert_eq!(sync.seconds_to_sync_attempt(), 3600);

        ntp.adjust(103);
        ticks.advance(1000);
        sync.request_sync().unwrap();
        sync.poll();
        sync.poll();

        assert_eq!(sync.query_now(), 103);
        assert_eq!(sync.latest_skew(), Some(-2));
    }
}
