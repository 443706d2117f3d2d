//! Polling-loop clock with a slow reference and a battery-backed RTC
//!
//! Simulates a device main loop on the host: the system clock counts
//! from `StdTicks`, restores from an RTC at boot, and syncs to a
//! reference that takes 300 ms to answer each request.

use std::cell::Cell;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use epochsync_core::{
    Clock, EpochSeconds, RawRtc, RtcClock, StdTicks, SyncLoop, SyncLoopConfig, SystemClock,
    INVALID_SECONDS,
};
use fugit::ExtU32;

/// RTC chip kept in RAM, pre-loaded with a stale time
struct RamRtc(Cell<i64>);

impl RawRtc for RamRtc {
    fn read_unix(&self) -> i64 {
        self.0.get()
    }

    fn write_unix(&self, unix_seconds: i64) {
        println!("  rtc <- {unix_seconds}");
        self.0.set(unix_seconds);
    }
}

/// Host wall clock answering after a fixed latency
struct SlowHostClock {
    latency: Duration,
    requested_at: Cell<Option<Instant>>,
}

impl SlowHostClock {
    fn host_seconds() -> EpochSeconds {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .ok()
            .and_then(|d| EpochSeconds::try_from(d.as_secs()).ok())
            .unwrap_or(INVALID_SECONDS)
    }
}

impl Clock for SlowHostClock {
    fn get_now(&self) -> EpochSeconds {
        std::thread::sleep(self.latency);
        Self::host_seconds()
    }

    fn set_now(&self, _epoch_seconds: EpochSeconds) {}

    fn send_request(&self) {
        self.requested_at.set(Some(Instant::now()));
    }

    fn is_response_ready(&self) -> bool {
        self.requested_at
            .get()
            .is_some_and(|at| at.elapsed() >= self.latency)
    }

    fn read_response(&self) -> EpochSeconds {
        self.requested_at.set(None);
        Self::host_seconds()
    }
}

fn main() {
    let ticks = StdTicks::new();
    let stale = SlowHostClock::host_seconds().saturating_sub(42);
    let rtc = RtcClock::new(RamRtc(Cell::new(i64::from(stale))));
    let reference = SlowHostClock {
        latency: Duration::from_millis(300),
        requested_at: Cell::new(None),
    };

    let clock = SystemClock::new(ticks, Some(&reference), Some(&rtc));
    let config = SyncLoopConfig::default()
        .with_initial_sync_period(2.secs())
        .with_request_timeout(1_000.millis());
    let mut sync = match SyncLoop::new(clock, config) {
        Ok(sync) => sync,
        Err(err) => {
            eprintln!("bad config: {err}");
            return;
        }
    };

    sync.setup();
    println!("restored from rtc: {}", sync.query_now());

    let mut last = INVALID_SECONDS;
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        sync.poll();

        let now = sync.query_now();
        if now != last {
            println!(
                "now={now} status={:?} skew={}s next sync in {}s",
                sync.sync_status(),
                sync.clock().clock_skew(),
                sync.seconds_to_sync_attempt(),
            );
            last = now;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
}
