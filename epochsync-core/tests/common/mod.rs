//! Shared test devices for integration tests
//!
//! - `RecordingClock`: remembers every write it receives
//! - `SlowClock`: answers non-blocking requests after a number of polls
//!
//! Both use interior mutability so a single instance can be installed as
//! reference and backup at the same time.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};

use epochsync_core::{Clock, EpochSeconds, INVALID_SECONDS};

/// Clock that logs every `set_now()` call
#[derive(Debug)]
pub struct RecordingClock {
    now: Cell<EpochSeconds>,
    writes: RefCell<Vec<EpochSeconds>>,
    reads: Cell<u32>,
}

impl RecordingClock {
    pub fn new(now: EpochSeconds) -> Self {
        Self {
            now: Cell::new(now),
            writes: RefCell::new(Vec::new()),
            reads: Cell::new(0),
        }
    }

    pub fn unset() -> Self {
        Self::new(INVALID_SECONDS)
    }

    pub fn writes(&self) -> Vec<EpochSeconds> {
        self.writes.borrow().clone()
    }

    pub fn reads(&self) -> u32 {
        self.reads.get()
    }

    /// Change the time without recording a write
    pub fn drift_to(&self, now: EpochSeconds) {
        self.now.set(now);
    }
}

impl Clock for RecordingClock {
    fn get_now(&self) -> EpochSeconds {
        self.reads.set(self.reads.get() + 1);
        self.now.get()
    }

    fn set_now(&self, epoch_seconds: EpochSeconds) {
        self.now.set(epoch_seconds);
        self.writes.borrow_mut().push(epoch_seconds);
    }
}

/// Reference that needs several polls before its response is ready
#[derive(Debug)]
pub struct SlowClock {
    now: Cell<EpochSeconds>,
    polls_needed: u32,
    polls_left: Cell<Option<u32>>,
    requests: Cell<u32>,
    blocking_reads: Cell<u32>,
}

impl SlowClock {
    pub fn new(now: EpochSeconds, polls_needed: u32) -> Self {
        Self {
            now: Cell::new(now),
            polls_needed,
            polls_left: Cell::new(None),
            requests: Cell::new(0),
            blocking_reads: Cell::new(0),
        }
    }

    /// A reference that never answers
    pub fn silent(now: EpochSeconds) -> Self {
        Self::new(now, u32::MAX)
    }

    pub fn requests(&self) -> u32 {
        self.requests.get()
    }

    pub fn blocking_reads(&self) -> u32 {
        self.blocking_reads.get()
    }

    pub fn drift_to(&self, now: EpochSeconds) {
        self.now.set(now);
    }
}

impl Clock for SlowClock {
    fn get_now(&self) -> EpochSeconds {
        self.blocking_reads.set(self.blocking_reads.get() + 1);
        self.now.get()
    }

    fn set_now(&self, epoch_seconds: EpochSeconds) {
        self.now.set(epoch_seconds);
    }

    fn send_request(&self) {
        self.requests.set(self.requests.get() + 1);
        self.polls_left.set(Some(self.polls_needed));
    }

    fn is_response_ready(&self) -> bool {
        match self.polls_left.get() {
            Some(0) => true,
            Some(n) => {
                self.polls_left.set(Some(n - 1));
                false
            }
            None => false,
        }
    }

    fn read_response(&self) -> EpochSeconds {
        self.polls_left.set(None);
        self.now.get()
    }
}
