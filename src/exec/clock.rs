// src/exec/clock.rs

use std::fmt::Debug;
use std::thread;
use std::time::{Duration, Instant};

/// Source of time for every poll loop in the harness.
pub trait Clock: Send + Sync + Debug {
    fn now(&self) -> Instant;

    /// Block the calling thread.
    fn sleep(&self, duration: Duration);

    fn elapsed_since(&self, start: Instant) -> Duration {
        self.now().saturating_duration_since(start)
    }
}

/// Wall clock backed by `std::time` and `std::thread::sleep`.
#[derive(Debug, Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        thread::sleep(duration);
    }
}
