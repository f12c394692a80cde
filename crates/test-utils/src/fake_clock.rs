use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use devbat::exec::Clock;

/// Virtual clock: `sleep` advances time instantly and is recorded.
#[derive(Debug, Clone)]
pub struct FakeClock {
    base: Instant,
    inner: Arc<Mutex<ClockState>>,
}

#[derive(Debug, Default)]
struct ClockState {
    elapsed: Duration,
    sleeps: Vec<Duration>,
}

impl FakeClock {
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            inner: Arc::new(Mutex::new(ClockState::default())),
        }
    }

    /// Virtual time passed since construction.
    pub fn elapsed(&self) -> Duration {
        self.inner.lock().unwrap().elapsed
    }

    /// Every sleep requested so far, in order.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.inner.lock().unwrap().sleeps.clone()
    }

    /// Move time forward without recording a sleep.
    pub fn advance(&self, by: Duration) {
        self.inner.lock().unwrap().elapsed += by;
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Instant {
        self.base + self.inner.lock().unwrap().elapsed
    }

    fn sleep(&self, duration: Duration) {
        let mut state = self.inner.lock().unwrap();
        state.elapsed += duration;
        state.sleeps.push(duration);
    }
}
