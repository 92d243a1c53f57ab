//! Nullable delay: deterministic suspension for testing.

use std::sync::Mutex;
use std::time::Duration;

use strata_utils::{Delay, DelayFuture};

/// A [`Delay`] that never sleeps.
///
/// Each call records the requested duration and yields once to the runtime,
/// so polling loops make progress without wall-clock waits.
#[derive(Default)]
pub struct NullDelay {
    requested: Mutex<Vec<Duration>>,
}

impl NullDelay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of delays requested so far.
    pub fn calls(&self) -> usize {
        self.requested.lock().map(|r| r.len()).unwrap_or_default()
    }

    /// Every duration requested so far, in order.
    pub fn requested(&self) -> Vec<Duration> {
        self.requested.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

impl Delay for NullDelay {
    fn delay(&self, duration: Duration) -> DelayFuture<'_> {
        if let Ok(mut requested) = self.requested.lock() {
            requested.push(duration);
        }
        Box::pin(tokio::task::yield_now())
    }
}
