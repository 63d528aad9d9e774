//! Retry delay schedule for remote operations.

use std::time::Duration;

pub(crate) struct Backoff {
    schedule: Vec<Duration>,
    index: usize,
}

impl Backoff {
    pub(crate) fn new(schedule: Vec<Duration>) -> Self {
        Self { schedule, index: 0 }
    }

    /// Delay to wait after a failed attempt. Advances through the schedule and
    /// sticks at the last entry once exhausted.
    pub(crate) fn on_failure(&mut self) -> Duration {
        let delay = self
            .schedule
            .get(self.index)
            .cloned()
            .unwrap_or_else(|| Duration::from_secs(1));
        if self.index + 1 < self.schedule.len() {
            self.index += 1;
        }
        delay
    }
}

/// Default per-request retry delays: exponential-ish, bounded.
pub(crate) fn default_schedule() -> Vec<Duration> {
    vec![
        Duration::from_millis(200),
        Duration::from_millis(500),
        Duration::from_secs(1),
    ]
}
