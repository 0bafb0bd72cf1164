//! Update rate limiting

use std::time::Duration;

/// Skips updates that arrive sooner than `interval` after the last applied one
#[derive(Debug, Clone)]
pub struct RateLimiter {
    interval: Duration,
    last_applied: Option<Duration>,
}

impl RateLimiter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_applied: None,
        }
    }

    /// Whether an update at `now` should run. `force` bypasses the interval.
    pub fn ready(&self, now: Duration, force: bool) -> bool {
        if force {
            return true;
        }
        match self.last_applied {
            None => true,
            Some(last) => now.saturating_sub(last) >= self.interval,
        }
    }

    /// Record that an update was applied at `now`
    pub fn mark(&mut self, now: Duration) {
        self.last_applied = Some(now);
    }

    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }
}
