//! Linear backoff schedule for bounded in-loop retries.

use std::time::Duration;

/// Backoff where the nth retry waits `base * n`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackoffSchedule {
    /// Delay before the first retry.
    pub base: Duration,
}

impl BackoffSchedule {
    pub fn linear(base: Duration) -> Self {
        Self { base }
    }

    /// Delay before retry number `attempt` (1-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        self.base * attempt
    }
}

impl Default for BackoffSchedule {
    fn default() -> Self {
        Self::linear(Duration::from_secs(1))
    }
}
