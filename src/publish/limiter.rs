//! Shared publish rate gate

use std::time::Duration;
use tokio::time::Instant;

/// One gate shared by every publish path
///
/// An attempt passes only if `min_interval` has elapsed since the last
/// attempt that passed. Refused attempts do not move the window.
#[derive(Debug, Clone)]
pub struct PublishLimiter {
    min_interval: Duration,
    last_allowed: Option<Instant>,
}

impl PublishLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_allowed: None,
        }
    }

    /// Check the gate against the current time
    pub fn try_acquire(&mut self) -> bool {
        self.try_acquire_at(Instant::now())
    }

    /// Check the gate against an explicit time
    pub fn try_acquire_at(&mut self, now: Instant) -> bool {
        if let Some(last) = self.last_allowed {
            if now.saturating_duration_since(last) < self.min_interval {
                return false;
            }
        }
        self.last_allowed = Some(now);
        true
    }

    #[cfg(test)]
    pub fn last_allowed(&self) -> Option<Instant> {
        self.last_allowed
    }
}
