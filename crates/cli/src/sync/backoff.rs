// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Reconnect delay policy.
//!
//! `delay(attempt) = base * 2^attempt`, capped at `max_delay`. Pure and
//! deterministic; overflow saturates to the cap.

use std::time::Duration;

/// Exponential backoff without jitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    base: Duration,
    max_delay: Duration,
}

impl BackoffPolicy {
    pub const DEFAULT_BASE: Duration = Duration::from_millis(1000);
    pub const DEFAULT_MAX_DELAY: Duration = Duration::from_millis(30_000);

    pub const fn new(base: Duration, max_delay: Duration) -> Self {
        BackoffPolicy { base, max_delay }
    }

    pub fn base(&self) -> Duration {
        self.base
    }

    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }

    /// Delay before reconnection attempt number `attempt` (zero-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        1u32.checked_shl(attempt)
            .and_then(|factor| self.base.checked_mul(factor))
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        BackoffPolicy::new(Self::DEFAULT_BASE, Self::DEFAULT_MAX_DELAY)
    }
}

#[cfg(test)]
#[path = "backoff_tests.rs"]
mod tests;
