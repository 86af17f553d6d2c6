// SPDX-FileCopyrightText: 2026 Convey Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Exponential backoff for failed deliveries.

use std::time::Duration;

/// Bounded exponential backoff.
///
/// `max_retries` counts retries after the first attempt, so a task is tried
/// at most `max_retries + 1` times. Retry N waits `base_delay * 2^(N-1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// Delay before the next retry of a task that has already been retried
    /// `retry_count` times, or `None` once the budget is spent.
    pub fn next_delay(&self, retry_count: u32) -> Option<Duration> {
        if retry_count >= self.max_retries {
            return None;
        }
        let factor = 2u32.saturating_pow(retry_count);
        Some(self.base_delay.saturating_mul(factor))
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(1000))
    }
}
