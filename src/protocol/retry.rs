// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::time::Duration;

/// Bounded retry with linearly increasing delays.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use virtual_accessories::protocol::RetryPolicy;
///
/// let policy = RetryPolicy::new()
///     .with_max_attempts(3)
///     .with_delay_step(Duration::from_millis(500));
///
/// assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(500));
/// assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(1000));
/// assert!(!policy.should_retry(3));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, the first one included.
    pub max_attempts: u32,
    /// Delay added for every failed attempt.
    pub delay_step: Duration,
    /// Upper bound for a single delay.
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// Creates a policy with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes a single attempt.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Sets the total number of attempts.
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Sets the delay step.
    #[must_use]
    pub fn with_delay_step(mut self, step: Duration) -> Self {
        self.delay_step = step;
        self
    }

    /// Sets the delay cap.
    #[must_use]
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Delay before the attempt following failed attempt number `attempt`
    /// (1-based).
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.delay_step
            .saturating_mul(attempt.max(1))
            .min(self.max_delay)
    }

    /// Returns true if another attempt may follow failed attempt `attempt`.
    #[must_use]
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            delay_step: Duration::from_secs(2),
            max_delay: Duration::from_secs(30),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_five_linear_attempts() {
        let policy = RetryPolicy::default();
        let delays: Vec<_> = (1..5).map(|a| policy.delay_for_attempt(a).as_secs()).collect();
        assert_eq!(delays, vec![2, 4, 6, 8]);
        assert!(policy.should_retry(4));
        assert!(!policy.should_retry(5));
    }

    #[test]
    fn delays_are_capped() {
        let policy = RetryPolicy::new()
            .with_max_attempts(100)
            .with_max_delay(Duration::from_secs(5));
        assert_eq!(policy.delay_for_attempt(50), Duration::from_secs(5));
    }

    #[test]
    fn disabled_never_retries() {
        assert!(!RetryPolicy::disabled().should_retry(1));
        assert_eq!(RetryPolicy::new().with_max_attempts(0).max_attempts, 1);
    }
}
