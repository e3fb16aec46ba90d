// SPDX-License-Identifier: MPL-2.0
//! Loading newtypes.
//!
//! This module provides type-safe wrappers for retry parameters,
//! ensuring they are always within valid ranges.

use crate::config::{
    DEFAULT_BASE_DELAY_MS, DEFAULT_MAX_ATTEMPTS, MAX_BASE_DELAY_MS, MAX_MAX_ATTEMPTS,
    MIN_MAX_ATTEMPTS,
};
use std::time::Duration;

// =============================================================================
// MaxAttempts
// =============================================================================

/// Maximum number of attempts per source.
///
/// This newtype enforces validity at the type level, ensuring the value
/// is always within the valid range (1–10).
///
/// # Example
///
/// ```
/// use gallery_loader::domain::loading::MaxAttempts;
///
/// let attempts = MaxAttempts::new(2);
/// assert_eq!(attempts.value(), 2);
///
/// // Values outside range are clamped
/// assert_eq!(MaxAttempts::new(0).value(), 1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaxAttempts(u32);

impl MaxAttempts {
    /// Creates a new max attempts value, clamping to valid range.
    #[must_use]
    pub fn new(value: u32) -> Self {
        Self(value.clamp(MIN_MAX_ATTEMPTS, MAX_MAX_ATTEMPTS))
    }

    /// Returns the value as u32.
    #[must_use]
    pub fn value(self) -> u32 {
        self.0
    }

    /// Returns true if this is the minimum value.
    #[must_use]
    pub fn is_min(self) -> bool {
        self.0 <= MIN_MAX_ATTEMPTS
    }

    /// Returns true if this is the maximum value.
    #[must_use]
    pub fn is_max(self) -> bool {
        self.0 >= MAX_MAX_ATTEMPTS
    }
}

impl Default for MaxAttempts {
    fn default() -> Self {
        Self(DEFAULT_MAX_ATTEMPTS)
    }
}

// =============================================================================
// RetryPolicy
// =============================================================================

/// Linear backoff policy: attempt `n` failing waits `base_delay * n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: MaxAttempts,
    base_delay: Duration,
}

impl RetryPolicy {
    /// Creates a policy. The base delay is capped at one minute.
    #[must_use]
    pub fn new(max_attempts: MaxAttempts, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay: base_delay.min(Duration::from_millis(MAX_BASE_DELAY_MS)),
        }
    }

    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts.value()
    }

    #[must_use]
    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    /// Delay to wait after attempt `attempt` failed.
    #[must_use]
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt.max(1))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MaxAttempts::default(),
            base_delay: Duration::from_millis(DEFAULT_BASE_DELAY_MS),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_clamps_to_valid_range() {
        assert_eq!(MaxAttempts::new(0).value(), MIN_MAX_ATTEMPTS);
        assert_eq!(MaxAttempts::new(100).value(), MAX_MAX_ATTEMPTS);
    }

    #[test]
    fn new_accepts_valid_values() {
        assert_eq!(MaxAttempts::new(1).value(), 1);
        assert_eq!(MaxAttempts::new(5).value(), 5);
        assert_eq!(MaxAttempts::new(10).value(), 10);
    }

    #[test]
    fn default_returns_expected_value() {
        assert_eq!(MaxAttempts::default().value(), DEFAULT_MAX_ATTEMPTS);
    }

    #[test]
    fn is_min_and_is_max() {
        assert!(MaxAttempts::new(1).is_min());
        assert!(!MaxAttempts::new(5).is_min());
        assert!(MaxAttempts::new(10).is_max());
        assert!(!MaxAttempts::new(5).is_max());
    }

    #[test]
    fn backoff_is_linear_in_attempt_number() {
        let policy = RetryPolicy::new(MaxAttempts::new(4), Duration::from_millis(100));
        assert_eq!(policy.delay_after(1), Duration::from_millis(100));
        assert_eq!(policy.delay_after(2), Duration::from_millis(200));
        assert_eq!(policy.delay_after(3), Duration::from_millis(300));
    }

    #[test]
    fn base_delay_is_capped() {
        let policy = RetryPolicy::new(MaxAttempts::default(), Duration::from_secs(3600));
        assert_eq!(policy.base_delay(), Duration::from_millis(MAX_BASE_DELAY_MS));
    }
}
