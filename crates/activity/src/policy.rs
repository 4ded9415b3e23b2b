//! Timeouts and retry schedules.

use std::time::Duration;

/// Exponential backoff between attempts.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Delay before the first retry.
    pub initial_interval: Duration,
    /// Multiplier applied to the delay after each retry.
    pub backoff_coefficient: f64,
    /// Upper bound for any single delay.
    pub maximum_interval: Duration,
    /// Total attempts including the first; `0` means unlimited.
    pub maximum_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_secs(1),
            backoff_coefficient: 2.0,
            maximum_interval: Duration::from_secs(10),
            maximum_attempts: 3,
        }
    }
}

impl RetryPolicy {
    /// Delay after the `failed`-th failed attempt (1-based):
    /// `min(initial * coefficient^(failed - 1), maximum)`.
    pub fn delay_for(&self, failed: u32) -> Duration {
        let exponent = i32::try_from(failed.saturating_sub(1)).unwrap_or(i32::MAX);
        let secs = self.initial_interval.as_secs_f64() * self.backoff_coefficient.powi(exponent);
        if !secs.is_finite() || secs >= self.maximum_interval.as_secs_f64() {
            return self.maximum_interval;
        }
        Duration::from_secs_f64(secs.max(0.0))
    }

    /// Whether another attempt is allowed after `attempts` have run.
    pub fn allows_another(&self, attempts: u32) -> bool {
        self.maximum_attempts == 0 || attempts < self.maximum_attempts
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.backoff_coefficient.is_nan() || self.backoff_coefficient < 1.0 {
            return Err(format!(
                "backoff_coefficient must be at least 1.0, got {}",
                self.backoff_coefficient
            ));
        }
        if self.maximum_interval < self.initial_interval {
            return Err("maximum_interval must not be shorter than initial_interval".into());
        }
        Ok(())
    }
}

/// How one activity is run.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityOptions {
    /// Bound on a single attempt.
    pub start_to_close_timeout: Duration,
    pub retry_policy: RetryPolicy,
}

impl Default for ActivityOptions {
    fn default() -> Self {
        Self {
            start_to_close_timeout: Duration::from_secs(30),
            retry_policy: RetryPolicy::default(),
        }
    }
}

impl ActivityOptions {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.start_to_close_timeout = timeout;
        self
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }
}
