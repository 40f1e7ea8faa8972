//! # Job Retry Policy
//!
//! Fibonacci backoff for deferred jobs: the n-th retry waits
//! `unit * fib(n + 1)` (1, 1, 2, 3, 5, 8, ... units), capped at `max_delay`.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Retry policy for a scheduled job.
///
/// # Examples
///
/// ```rust
/// use courier_core::jobs::RetryPolicy;
/// use std::time::Duration;
///
/// let policy = RetryPolicy::fibonacci(10, Duration::from_secs(1)).without_jitter();
///
/// assert_eq!(policy.calculate_delay(0), Duration::from_secs(1));
/// assert_eq!(policy.calculate_delay(4), Duration::from_secs(5));
/// assert!(policy.should_retry(9));
/// assert!(!policy.should_retry(10));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum number of retries after the first failed run
    pub max_retries: u32,

    /// Delay multiplied by the Fibonacci number of the attempt
    pub unit: Duration,

    /// Maximum delay between retries
    pub max_delay: Duration,

    /// Whether to add jitter to delays
    pub use_jitter: bool,

    /// Jitter range as a fraction of the delay (0.1 = ±10%)
    pub jitter_percent: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::fibonacci(10, Duration::from_secs(1))
    }
}

impl RetryPolicy {
    /// Fibonacci backoff with the given retry limit and unit.
    pub fn fibonacci(max_retries: u32, unit: Duration) -> Self {
        Self {
            max_retries,
            unit,
            max_delay: Duration::from_secs(60 * 60),
            use_jitter: true,
            jitter_percent: 0.1,
        }
    }

    /// A policy that never retries.
    pub fn none() -> Self {
        Self::fibonacci(0, Duration::ZERO)
    }

    pub fn without_jitter(mut self) -> Self {
        self.use_jitter = false;
        self
    }

    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// Delay before retry number `attempt` (0-based).
    pub fn calculate_delay(&self, attempt: u32) -> Duration {
        let base_secs = self.unit.as_secs_f64() * fibonacci(attempt + 1) as f64;
        let capped_secs = base_secs.min(self.max_delay.as_secs_f64());

        let final_secs = if self.use_jitter && capped_secs > 0.0 {
            let jitter_range = capped_secs * self.jitter_percent.clamp(0.0, 1.0);
            let jitter = rand::thread_rng().gen_range(-jitter_range..=jitter_range);
            (capped_secs + jitter).max(0.0)
        } else {
            capped_secs
        };

        Duration::from_secs_f64(final_secs)
    }

    /// Whether retry number `attempt` (0-based) is allowed.
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_retries
    }
}

/// n-th Fibonacci number with fib(1) = fib(2) = 1, saturating.
fn fibonacci(n: u32) -> u64 {
    let (mut a, mut b) = (0u64, 1u64);
    for _ in 0..n {
        let next = a.saturating_add(b);
        a = b;
        b = next;
    }
    a
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod tests;
