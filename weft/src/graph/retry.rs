//! Retry policy for step execution.
//!
//! Only transient step failures (reasoner faults and timeouts, see
//! [`AgentError::is_transient`](crate::error::AgentError::is_transient)) are
//! retried; the last failure is what lands in `state.error`.

use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq)]
pub enum RetryPolicy {
    /// Fail on the first error.
    #[default]
    None,
    /// Retry up to `max_attempts` times with a constant delay.
    Fixed {
        max_attempts: usize,
        interval: Duration,
    },
    /// Retry up to `max_attempts` times, delay multiplied each attempt and capped.
    Exponential {
        max_attempts: usize,
        initial_interval: Duration,
        max_interval: Duration,
        multiplier: f64,
    },
}

impl RetryPolicy {
    pub fn fixed(max_attempts: usize, interval: Duration) -> Self {
        RetryPolicy::Fixed {
            max_attempts,
            interval,
        }
    }

    pub fn exponential(
        max_attempts: usize,
        initial_interval: Duration,
        max_interval: Duration,
        multiplier: f64,
    ) -> Self {
        RetryPolicy::Exponential {
            max_attempts,
            initial_interval,
            max_interval,
            multiplier,
        }
    }

    /// True when retry number `attempt` (0-based) is still allowed.
    pub fn should_retry(&self, attempt: usize) -> bool {
        attempt < self.max_attempts()
    }

    /// Delay before retry number `attempt`.
    pub fn delay(&self, attempt: usize) -> Duration {
        match self {
            RetryPolicy::None => Duration::ZERO,
            RetryPolicy::Fixed { interval, .. } => *interval,
            RetryPolicy::Exponential {
                initial_interval,
                max_interval,
                multiplier,
                ..
            } => {
                let secs = initial_interval.as_secs_f64() * multiplier.powi(attempt as i32);
                if !secs.is_finite() {
                    return *max_interval;
                }
                Duration::from_secs_f64(secs.max(0.0)).min(*max_interval)
            }
        }
    }

    pub fn max_attempts(&self) -> usize {
        match self {
            RetryPolicy::None => 0,
            RetryPolicy::Fixed { max_attempts, .. } => *max_attempts,
            RetryPolicy::Exponential { max_attempts, .. } => *max_attempts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_never_retries() {
        let policy = RetryPolicy::default();
        assert!(!policy.should_retry(0));
        assert_eq!(policy.delay(0), Duration::ZERO);
    }

    #[test]
    fn fixed_retries_up_to_max_with_constant_delay() {
        let policy = RetryPolicy::fixed(2, Duration::from_millis(10));
        assert!(policy.should_retry(1));
        assert!(!policy.should_retry(2));
        assert_eq!(policy.delay(1), Duration::from_millis(10));
    }

    #[test]
    fn exponential_grows_and_is_capped() {
        let policy =
            RetryPolicy::exponential(5, Duration::from_secs(1), Duration::from_secs(5), 2.0);
        assert_eq!(policy.delay(0), Duration::from_secs(1));
        assert_eq!(policy.delay(2), Duration::from_secs(4));
        assert_eq!(policy.delay(3), Duration::from_secs(5));
    }
}
