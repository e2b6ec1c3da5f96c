//! Retry configuration and backoff strategies.

use opal_core::TransportError;
use std::time::Duration;

/// Retry configuration.
///
/// Only requests with a replayable body (absent or buffered) are retried.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retries after the first attempt.
    pub max_retries: u32,
    /// Backoff strategy.
    pub backoff: BackoffStrategy,
    /// Status codes that trigger a retry.
    pub retry_on_status: Vec<u16>,
    /// Whether to retry when the connection cannot be established.
    pub retry_on_connection_error: bool,
    /// Whether to retry on timeouts.
    pub retry_on_timeout: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff: BackoffStrategy::Exponential {
                initial: Duration::from_millis(100),
                max: Duration::from_secs(10),
                multiplier: 2.0,
            },
            retry_on_status: vec![502, 503, 504],
            retry_on_connection_error: true,
            retry_on_timeout: false,
        }
    }
}

impl RetryConfig {
    /// Exponential backoff starting at `initial_delay`.
    pub fn exponential(max_retries: u32, initial_delay: Duration) -> Self {
        Self {
            max_retries,
            backoff: BackoffStrategy::Exponential {
                initial: initial_delay,
                max: Duration::from_secs(30),
                multiplier: 2.0,
            },
            ..Default::default()
        }
    }

    /// Linear backoff.
    pub fn linear(max_retries: u32, delay: Duration) -> Self {
        Self {
            max_retries,
            backoff: BackoffStrategy::Linear {
                delay,
                max: Duration::from_secs(30),
            },
            ..Default::default()
        }
    }

    /// Constant delay between attempts.
    pub fn constant(max_retries: u32, delay: Duration) -> Self {
        Self {
            max_retries,
            backoff: BackoffStrategy::Constant(delay),
            ..Default::default()
        }
    }

    /// Retry without waiting.
    pub fn immediate(max_retries: u32) -> Self {
        Self {
            max_retries,
            backoff: BackoffStrategy::None,
            ..Default::default()
        }
    }

    /// Replace the retryable status codes.
    pub fn with_status_codes(mut self, codes: Vec<u16>) -> Self {
        self.retry_on_status = codes;
        self
    }

    /// Retry on timeouts too.
    pub fn retry_on_timeout(mut self, enable: bool) -> Self {
        self.retry_on_timeout = enable;
        self
    }

    /// Disable retry on connection errors.
    pub fn no_retry_on_connection(mut self) -> Self {
        self.retry_on_connection_error = false;
        self
    }

    /// Delay before retry number `attempt` (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.backoff.delay_for_attempt(attempt)
    }

    /// Whether a response with `status` should be retried.
    pub fn should_retry_status(&self, status: u16) -> bool {
        self.retry_on_status.contains(&status)
    }

    /// Whether a failed attempt should be retried.
    pub fn should_retry_error(&self, error: &TransportError) -> bool {
        match error {
            TransportError::Timeout(_) => self.retry_on_timeout,
            TransportError::Connect(_) => self.retry_on_connection_error,
            _ => false,
        }
    }
}

/// Backoff strategy for retries.
#[derive(Debug, Clone)]
pub enum BackoffStrategy {
    /// No delay between retries.
    None,
    /// Constant delay between retries.
    Constant(Duration),
    /// Delay grows by a fixed amount per attempt.
    Linear {
        /// Delay increment per attempt.
        delay: Duration,
        /// Maximum delay.
        max: Duration,
    },
    /// Delay is multiplied each attempt.
    Exponential {
        /// Initial delay.
        initial: Duration,
        /// Maximum delay.
        max: Duration,
        /// Multiplier, typically 2.0.
        multiplier: f64,
    },
}

impl BackoffStrategy {
    /// Delay for a given attempt (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        match self {
            Self::None => Duration::ZERO,
            Self::Constant(d) => *d,
            Self::Linear { delay, max } => delay.saturating_mul(attempt + 1).min(*max),
            Self::Exponential {
                initial,
                max,
                multiplier,
            } => {
                let factor = multiplier.powi(attempt as i32);
                let millis = (initial.as_millis() as f64 * factor) as u64;
                Duration::from_millis(millis).min(*max)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opal_core::ContextError;

    #[test]
    fn test_exponential_backoff() {
        let strategy = BackoffStrategy::Exponential {
            initial: Duration::from_millis(100),
            max: Duration::from_secs(10),
            multiplier: 2.0,
        };

        assert_eq!(strategy.delay_for_attempt(0), Duration::from_millis(100));
        assert_eq!(strategy.delay_for_attempt(1), Duration::from_millis(200));
        assert_eq!(strategy.delay_for_attempt(3), Duration::from_millis(800));
        assert_eq!(strategy.delay_for_attempt(20), Duration::from_secs(10));
    }

    #[test]
    fn test_linear_backoff() {
        let strategy = BackoffStrategy::Linear {
            delay: Duration::from_millis(100),
            max: Duration::from_secs(1),
        };

        assert_eq!(strategy.delay_for_attempt(0), Duration::from_millis(100));
        assert_eq!(strategy.delay_for_attempt(1), Duration::from_millis(200));
        assert_eq!(strategy.delay_for_attempt(9), Duration::from_secs(1));
    }

    #[test]
    fn test_constant_and_none() {
        assert_eq!(
            BackoffStrategy::Constant(Duration::from_millis(500)).delay_for_attempt(5),
            Duration::from_millis(500)
        );
        assert_eq!(BackoffStrategy::None.delay_for_attempt(3), Duration::ZERO);
    }

    #[test]
    fn test_default_retries_gateway_statuses() {
        let config = RetryConfig::default();
        assert_eq!(config.max_retries, 3);
        assert!(config.should_retry_status(503));
        assert!(!config.should_retry_status(500));
        assert!(!config.should_retry_status(429));
    }

    #[test]
    fn test_should_retry_error() {
        let config = RetryConfig::immediate(2);
        assert!(config.should_retry_error(&TransportError::Connect("refused".into())));
        assert!(!config.should_retry_error(&TransportError::Timeout("slow".into())));
        assert!(config
            .clone()
            .retry_on_timeout(true)
            .should_retry_error(&TransportError::Timeout("slow".into())));
        assert!(!config.should_retry_error(&TransportError::Context(ContextError::Cancelled)));
        assert!(!config
            .no_retry_on_connection()
            .should_retry_error(&TransportError::Connect("refused".into())));
    }
}
