//! Bounded retry with exponential backoff for transient provider failures.
//!
//! The disposable-mail APIs fail in bursts: an HTML error page instead of
//! JSON, a dropped connection, a gateway timeout. Those failures are worth
//! retrying, but only a bounded number of times and with growing delays.
//! Non-retryable errors (see [`Error::is_retryable`](crate::Error::is_retryable))
//! are surfaced immediately.

use crate::error::{Error, Result};
use crate::provider::{Mailbox, MailProvider, Message};
use std::time::Duration;
use tracing::warn;

/// Retry policy for transient provider failures.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first one.
    pub max_attempts: u32,
    /// Delay before the second attempt. Doubles on each further attempt.
    pub initial_backoff: Duration,
    /// Upper bound on the backoff delay.
    pub max_backoff: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(10),
        }
    }
}

impl RetryConfig {
    /// Returns the backoff delay to sleep after a failed attempt.
    ///
    /// `attempt` is 1-based: the delay after the first failure is
    /// `initial_backoff`, doubling per attempt up to `max_backoff`.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(31);
        let delay = self.initial_backoff.saturating_mul(1_u32 << exp);
        delay.min(self.max_backoff)
    }
}

/// Fetches a provider's domain list, retrying transient failures.
///
/// # Errors
///
/// Returns [`Error::RetriesExhausted`] once the attempt budget runs out, or
/// the original error immediately if it is not retryable.
pub async fn domains_with_retry(
    provider: &mut dyn MailProvider,
    config: &RetryConfig,
) -> Result<Vec<String>> {
    let mut attempt = 1;
    loop {
        match provider.list_domains().await {
            Ok(domains) => return Ok(domains),
            Err(err) => {
                check_budget(err, "listing domains", attempt, config, provider.name()).await?;
            }
        }
        attempt += 1;
    }
}

/// Polls a mailbox for messages, retrying transient failures.
///
/// # Errors
///
/// Returns [`Error::RetriesExhausted`] once the attempt budget runs out, or
/// the original error immediately if it is not retryable.
pub async fn poll_with_retry(
    provider: &mut dyn MailProvider,
    mailbox: &Mailbox,
    config: &RetryConfig,
) -> Result<Vec<Message>> {
    let mut attempt = 1;
    loop {
        match provider.poll_messages(mailbox).await {
            Ok(messages) => return Ok(messages),
            Err(err) => {
                check_budget(err, "polling messages", attempt, config, provider.name()).await?;
            }
        }
        attempt += 1;
    }
}

/// Decides whether a failed attempt gets another try.
///
/// Returns `Ok(())` after sleeping the backoff delay if a retry is allowed,
/// otherwise propagates the terminal error.
async fn check_budget(
    err: Error,
    operation: &'static str,
    attempt: u32,
    config: &RetryConfig,
    provider: &str,
) -> Result<()> {
    if !err.is_retryable() {
        return Err(err);
    }

    if attempt >= config.max_attempts {
        return Err(Error::RetriesExhausted {
            operation,
            attempts: attempt,
            source: Box::new(err),
        });
    }

    let delay = config.delay_for(attempt);
    warn!(
        provider,
        operation,
        attempt,
        max_attempts = config.max_attempts,
        delay_ms = delay.as_millis() as u64,
        error = %err,
        "Transient provider failure, backing off"
    );
    tokio::time::sleep(delay).await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_doubles() {
        let config = RetryConfig {
            max_attempts: 5,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(10),
        };

        assert_eq!(config.delay_for(1), Duration::from_millis(500));
        assert_eq!(config.delay_for(2), Duration::from_secs(1));
        assert_eq!(config.delay_for(3), Duration::from_secs(2));
        assert_eq!(config.delay_for(4), Duration::from_secs(4));
    }

    #[test]
    fn test_delay_capped() {
        let config = RetryConfig {
            max_attempts: 10,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(8),
        };

        assert_eq!(config.delay_for(4), Duration::from_secs(8));
        assert_eq!(config.delay_for(9), Duration::from_secs(8));
        // Large attempt numbers must not overflow
        assert_eq!(config.delay_for(u32::MAX), Duration::from_secs(8));
    }
}
