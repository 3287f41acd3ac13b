//! Configuration for disposable-mailbox sessions.
//!
//! Use [`SessionConfigBuilder`] to create a configuration with sensible defaults:
//!
//! ```
//! use tempbox::SessionConfig;
//!
//! let config = SessionConfig::builder()
//!     .build()
//!     .expect("valid config");
//! ```

use crate::error::{Error, Result};
use crate::retry::RetryConfig;
use std::time::Duration;

/// How the session picks a provider from the pool.
///
/// The weighted mode prefers providers currently advertising more domains,
/// on the assumption that domain count tracks available capacity. The fixed
/// mode pins a single provider by name, which is the right tool when a target
/// site blocks some of the disposable domains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionMode {
    /// Pick a provider at random, weighted by its advertised domain count.
    Weighted,
    /// Always use the named provider, e.g. `"mail.gw"`.
    Fixed(String),
}

impl Default for SelectionMode {
    fn default() -> Self {
        SelectionMode::Weighted
    }
}

/// Configuration for running a mailbox session.
///
/// Create using [`SessionConfig::builder()`].
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    /// Polling configuration for the inbox watch loop.
    pub polling: PollingConfig,
    /// HTTP client configuration shared by all providers.
    pub http: HttpConfig,
    /// Retry policy for transient provider failures.
    pub retry: RetryConfig,
    /// Provider selection policy.
    pub selection: SelectionMode,
}

/// HTTP client configuration.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Total timeout for a single HTTP request.
    pub request_timeout: Duration,
    /// Timeout for establishing the TCP connection.
    pub connect_timeout: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// Polling configuration for the inbox watch loop.
#[derive(Debug, Clone)]
pub struct PollingConfig {
    /// Interval between inbox polls.
    pub interval: Duration,
    /// Maximum time to wait for a message. `None` polls until a message
    /// arrives or the session is cancelled.
    pub max_wait: Option<Duration>,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            max_wait: None,
        }
    }
}

impl SessionConfig {
    /// Creates a new configuration builder.
    ///
    /// # Example
    ///
    /// ```
    /// use tempbox::SessionConfig;
    /// use std::time::Duration;
    ///
    /// let config = SessionConfig::builder()
    ///     .poll_interval(Duration::from_secs(5))
    ///     .max_wait(Duration::from_secs(300))
    ///     .build()
    ///     .expect("valid config");
    /// ```
    #[must_use]
    pub fn builder() -> SessionConfigBuilder {
        SessionConfigBuilder::default()
    }
}

/// Builder for [`SessionConfig`].
#[derive(Debug, Default)]
pub struct SessionConfigBuilder {
    polling: Option<PollingConfig>,
    http: Option<HttpConfig>,
    retry: Option<RetryConfig>,
    selection: Option<SelectionMode>,
}

impl SessionConfigBuilder {
    /// Sets polling configuration.
    #[must_use]
    pub fn polling(mut self, polling: PollingConfig) -> Self {
        self.polling = Some(polling);
        self
    }

    /// Sets the interval between inbox polls.
    ///
    /// Default is 5 seconds.
    #[must_use]
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.polling
            .get_or_insert_with(PollingConfig::default)
            .interval = interval;
        self
    }

    /// Sets the maximum time to wait for a message.
    ///
    /// By default the session polls indefinitely.
    #[must_use]
    pub fn max_wait(mut self, max_wait: Duration) -> Self {
        self.polling
            .get_or_insert_with(PollingConfig::default)
            .max_wait = Some(max_wait);
        self
    }

    /// Sets HTTP client configuration.
    #[must_use]
    pub fn http(mut self, http: HttpConfig) -> Self {
        self.http = Some(http);
        self
    }

    /// Sets the per-request HTTP timeout.
    #[must_use]
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.http
            .get_or_insert_with(HttpConfig::default)
            .request_timeout = timeout;
        self
    }

    /// Sets the retry policy for transient provider failures.
    #[must_use]
    pub fn retry(mut self, retry: RetryConfig) -> Self {
        self.retry = Some(retry);
        self
    }

    /// Sets the provider selection policy.
    ///
    /// Default is [`SelectionMode::Weighted`].
    #[must_use]
    pub fn selection(mut self, selection: SelectionMode) -> Self {
        self.selection = Some(selection);
        self
    }

    /// Pins the session to a single provider by name.
    #[must_use]
    pub fn fixed_provider(mut self, name: impl Into<String>) -> Self {
        self.selection = Some(SelectionMode::Fixed(name.into()));
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any field is out of range (zero poll interval,
    /// zero retry attempts, empty fixed-provider name).
    pub fn build(self) -> Result<SessionConfig> {
        let polling = self.polling.unwrap_or_default();
        if polling.interval.is_zero() {
            return Err(Error::InvalidConfig {
                message: "poll interval must be non-zero".into(),
            });
        }

        let retry = self.retry.unwrap_or_default();
        if retry.max_attempts == 0 {
            return Err(Error::InvalidConfig {
                message: "retry max_attempts must be at least 1".into(),
            });
        }

        let selection = self.selection.unwrap_or_default();
        if let SelectionMode::Fixed(name) = &selection {
            if name.is_empty() {
                return Err(Error::InvalidConfig {
                    message: "fixed provider name must not be empty".into(),
                });
            }
        }

        Ok(SessionConfig {
            polling,
            http: self.http.unwrap_or_default(),
            retry,
            selection,
        })
    }
}
