//! Error types for the tempbox crate.
//!
//! All errors implement [`std::error::Error`] and provide context about what went wrong.
//! Errors are categorized by their retryability - see [`Error::is_retryable`].

use std::time::Duration;
use thiserror::Error;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during disposable-mailbox operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    // ─────────────────────────────────────────────────────────────────────────
    // Configuration / validation errors (NOT retryable)
    // ─────────────────────────────────────────────────────────────────────────
    /// Invalid configuration provided.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the configuration error.
        message: String,
    },

    /// Failed to construct the underlying HTTP client.
    #[error("failed to build HTTP client")]
    HttpClient {
        /// The underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Network / transport errors (RETRYABLE)
    // ─────────────────────────────────────────────────────────────────────────
    /// HTTP request to a provider failed in transit.
    #[error("request to {provider} failed")]
    Http {
        /// The provider that was being contacted.
        provider: String,
        /// The underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },

    /// Provider returned a malformed or non-JSON response. Retryable -
    /// these APIs intermittently serve HTML error pages.
    #[error("malformed response from {provider} while {operation}")]
    TransientFetch {
        /// The provider that produced the response.
        provider: String,
        /// The operation that was in progress.
        operation: &'static str,
        /// The underlying decode error, when one exists.
        #[source]
        source: Option<reqwest::Error>,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Provider protocol errors (NOT retryable)
    // ─────────────────────────────────────────────────────────────────────────
    /// Provider rejected a request with a non-success status. Fatal to
    /// mailbox creation; the account state on the far side is unknown.
    #[error("{provider} returned HTTP {status} while {operation}")]
    ProviderStatus {
        /// The provider that rejected the request.
        provider: String,
        /// The HTTP status code returned.
        status: reqwest::StatusCode,
        /// The operation that was rejected.
        operation: &'static str,
    },

    /// Every provider in the pool reported zero available domains.
    #[error("no provider has any domains available")]
    NoDomainsAvailable,

    /// No provider in the pool matches the requested name.
    #[error("unknown provider '{name}'")]
    UnknownProvider {
        /// The provider name that was requested.
        name: String,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Retry / timeout errors (NOT retryable - we already retried or waited)
    // ─────────────────────────────────────────────────────────────────────────
    /// A retryable operation kept failing until the attempt budget ran out.
    #[error("{operation} still failing after {attempts} attempts")]
    RetriesExhausted {
        /// The operation that was retried.
        operation: &'static str,
        /// Number of attempts made.
        attempts: u32,
        /// The error from the final attempt.
        #[source]
        source: Box<Error>,
    },

    /// Timeout waiting for a message to arrive.
    #[error("no message arrived within {timeout:?}")]
    WaitTimeout {
        /// The timeout duration that was exceeded.
        timeout: Duration,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Cancellation (NOT retryable)
    // ─────────────────────────────────────────────────────────────────────────
    /// The session was cancelled by its caller. Mailbox cleanup was
    /// attempted before this error was returned.
    #[error("session cancelled")]
    Cancelled,
}

impl Error {
    /// Returns `true` if this error represents a transient failure that might succeed on retry.
    ///
    /// Use this to implement retry logic:
    ///
    /// ```ignore
    /// if error.is_retryable() {
    ///     // Backoff and retry
    /// } else {
    ///     // Fail permanently
    /// }
    /// ```
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            // RETRYABLE errors: transport failures and garbage responses
            Error::Http { .. } | Error::TransientFetch { .. } => true,

            // NOT retryable: config errors, protocol rejections, exhausted
            // budgets, cancellation
            Error::InvalidConfig { .. }
            | Error::HttpClient { .. }
            | Error::ProviderStatus { .. }
            | Error::NoDomainsAvailable
            | Error::UnknownProvider { .. }
            | Error::RetriesExhausted { .. }
            | Error::WaitTimeout { .. }
            | Error::Cancelled => false,
        }
    }

    /// Returns the error category for metrics/logging purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::InvalidConfig { .. }
            | Error::HttpClient { .. }
            | Error::UnknownProvider { .. } => ErrorCategory::Configuration,

            Error::Http { .. } => ErrorCategory::Network,

            Error::TransientFetch { .. } => ErrorCategory::Decode,

            Error::ProviderStatus { .. } => ErrorCategory::Protocol,

            Error::NoDomainsAvailable => ErrorCategory::Capacity,

            // An exhausted retry keeps the category of the final failure
            Error::RetriesExhausted { source, .. } => source.category(),

            Error::WaitTimeout { .. } => ErrorCategory::Timeout,

            Error::Cancelled => ErrorCategory::Cancelled,
        }
    }
}

/// Error categories for metrics and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Configuration or validation errors.
    Configuration,
    /// Network connectivity errors.
    Network,
    /// Malformed or undecodable provider responses.
    Decode,
    /// Provider protocol rejections (non-2xx status).
    Protocol,
    /// No capacity advertised by any provider.
    Capacity,
    /// Timeout errors.
    Timeout,
    /// Caller-requested cancellation.
    Cancelled,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Configuration => write!(f, "configuration"),
            ErrorCategory::Network => write!(f, "network"),
            ErrorCategory::Decode => write!(f, "decode"),
            ErrorCategory::Protocol => write!(f, "protocol"),
            ErrorCategory::Capacity => write!(f, "capacity"),
            ErrorCategory::Timeout => write!(f, "timeout"),
            ErrorCategory::Cancelled => write!(f, "cancelled"),
        }
    }
}
