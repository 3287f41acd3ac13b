//! # tempbox
//!
//! Async client for disposable email providers: provision a throwaway
//! mailbox, watch it for incoming mail, pull the verification code out of
//! the first message, and delete the mailbox behind you.
//!
//! This crate provides a high-level, async API for:
//! - Creating mailboxes on any of the supported services (1secmail,
//!   mail.tm, mail.gw, temp-mail.io) through one uniform interface
//! - Selecting a service weighted by its currently advertised capacity
//! - Polling an inbox and extracting 6-digit verification codes
//!
//! ## Quick Start
//!
//! ```no_run
//! use tempbox::SessionConfig;
//!
//! # async fn example() -> tempbox::Result<()> {
//! // Pick a provider (weighted by available domains), create a mailbox,
//! // wait for the first message, delete the mailbox.
//! let config = SessionConfig::builder().build()?;
//! let delivered = tempbox::run_session(config).await?;
//!
//! match delivered.code {
//!     Some(code) => println!("Verification code: {code}"),
//!     None => println!("No code found; body was: {}", delivered.body_text),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Pinning a Provider
//!
//! ```no_run
//! use tempbox::SessionConfig;
//!
//! # async fn example() -> tempbox::Result<()> {
//! let config = SessionConfig::builder()
//!     .fixed_provider("mail.gw")
//!     .build()?;
//! let delivered = tempbox::run_session(config).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Driving a Session Yourself
//!
//! ```no_run
//! use tempbox::{HttpConfig, MailboxSession, SessionConfig};
//! use tempbox::providers::OneSecMail;
//!
//! # async fn example() -> tempbox::Result<()> {
//! let http = HttpConfig::default();
//! let provider = OneSecMail::new(&http)?;
//!
//! let mut session = MailboxSession::new(SessionConfig::builder().build()?);
//! let cancel = session.cancellation_token();
//!
//! // Cancel from anywhere; the mailbox still gets deleted.
//! tokio::spawn(async move {
//!     tokio::signal::ctrl_c().await.ok();
//!     cancel.cancel();
//! });
//!
//! let delivered = session.run(Box::new(provider)).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! All errors implement `std::error::Error` and provide context. Use
//! [`Error::is_retryable`] to determine if an operation can be retried:
//!
//! ```
//! use tempbox::Error;
//!
//! fn handle_error(error: &Error) {
//!     if error.is_retryable() {
//!         println!("Transient error, can retry: {}", error);
//!     } else {
//!         println!("Permanent error: {}", error);
//!     }
//! }
//! ```
//!
//! ## Observability
//!
//! The crate uses `tracing` for instrumentation. All major operations emit
//! spans with structured fields; every terminal session state produces one
//! human-readable status line.
//!
//! ### Span Naming Convention
//!
//! - `MailboxSession::run` - Full session lifecycle
//! - `ProviderPool::select` - Provider selection
//! - `<Provider>::list_domains` / `create_mailbox` / `poll_messages` /
//!   `delete_mailbox` - Per-provider operations
//!
//! ### Standard Fields
//!
//! - `provider` - Service name
//! - `address` - Mailbox address
//! - `domain_count` - Advertised domains at selection time
//! - `attempt` - Retry attempt number

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Public modules
pub mod config;
pub mod error;
pub mod extract;
pub mod provider;
pub mod providers;
pub mod retry;
pub mod select;
pub mod session;

// Re-exports for ergonomic API
pub use config::{HttpConfig, PollingConfig, SelectionMode, SessionConfig, SessionConfigBuilder};
pub use error::{Error, ErrorCategory, Result};
pub use extract::extract_code;
pub use provider::{MailProvider, Mailbox, MailboxCredentials, Message, ProviderDescriptor};
pub use retry::RetryConfig;
pub use select::{ProviderPool, Selected};
pub use session::{run_session, DeliveredMessage, MailboxSession, SessionState};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_api_accessible() {
        // Ensure all public types are accessible
        let _ = SessionConfig::builder();
        let _ = RetryConfig::default();
        let _ = extract_code("123456");
        let _ = providers::OneSecMail::new(&HttpConfig::default());
    }
}
