//! Concrete [`MailProvider`](crate::MailProvider) implementations.
//!
//! Three services with materially different APIs hide behind the one trait:
//!
//! | Provider | Auth | "New message" semantics |
//! |----------|------|-------------------------|
//! | [`OneSecMail`] | none | server returns the full inbox; everything is new |
//! | [`MailTm`] | bearer token from a two-step account+token request | single page of recent messages |
//! | [`TempMailIo`] | the address is the credential | full history every call; client deduplicates |
//!
//! The wire shapes are provider-internal detail and stay private to each
//! module.

mod mailtm;
mod onesec;
mod tempmail_io;

pub use mailtm::MailTm;
pub use onesec::OneSecMail;
pub use tempmail_io::TempMailIo;

use crate::config::HttpConfig;
use crate::error::{Error, Result};
use crate::select::ProviderPool;

/// Builds a reqwest client with the configured timeouts.
pub(crate) fn build_client(http: &HttpConfig) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(http.request_timeout)
        .connect_timeout(http.connect_timeout)
        .build()
        .map_err(|source| Error::HttpClient { source })
}

/// Creates the default selection pool: mail.tm, mail.gw and temp-mail.io.
///
/// [`OneSecMail`] is not in the default pool; construct it explicitly and
/// pass your own pool if you want it considered.
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be constructed.
pub fn default_pool(http: &HttpConfig) -> Result<ProviderPool> {
    Ok(ProviderPool::new(vec![
        Box::new(MailTm::new(http)?),
        Box::new(MailTm::mail_gw(http)?),
        Box::new(TempMailIo::new(http)?),
    ]))
}
