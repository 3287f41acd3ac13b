//! 1secmail provider.
//!
//! The simplest of the three APIs: no authentication, no registration step.
//! A mailbox exists the moment someone sends mail to it, so
//! [`create_mailbox`](crate::MailProvider::create_mailbox) only picks an
//! address. The API serves everything from one endpoint switched by an
//! `action` query parameter; deletion goes through a separate form endpoint
//! on the website.

use crate::config::HttpConfig;
use crate::error::{Error, Result};
use crate::provider::{generate_local_part, MailProvider, Mailbox, MailboxCredentials, Message};
use crate::providers::build_client;
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use tracing::{debug, instrument};

const API_BASE: &str = "https://www.1secmail.com/api/v1/";
const DELETE_ENDPOINT: &str = "https://www.1secmail.com/mailbox";
const PROVIDER_NAME: &str = "1secmail";

/// Inbox listing entry. Only the ID matters; the body comes from a
/// separate `readMessage` call.
#[derive(Debug, Deserialize)]
struct InboxEntry {
    id: i64,
}

/// `readMessage` response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReadMessageResponse {
    text_body: Option<String>,
}

/// Client for the 1secmail API.
pub struct OneSecMail {
    client: reqwest::Client,
    domains: Vec<String>,
    rng: StdRng,
}

impl OneSecMail {
    /// Creates a 1secmail provider with the given HTTP configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(http: &HttpConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(http)?,
            domains: Vec::new(),
            rng: StdRng::from_entropy(),
        })
    }

    async fn read_message(&self, mailbox: &Mailbox, id: i64) -> Result<Message> {
        let url = format!(
            "{API_BASE}?action=readMessage&login={}&domain={}&id={id}",
            mailbox.local_part(),
            mailbox.domain
        );

        let body: ReadMessageResponse = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| Error::Http {
                provider: PROVIDER_NAME.into(),
                source,
            })?
            .json()
            .await
            .map_err(|source| Error::TransientFetch {
                provider: PROVIDER_NAME.into(),
                operation: "reading a message",
                source: Some(source),
            })?;

        Ok(Message {
            id: id.to_string(),
            body_text: body.text_body.unwrap_or_default(),
        })
    }
}

#[async_trait]
impl MailProvider for OneSecMail {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn base_endpoint(&self) -> &str {
        API_BASE
    }

    #[instrument(name = "OneSecMail::list_domains", skip(self))]
    async fn list_domains(&mut self) -> Result<Vec<String>> {
        let url = format!("{API_BASE}?action=getDomainList");

        let domains: Vec<String> = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| Error::Http {
                provider: PROVIDER_NAME.into(),
                source,
            })?
            .json()
            .await
            .map_err(|source| Error::TransientFetch {
                provider: PROVIDER_NAME.into(),
                operation: "listing domains",
                source: Some(source),
            })?;

        debug!(domain_count = domains.len(), "Fetched domain list");

        self.domains = domains.clone();
        Ok(domains)
    }

    #[instrument(name = "OneSecMail::create_mailbox", skip(self))]
    async fn create_mailbox(&mut self) -> Result<Mailbox> {
        if self.domains.is_empty() {
            self.list_domains().await?;
        }
        if self.domains.is_empty() {
            return Err(Error::NoDomainsAvailable);
        }

        // No registration call: a 1secmail address is live as soon as it
        // receives mail.
        let domain = self.domains[self.rng.gen_range(0..self.domains.len())].clone();
        let address = format!("{}@{domain}", generate_local_part(&mut self.rng));

        debug!(%address, "Provisioned mailbox");

        Ok(Mailbox {
            address,
            domain,
            credentials: MailboxCredentials::None,
        })
    }

    #[instrument(name = "OneSecMail::poll_messages", skip(self, mailbox), fields(address = %mailbox.address))]
    async fn poll_messages(&mut self, mailbox: &Mailbox) -> Result<Vec<Message>> {
        let url = format!(
            "{API_BASE}?action=getMessages&login={}&domain={}",
            mailbox.local_part(),
            mailbox.domain
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| Error::Http {
                provider: PROVIDER_NAME.into(),
                source,
            })?;

        // The inbox endpoint sometimes answers with an HTML page instead of
        // JSON. Treat that as an empty inbox; the next poll will try again.
        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("application/json"));
        if !is_json {
            debug!("Inbox response is not JSON, treating as empty");
            return Ok(Vec::new());
        }

        let entries: Vec<InboxEntry> =
            response
                .json()
                .await
                .map_err(|source| Error::TransientFetch {
                    provider: PROVIDER_NAME.into(),
                    operation: "polling messages",
                    source: Some(source),
                })?;

        debug!(message_count = entries.len(), "Polled inbox");

        let mut messages = Vec::with_capacity(entries.len());
        for entry in entries {
            messages.push(self.read_message(mailbox, entry.id).await?);
        }
        Ok(messages)
    }

    #[instrument(name = "OneSecMail::delete_mailbox", skip(self, mailbox), fields(address = %mailbox.address))]
    async fn delete_mailbox(&mut self, mailbox: &Mailbox) -> Result<()> {
        let form = [
            ("action", "deleteMailbox"),
            ("login", mailbox.local_part()),
            ("domain", mailbox.domain.as_str()),
        ];

        let response = self
            .client
            .post(DELETE_ENDPOINT)
            .form(&form)
            .send()
            .await
            .map_err(|source| Error::Http {
                provider: PROVIDER_NAME.into(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(Error::ProviderStatus {
                provider: PROVIDER_NAME.into(),
                status: response.status(),
                operation: "deleting mailbox",
            });
        }

        debug!("Mailbox deleted");
        Ok(())
    }
}

impl std::fmt::Debug for OneSecMail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OneSecMail")
            .field("cached_domains", &self.domains.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inbox_entry_wire_shape() {
        let raw = r#"[{"id":639,"from":"a@b.c","subject":"Hi","date":"2024-01-01 00:00:00"}]"#;
        let entries: Vec<InboxEntry> = serde_json::from_str(raw).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, 639);
    }

    #[test]
    fn test_read_message_wire_shape() {
        let raw = r#"{"id":639,"textBody":"Your code is 123456","htmlBody":"<p>hi</p>"}"#;
        let message: ReadMessageResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(message.text_body.as_deref(), Some("Your code is 123456"));
    }

    #[test]
    fn test_read_message_missing_body() {
        let raw = r#"{"id":639}"#;
        let message: ReadMessageResponse = serde_json::from_str(raw).unwrap();
        assert!(message.text_body.is_none());
    }
}
