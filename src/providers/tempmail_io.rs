//! temp-mail.io provider.
//!
//! The server generates the address itself and returns the full message
//! history on every inbox call, bodies inlined. Nothing on the far side
//! marks a message as read, so this provider keeps the set of message IDs
//! it has already surfaced and hands back only the new ones. Collapsing
//! that into "delete after the first non-empty poll" would silently drop
//! any message that lands between two polls.

use crate::config::HttpConfig;
use crate::error::{Error, Result};
use crate::provider::{MailProvider, Mailbox, MailboxCredentials, Message};
use crate::providers::build_client;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, instrument};

const API_BASE: &str = "https://api.internal.temp-mail.io/api/v2/";
const PROVIDER_NAME: &str = "temp-mail.io";

/// The local part length the server is asked to generate.
const NAME_LENGTH: usize = 10;

#[derive(Debug, Deserialize)]
struct DomainsResponse {
    domains: Vec<String>,
}

#[derive(Debug, Serialize)]
struct NewEmailRequest {
    min_name_length: usize,
    max_name_length: usize,
}

#[derive(Debug, Deserialize)]
struct NewEmailResponse {
    email: String,
}

#[derive(Debug, Deserialize)]
struct InboxMessage {
    id: String,
    body_text: Option<String>,
}

/// Client for the temp-mail.io API.
pub struct TempMailIo {
    client: reqwest::Client,
    seen: HashSet<String>,
}

impl TempMailIo {
    /// Creates a temp-mail.io provider with the given HTTP configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(http: &HttpConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(http)?,
            seen: HashSet::new(),
        })
    }

    /// Keeps only messages whose IDs have not been surfaced before and
    /// records them as seen.
    fn retain_unseen(&mut self, messages: Vec<Message>) -> Vec<Message> {
        messages
            .into_iter()
            .filter(|message| self.seen.insert(message.id.clone()))
            .collect()
    }
}

#[async_trait]
impl MailProvider for TempMailIo {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn base_endpoint(&self) -> &str {
        API_BASE
    }

    #[instrument(name = "TempMailIo::list_domains", skip(self))]
    async fn list_domains(&mut self) -> Result<Vec<String>> {
        let response: DomainsResponse = self
            .client
            .get(format!("{API_BASE}domains"))
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

        debug!(domain_count = response.domains.len(), "Fetched domain list");
        Ok(response.domains)
    }

    #[instrument(name = "TempMailIo::create_mailbox", skip(self))]
    async fn create_mailbox(&mut self) -> Result<Mailbox> {
        let response = self
            .client
            .post(format!("{API_BASE}email/new"))
            .json(&NewEmailRequest {
                min_name_length: NAME_LENGTH,
                max_name_length: NAME_LENGTH,
            })
            .send()
            .await
            .map_err(|source| Error::Http {
                provider: PROVIDER_NAME.into(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::ProviderStatus {
                provider: PROVIDER_NAME.into(),
                status,
                operation: "creating mailbox",
            });
        }

        let created: NewEmailResponse =
            response
                .json()
                .await
                .map_err(|source| Error::TransientFetch {
                    provider: PROVIDER_NAME.into(),
                    operation: "creating mailbox",
                    source: Some(source),
                })?;

        let domain = created
            .email
            .split('@')
            .nth(1)
            .unwrap_or_default()
            .to_string();

        debug!(address = %created.email, "Provisioned mailbox");

        // A fresh mailbox starts with a fresh view of what has been seen.
        self.seen.clear();

        Ok(Mailbox {
            address: created.email,
            domain,
            credentials: MailboxCredentials::AddressOnly,
        })
    }

    #[instrument(name = "TempMailIo::poll_messages", skip(self, mailbox), fields(address = %mailbox.address))]
    async fn poll_messages(&mut self, mailbox: &Mailbox) -> Result<Vec<Message>> {
        let inbox: Vec<InboxMessage> = self
            .client
            .get(format!("{API_BASE}email/{}/messages", mailbox.address))
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
                operation: "polling messages",
                source: Some(source),
            })?;

        let messages: Vec<Message> = inbox
            .into_iter()
            .map(|m| Message {
                id: m.id,
                body_text: m.body_text.unwrap_or_default(),
            })
            .collect();

        let new = self.retain_unseen(messages);
        debug!(new_count = new.len(), "Polled inbox");
        Ok(new)
    }

    #[instrument(name = "TempMailIo::delete_mailbox", skip(self, mailbox), fields(address = %mailbox.address))]
    async fn delete_mailbox(&mut self, mailbox: &Mailbox) -> Result<()> {
        let response = self
            .client
            .delete(format!("{API_BASE}email/{}", mailbox.address))
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

impl std::fmt::Debug for TempMailIo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TempMailIo")
            .field("seen_messages", &self.seen.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> TempMailIo {
        TempMailIo::new(&HttpConfig::default()).unwrap()
    }

    fn message(id: &str) -> Message {
        Message {
            id: id.into(),
            body_text: format!("body of {id}"),
        }
    }

    #[test]
    fn test_retain_unseen_dedup_across_polls() {
        let mut provider = provider();

        // First poll surfaces everything
        let first = provider.retain_unseen(vec![message("a"), message("b")]);
        assert_eq!(first.len(), 2);

        // Unchanged server-side set: second poll surfaces nothing
        let second = provider.retain_unseen(vec![message("a"), message("b")]);
        assert!(second.is_empty());

        // A genuinely new message still comes through
        let third = provider.retain_unseen(vec![message("a"), message("b"), message("c")]);
        assert_eq!(third.len(), 1);
        assert_eq!(third[0].id, "c");
    }

    #[test]
    fn test_domains_wire_shape() {
        let raw = r#"{"domains": ["greencafe24.com", "privaterelay.org"]}"#;
        let response: DomainsResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(response.domains.len(), 2);
    }

    #[test]
    fn test_new_email_wire_shapes() {
        let request = NewEmailRequest {
            min_name_length: 10,
            max_name_length: 10,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["min_name_length"], 10);

        let raw = r#"{"email": "xk2p9qw7rn@greencafe24.com", "token": "t"}"#;
        let created: NewEmailResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(created.email, "xk2p9qw7rn@greencafe24.com");
    }

    #[test]
    fn test_inbox_wire_shape() {
        let raw = r#"[
            {"id": "m-1", "from": "a@b.c", "subject": "Verify", "body_text": "code 123456", "body_html": "<p>code</p>"},
            {"id": "m-2", "from": "a@b.c", "subject": "Hi"}
        ]"#;
        let inbox: Vec<InboxMessage> = serde_json::from_str(raw).unwrap();
        assert_eq!(inbox[0].body_text.as_deref(), Some("code 123456"));
        assert!(inbox[1].body_text.is_none());
    }
}
