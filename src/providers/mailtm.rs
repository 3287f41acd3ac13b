//! mail.tm / mail.gw provider.
//!
//! Both services run the same hydra-flavored API at different endpoints, so
//! one implementation covers both; [`MailTm::mail_gw`] targets the second
//! deployment. Mailbox creation is a two-step dance: register the account,
//! then request a bearer token for it. Every later call authenticates with
//! that token, which travels with the [`Mailbox`] rather than the provider.

use crate::config::HttpConfig;
use crate::error::{Error, Result};
use crate::provider::{generate_local_part, MailProvider, Mailbox, MailboxCredentials, Message};
use crate::providers::build_client;
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use reqwest::header::ACCEPT;
use reqwest::StatusCode;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

const MAIL_TM_BASE: &str = "https://api.mail.tm/";
const MAIL_GW_BASE: &str = "https://api.mail.gw/";

/// The API speaks JSON-LD; it wants this accept header on every request.
const LD_JSON: &str = "application/ld+json";

/// Hydra collection wrapper used by every list endpoint.
#[derive(Debug, Deserialize)]
struct HydraList<T> {
    #[serde(rename = "hydra:member")]
    member: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct DomainEntry {
    domain: String,
}

#[derive(Debug, Serialize)]
struct AccountRequest<'a> {
    address: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct AccountResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: String,
}

#[derive(Debug, Deserialize)]
struct MessageSummary {
    id: String,
}

#[derive(Debug, Deserialize)]
struct MessageDetail {
    text: Option<String>,
}

/// Client for the mail.tm API family.
pub struct MailTm {
    client: reqwest::Client,
    base: &'static str,
    name: &'static str,
    domains: Vec<String>,
    rng: StdRng,
}

impl MailTm {
    /// Creates a provider for the mail.tm deployment.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(http: &HttpConfig) -> Result<Self> {
        Self::with_endpoint(http, MAIL_TM_BASE, "mail.tm")
    }

    /// Creates a provider for the mail.gw deployment of the same API.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn mail_gw(http: &HttpConfig) -> Result<Self> {
        Self::with_endpoint(http, MAIL_GW_BASE, "mail.gw")
    }

    fn with_endpoint(http: &HttpConfig, base: &'static str, name: &'static str) -> Result<Self> {
        Ok(Self {
            client: build_client(http)?,
            base,
            name,
            domains: Vec::new(),
            rng: StdRng::from_entropy(),
        })
    }

    /// Registers the account or requests its token; the two endpoints share
    /// one request shape.
    async fn account_request<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        operation: &'static str,
        address: &str,
        password: &str,
    ) -> Result<T> {
        let response = self
            .client
            .post(format!("{}{endpoint}", self.base))
            .header(ACCEPT, LD_JSON)
            .json(&AccountRequest { address, password })
            .send()
            .await
            .map_err(|source| Error::Http {
                provider: self.name.into(),
                source,
            })?;

        let status = response.status();
        if !matches!(status, StatusCode::OK | StatusCode::CREATED) {
            return Err(Error::ProviderStatus {
                provider: self.name.into(),
                status,
                operation,
            });
        }

        response
            .json()
            .await
            .map_err(|source| Error::TransientFetch {
                provider: self.name.into(),
                operation,
                source: Some(source),
            })
    }

    async fn read_message(&self, token: &str, id: &str) -> Result<Message> {
        let detail: MessageDetail = self
            .client
            .get(format!("{}messages/{id}", self.base))
            .header(ACCEPT, LD_JSON)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|source| Error::Http {
                provider: self.name.into(),
                source,
            })?
            .json()
            .await
            .map_err(|source| Error::TransientFetch {
                provider: self.name.into(),
                operation: "reading a message",
                source: Some(source),
            })?;

        Ok(Message {
            id: id.to_string(),
            body_text: detail.text.unwrap_or_default(),
        })
    }

    fn bearer_token<'a>(&self, mailbox: &'a Mailbox) -> Result<&'a str> {
        mailbox
            .credentials
            .bearer_token()
            .ok_or_else(|| Error::InvalidConfig {
                message: format!("mailbox {} carries no bearer token", mailbox.address),
            })
    }
}

#[async_trait]
impl MailProvider for MailTm {
    fn name(&self) -> &str {
        self.name
    }

    fn base_endpoint(&self) -> &str {
        self.base
    }

    #[instrument(name = "MailTm::list_domains", skip(self), fields(provider = self.name))]
    async fn list_domains(&mut self) -> Result<Vec<String>> {
        let list: HydraList<DomainEntry> = self
            .client
            .get(format!("{}domains", self.base))
            .header(ACCEPT, LD_JSON)
            .send()
            .await
            .map_err(|source| Error::Http {
                provider: self.name.into(),
                source,
            })?
            .json()
            .await
            .map_err(|source| Error::TransientFetch {
                provider: self.name.into(),
                operation: "listing domains",
                source: Some(source),
            })?;

        let domains: Vec<String> = list.member.into_iter().map(|d| d.domain).collect();
        debug!(domain_count = domains.len(), "Fetched domain list");

        self.domains = domains.clone();
        Ok(domains)
    }

    #[instrument(name = "MailTm::create_mailbox", skip(self), fields(provider = self.name))]
    async fn create_mailbox(&mut self) -> Result<Mailbox> {
        if self.domains.is_empty() {
            self.list_domains().await?;
        }
        if self.domains.is_empty() {
            return Err(Error::NoDomainsAvailable);
        }

        let domain = self.domains[self.rng.gen_range(0..self.domains.len())].clone();
        let address = format!("{}@{domain}", generate_local_part(&mut self.rng));
        // The password never needs to survive this session, so the domain
        // doubles as one.
        let password = domain.clone();

        let account: AccountResponse = self
            .account_request("accounts", "creating account", &address, &password)
            .await?;
        let token: TokenResponse = self
            .account_request("token", "requesting token", &address, &password)
            .await?;

        debug!(%address, account_id = %account.id, "Provisioned mailbox");

        Ok(Mailbox {
            address,
            domain,
            credentials: MailboxCredentials::Bearer {
                account_id: account.id,
                token: SecretString::from(token.token),
            },
        })
    }

    #[instrument(name = "MailTm::poll_messages", skip(self, mailbox), fields(provider = self.name, address = %mailbox.address))]
    async fn poll_messages(&mut self, mailbox: &Mailbox) -> Result<Vec<Message>> {
        let token = self.bearer_token(mailbox)?;

        // One page of the most recent messages is all a single-use mailbox
        // ever needs.
        let list: HydraList<MessageSummary> = self
            .client
            .get(format!("{}messages?page=1", self.base))
            .header(ACCEPT, LD_JSON)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|source| Error::Http {
                provider: self.name.into(),
                source,
            })?
            .json()
            .await
            .map_err(|source| Error::TransientFetch {
                provider: self.name.into(),
                operation: "polling messages",
                source: Some(source),
            })?;

        debug!(message_count = list.member.len(), "Polled inbox");

        let mut messages = Vec::with_capacity(list.member.len());
        for summary in list.member {
            messages.push(self.read_message(token, &summary.id).await?);
        }
        Ok(messages)
    }

    #[instrument(name = "MailTm::delete_mailbox", skip(self, mailbox), fields(provider = self.name, address = %mailbox.address))]
    async fn delete_mailbox(&mut self, mailbox: &Mailbox) -> Result<()> {
        let token = self.bearer_token(mailbox)?;
        let MailboxCredentials::Bearer { account_id, .. } = &mailbox.credentials else {
            return Err(Error::InvalidConfig {
                message: format!("mailbox {} carries no account id", mailbox.address),
            });
        };

        let response = self
            .client
            .delete(format!("{}accounts/{account_id}", self.base))
            .header(ACCEPT, LD_JSON)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|source| Error::Http {
                provider: self.name.into(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(Error::ProviderStatus {
                provider: self.name.into(),
                status: response.status(),
                operation: "deleting account",
            });
        }

        debug!("Account deleted");
        Ok(())
    }
}

impl std::fmt::Debug for MailTm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailTm")
            .field("name", &self.name)
            .field("base", &self.base)
            .field("cached_domains", &self.domains.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_list_wire_shape() {
        let raw = r#"{
            "hydra:member": [
                {"@id": "/domains/1", "domain": "somoj.com", "isActive": true},
                {"@id": "/domains/2", "domain": "dcpa.net", "isActive": true}
            ],
            "hydra:totalItems": 2
        }"#;
        let list: HydraList<DomainEntry> = serde_json::from_str(raw).unwrap();
        let domains: Vec<String> = list.member.into_iter().map(|d| d.domain).collect();
        assert_eq!(domains, vec!["somoj.com", "dcpa.net"]);
    }

    #[test]
    fn test_account_and_token_wire_shapes() {
        let raw = r#"{"@id": "/accounts/x", "id": "64a1", "address": "a@somoj.com"}"#;
        let account: AccountResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(account.id, "64a1");

        let raw = r#"{"token": "eyJhbGciOi", "id": "64a1"}"#;
        let token: TokenResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(token.token, "eyJhbGciOi");
    }

    #[test]
    fn test_message_wire_shapes() {
        let raw = r#"{"hydra:member": [{"id": "m1", "subject": "Verify"}], "hydra:totalItems": 1}"#;
        let list: HydraList<MessageSummary> = serde_json::from_str(raw).unwrap();
        assert_eq!(list.member[0].id, "m1");

        let raw = r#"{"id": "m1", "text": "Your code is 123456", "html": ["<p>hi</p>"]}"#;
        let detail: MessageDetail = serde_json::from_str(raw).unwrap();
        assert_eq!(detail.text.as_deref(), Some("Your code is 123456"));
    }

    #[test]
    fn test_account_request_serializes() {
        let request = AccountRequest {
            address: "a@somoj.com",
            password: "somoj.com",
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["address"], "a@somoj.com");
        assert_eq!(json["password"], "somoj.com");
    }
}
