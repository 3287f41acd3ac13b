//! The provider capability interface and its data types.
//!
//! Every disposable-mail service is exposed through the same four-operation
//! [`MailProvider`] trait: list domains, create a mailbox, poll it, delete
//! it. The services differ in authentication (none, bearer token, or the
//! address itself acting as the credential) and in whether the server or the
//! client deduplicates already-seen messages; both differences are confined
//! to the trait implementations in [`crate::providers`].

use crate::error::Result;
use async_trait::async_trait;
use rand::Rng;
use secrecy::{ExposeSecret, SecretString};

/// Length of the generated mailbox local part.
const LOCAL_PART_LEN: usize = 10;

/// Characters allowed in a generated local part.
const LOCAL_PART_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// A disposable-mail service exposed through a uniform lifecycle.
///
/// Implementations take `&mut self` because several of them carry state
/// between calls: a cached domain list, or the set of message IDs already
/// surfaced to the caller.
///
/// # Contract
///
/// - [`poll_messages`](Self::poll_messages) returns only messages not yet
///   surfaced by a previous call, and never mutates server-side state.
/// - [`delete_mailbox`](Self::delete_mailbox) is best-effort and idempotent;
///   callers report failures but do not retry them.
#[async_trait]
pub trait MailProvider: Send {
    /// Short service name, e.g. `"mail.tm"`. Used for selection by name
    /// and in log lines.
    fn name(&self) -> &str;

    /// Base URL of the service API.
    fn base_endpoint(&self) -> &str;

    /// Fetches the domains the service currently offers.
    ///
    /// An empty list is a legitimate answer (the service is out of
    /// capacity); a malformed response is a retryable error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TransientFetch`](crate::Error::TransientFetch) on a
    /// malformed or non-JSON response.
    async fn list_domains(&mut self) -> Result<Vec<String>>;

    /// Provisions a live mailbox.
    ///
    /// The address combines a random 10-character lowercase-alphanumeric
    /// local part with a domain chosen uniformly from the service's domain
    /// list. From this point the mailbox counts against provider quota
    /// until it is deleted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ProviderStatus`](crate::Error::ProviderStatus) if the
    /// service rejects account or token creation.
    async fn create_mailbox(&mut self) -> Result<Mailbox>;

    /// Returns messages that have not been surfaced by a previous call.
    ///
    /// # Errors
    ///
    /// Transport and decode failures are retryable; see
    /// [`Error::is_retryable`](crate::Error::is_retryable).
    async fn poll_messages(&mut self, mailbox: &Mailbox) -> Result<Vec<Message>>;

    /// Destroys the mailbox on the provider side.
    ///
    /// After this returns the mailbox is logically dead and no further
    /// operations on it are valid.
    ///
    /// # Errors
    ///
    /// Network failures are reported as-is; callers treat deletion as
    /// fire-and-forget.
    async fn delete_mailbox(&mut self, mailbox: &Mailbox) -> Result<()>;
}

/// A provisioned disposable mailbox plus whatever credential the provider
/// requires to poll or delete it.
#[derive(Clone)]
pub struct Mailbox {
    /// The full email address.
    pub address: String,
    /// The domain part of the address.
    pub domain: String,
    /// Provider-specific credentials for this mailbox.
    pub credentials: MailboxCredentials,
}

impl Mailbox {
    /// Returns the local part of the address (everything before the `@`).
    #[must_use]
    pub fn local_part(&self) -> &str {
        self.address.split('@').next().unwrap_or(&self.address)
    }
}

impl std::fmt::Debug for Mailbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mailbox")
            .field("address", &self.address)
            .field("domain", &self.domain)
            .field("credentials", &self.credentials)
            .finish()
    }
}

/// Credentials attached to a [`Mailbox`], variant-specific per provider.
#[derive(Clone)]
pub enum MailboxCredentials {
    /// The provider needs nothing beyond the address parts in the URL.
    None,
    /// Bearer token issued at mailbox creation, plus the account ID the
    /// delete endpoint wants.
    Bearer {
        /// Provider-side account identifier.
        account_id: String,
        /// The bearer token (protected from accidental logging).
        token: SecretString,
    },
    /// The address itself is the credential.
    AddressOnly,
}

impl MailboxCredentials {
    /// Returns the bearer token, if these credentials carry one.
    #[must_use]
    pub fn bearer_token(&self) -> Option<&str> {
        match self {
            MailboxCredentials::Bearer { token, .. } => Some(token.expose_secret()),
            _ => None,
        }
    }
}

impl std::fmt::Debug for MailboxCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MailboxCredentials::None => write!(f, "None"),
            MailboxCredentials::Bearer { account_id, .. } => f
                .debug_struct("Bearer")
                .field("account_id", account_id)
                .field("token", &"[REDACTED]")
                .finish(),
            MailboxCredentials::AddressOnly => write!(f, "AddressOnly"),
        }
    }
}

/// A message read from a mailbox. Transient: read once, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Identifier unique within the mailbox's message set.
    pub id: String,
    /// Plain-text body of the message.
    pub body_text: String,
}

/// A provider's identity and currently advertised capacity.
///
/// Refreshed at selection time; the domain list goes stale quickly.
#[derive(Debug, Clone)]
pub struct ProviderDescriptor {
    /// Short service name.
    pub name: String,
    /// Base URL of the service API.
    pub base_endpoint: String,
    /// Domains the service currently offers. May be empty.
    pub domains: Vec<String>,
}

impl ProviderDescriptor {
    /// Number of domains currently advertised, used as the selection weight.
    #[must_use]
    pub fn domain_count(&self) -> usize {
        self.domains.len()
    }
}

/// Generates a random 10-character lowercase-alphanumeric local part.
pub fn generate_local_part<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..LOCAL_PART_LEN)
        .map(|_| {
            let idx = rng.gen_range(0..LOCAL_PART_CHARSET.len());
            LOCAL_PART_CHARSET[idx] as char
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_local_part_shape() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let local = generate_local_part(&mut rng);
            assert_eq!(local.len(), 10);
            assert!(local
                .bytes()
                .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit()));
        }
    }

    #[test]
    fn test_local_part_deterministic_with_seed() {
        let mut a = StdRng::seed_from_u64(42);
        let mut b = StdRng::seed_from_u64(42);
        assert_eq!(generate_local_part(&mut a), generate_local_part(&mut b));
    }

    #[test]
    fn test_mailbox_local_part() {
        let mailbox = Mailbox {
            address: "abc123@example.com".into(),
            domain: "example.com".into(),
            credentials: MailboxCredentials::None,
        };
        assert_eq!(mailbox.local_part(), "abc123");
    }

    #[test]
    fn test_token_not_in_debug() {
        let mailbox = Mailbox {
            address: "abc@mail.tm".into(),
            domain: "mail.tm".into(),
            credentials: MailboxCredentials::Bearer {
                account_id: "acct-1".into(),
                token: SecretString::from("super-secret-token".to_string()),
            },
        };
        let debug_str = format!("{mailbox:?}");
        assert!(!debug_str.contains("super-secret-token"));
        assert!(debug_str.contains("[REDACTED]"));
    }

    #[test]
    fn test_descriptor_weight() {
        let descriptor = ProviderDescriptor {
            name: "mail.tm".into(),
            base_endpoint: "https://api.mail.tm/".into(),
            domains: vec!["a.com".into(), "b.com".into()],
        };
        assert_eq!(descriptor.domain_count(), 2);
    }
}
