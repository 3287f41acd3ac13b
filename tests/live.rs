//! Live integration tests against the real disposable-email services.
//!
//! These tests hit third-party APIs over the network and are disabled by
//! default. To run them:
//!
//! ```bash
//! cargo test --features live-tests -- --ignored
//! ```
//!
//! They exercise the provision/poll/delete surface of each provider but do
//! not wait for a real inbound email; expect a few API calls per test.

#![cfg(feature = "live-tests")]

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Duration;
use tempbox::{providers, Error, HttpConfig, MailProvider, RetryConfig, SessionConfig};

fn http_config() -> HttpConfig {
    HttpConfig {
        request_timeout: Duration::from_secs(30),
        connect_timeout: Duration::from_secs(10),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Provider surface tests
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
#[ignore = "requires network access"]
async fn test_mail_tm_full_mailbox_lifecycle() {
    let mut provider = providers::MailTm::new(&http_config()).expect("client built");

    let domains = provider.list_domains().await.expect("domains fetched");
    assert!(!domains.is_empty());

    let mailbox = provider.create_mailbox().await.expect("mailbox created");
    assert!(mailbox.address.ends_with(&mailbox.domain));

    // A fresh mailbox is empty
    let messages = provider.poll_messages(&mailbox).await.expect("polled");
    assert!(messages.is_empty());

    provider.delete_mailbox(&mailbox).await.expect("deleted");
}

#[tokio::test]
#[ignore = "requires network access"]
async fn test_mail_gw_uses_its_own_domains() {
    let mut provider = providers::MailTm::mail_gw(&http_config()).expect("client built");
    assert_eq!(provider.name(), "mail.gw");

    let domains = provider.list_domains().await.expect("domains fetched");
    assert!(!domains.is_empty());
}

#[tokio::test]
#[ignore = "requires network access"]
async fn test_temp_mail_io_full_mailbox_lifecycle() {
    let mut provider = providers::TempMailIo::new(&http_config()).expect("client built");

    let mailbox = provider.create_mailbox().await.expect("mailbox created");
    assert!(mailbox.address.contains('@'));

    let messages = provider.poll_messages(&mailbox).await.expect("polled");
    assert!(messages.is_empty());

    provider.delete_mailbox(&mailbox).await.expect("deleted");
}

// ─────────────────────────────────────────────────────────────────────────────
// Selection tests
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
#[ignore = "requires network access"]
async fn test_default_pool_selects_a_provider_with_domains() {
    let pool = providers::default_pool(&http_config()).expect("pool built");
    let mut rng = StdRng::from_entropy();

    let selected = pool
        .select(
            &tempbox::SelectionMode::Weighted,
            &RetryConfig::default(),
            &mut rng,
        )
        .await
        .expect("selection succeeded");

    assert!(!selected.descriptor.domains.is_empty());
}

// ─────────────────────────────────────────────────────────────────────────────
// Session tests
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
#[ignore = "requires network access"]
async fn test_session_times_out_against_quiet_mailbox() {
    // Nothing is sent to the mailbox, so the session should give up after
    // max_wait and still clean up behind itself.
    let config = SessionConfig::builder()
        .poll_interval(Duration::from_secs(2))
        .max_wait(Duration::from_secs(6))
        .build()
        .expect("valid config");

    let result = tempbox::run_session(config).await;

    match result {
        Err(Error::WaitTimeout { .. }) => {}
        Err(other) => panic!("expected timeout, got: {}", other),
        Ok(delivered) => panic!("unexpected delivery: {:?}", delivered),
    }
}
