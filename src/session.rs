//! Mailbox session lifecycle.
//!
//! A [`MailboxSession`] drives one provider through create → poll → extract
//! → delete. The poll loop sleeps a fixed interval between polls; that sleep
//! is the only suspension point. Whatever way the session ends - delivery,
//! fatal error, cancellation, timeout - it attempts to delete the mailbox
//! exactly once before returning, because an undeleted mailbox leaks
//! provider-side quota.
//!
//! # Example
//!
//! ```no_run
//! use tempbox::SessionConfig;
//!
//! # async fn example() -> tempbox::Result<()> {
//! let config = SessionConfig::builder().build()?;
//! let delivered = tempbox::run_session(config).await?;
//!
//! match delivered.code {
//!     Some(code) => println!("Code: {code}"),
//!     None => println!("No code, body: {}", delivered.body_text),
//! }
//! # Ok(())
//! # }
//! ```

use crate::config::SessionConfig;
use crate::error::{Error, Result};
use crate::extract::extract_code;
use crate::provider::{MailProvider, Mailbox};
use crate::providers;
use crate::retry::poll_with_retry;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Lifecycle states of a [`MailboxSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No mailbox exists yet.
    Idle,
    /// The mailbox is live on the provider side.
    Created,
    /// The inbox is being watched.
    Polling,
    /// A message was delivered to the caller.
    Delivered,
    /// The mailbox was (best-effort) deleted and the session ended cleanly.
    Closed,
    /// The session ended with an error; cleanup was attempted.
    Failed,
}

/// The first qualifying message of a session, with whatever code the
/// extraction heuristic found in it.
#[derive(Debug, Clone)]
pub struct DeliveredMessage {
    /// Address of the mailbox the message arrived in.
    pub address: String,
    /// Provider-side message identifier.
    pub message_id: String,
    /// Extracted verification code, if the body contained one.
    pub code: Option<String>,
    /// Full plain-text body.
    pub body_text: String,
}

type DeliveryHook = Box<dyn Fn(&DeliveredMessage) + Send + Sync>;

/// Drives one provider through the mailbox lifecycle.
///
/// # Lifecycle
///
/// `Idle → Created → Polling → Delivered → Closed`, with `Failed` reachable
/// from any state. Cancellation is honored before, during and after each
/// poll and always routes through mailbox deletion.
pub struct MailboxSession {
    config: SessionConfig,
    cancel: CancellationToken,
    state: SessionState,
    on_delivery: Option<DeliveryHook>,
}

impl MailboxSession {
    /// Creates a session with the given configuration.
    #[must_use]
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            cancel: CancellationToken::new(),
            state: SessionState::Idle,
            on_delivery: None,
        }
    }

    /// Returns a token that cancels this session when triggered.
    ///
    /// Cancellation is treated like any other fatal condition: the mailbox
    /// is deleted before the session returns [`Error::Cancelled`].
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Returns the session's current lifecycle state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Registers a hook invoked when a message is delivered, before cleanup.
    #[must_use]
    pub fn on_delivery(mut self, hook: impl Fn(&DeliveredMessage) + Send + Sync + 'static) -> Self {
        self.on_delivery = Some(Box::new(hook));
        self
    }

    /// Runs the full lifecycle against the given provider.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Cancelled`] if the cancellation token fires,
    /// [`Error::WaitTimeout`] if `max_wait` elapses, or the underlying
    /// provider error once retries are exhausted. In every error case the
    /// mailbox deletion has already been attempted.
    #[instrument(name = "MailboxSession::run", skip_all, fields(provider = provider.name()))]
    pub async fn run(&mut self, mut provider: Box<dyn MailProvider>) -> Result<DeliveredMessage> {
        self.state = SessionState::Idle;

        // Nothing to clean up before a mailbox exists.
        if self.cancel.is_cancelled() {
            self.state = SessionState::Failed;
            return Err(Error::Cancelled);
        }

        let mailbox = match provider.create_mailbox().await {
            Ok(mailbox) => mailbox,
            Err(error) => {
                self.state = SessionState::Failed;
                warn!(%error, "Mailbox creation failed");
                return Err(error);
            }
        };
        self.state = SessionState::Created;
        info!(address = %mailbox.address, "Mailbox ready");

        match self.poll_loop(provider.as_mut(), &mailbox).await {
            Ok(delivered) => {
                self.state = SessionState::Delivered;
                if let Some(hook) = &self.on_delivery {
                    hook(&delivered);
                }
                match &delivered.code {
                    Some(code) => info!(
                        address = %delivered.address,
                        code = %code,
                        body = %delivered.body_text,
                        "Verification code extracted"
                    ),
                    None => info!(
                        address = %delivered.address,
                        body = %delivered.body_text,
                        "No code found, delivering raw body"
                    ),
                }
                self.teardown(provider.as_mut(), &mailbox).await;
                self.state = SessionState::Closed;
                Ok(delivered)
            }
            Err(error) => {
                // Cancellation and fatal errors share the cleanup path.
                self.teardown(provider.as_mut(), &mailbox).await;
                self.state = SessionState::Failed;
                info!(address = %mailbox.address, %error, "Session ended without delivery");
                Err(error)
            }
        }
    }

    /// Watches the inbox until a message arrives, the deadline passes, or
    /// the session is cancelled.
    async fn poll_loop(
        &mut self,
        provider: &mut dyn MailProvider,
        mailbox: &Mailbox,
    ) -> Result<DeliveredMessage> {
        self.state = SessionState::Polling;
        let deadline = self.config.polling.max_wait.map(|wait| Instant::now() + wait);

        loop {
            if self.cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }
            if let Some(deadline) = deadline {
                if Instant::now() > deadline {
                    return Err(Error::WaitTimeout {
                        timeout: self.config.polling.max_wait.unwrap_or_default(),
                    });
                }
            }

            let messages = tokio::select! {
                () = self.cancel.cancelled() => return Err(Error::Cancelled),
                result = poll_with_retry(provider, mailbox, &self.config.retry) => result?,
            };

            // The first newly observed message is the qualifying one; code
            // or no code, it gets delivered.
            if let Some(message) = messages.into_iter().next() {
                let code = extract_code(&message.body_text);
                return Ok(DeliveredMessage {
                    address: mailbox.address.clone(),
                    message_id: message.id,
                    code,
                    body_text: message.body_text,
                });
            }

            debug!(interval = ?self.config.polling.interval, "Inbox empty, sleeping");
            tokio::select! {
                () = self.cancel.cancelled() => return Err(Error::Cancelled),
                () = tokio::time::sleep(self.config.polling.interval) => {}
            }
        }
    }

    /// Deletes the mailbox, best-effort. Failures are reported, not retried,
    /// and never mask the session's primary outcome.
    async fn teardown(&self, provider: &mut dyn MailProvider, mailbox: &Mailbox) {
        match provider.delete_mailbox(mailbox).await {
            Ok(()) => info!(address = %mailbox.address, "Mailbox deleted"),
            Err(error) => warn!(address = %mailbox.address, %error, "Mailbox deletion failed"),
        }
    }
}

impl std::fmt::Debug for MailboxSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailboxSession")
            .field("state", &self.state)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Selects a provider from the default pool and runs one session against it.
///
/// This is the one-call entry point: provider selection per the configured
/// [`SelectionMode`](crate::SelectionMode), then the full mailbox lifecycle.
///
/// # Errors
///
/// Returns [`Error::NoDomainsAvailable`] when selection finds no capacity,
/// or any error [`MailboxSession::run`] can produce.
pub async fn run_session(config: SessionConfig) -> Result<DeliveredMessage> {
    let mut rng = StdRng::from_entropy();
    let pool = providers::default_pool(&config.http)?;
    let selected = pool
        .select(&config.selection, &config.retry, &mut rng)
        .await?;

    info!(
        provider = %selected.descriptor.name,
        domains = ?selected.descriptor.domains,
        "Using provider"
    );

    let mut session = MailboxSession::new(config);
    session.run(selected.provider).await
}
