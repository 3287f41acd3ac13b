//! Example: Full observability plus graceful Ctrl+C shutdown.
//!
//! This example drives the session by hand instead of going through
//! [`tempbox::run_session`]: it selects a provider from the default pool,
//! wires the session's cancellation token to Ctrl+C, and enables span
//! enter/exit events so every provider call is visible.
//!
//! # Usage
//!
//! ```bash
//! # Set log level (trace, debug, info, warn, error)
//! export RUST_LOG=tempbox=debug
//!
//! cargo run --example with_tracing
//! ```

use rand::rngs::StdRng;
use rand::SeedableRng;
use tempbox::{providers, MailboxSession, SessionConfig};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> tempbox::Result<()> {
    // Initialize tracing subscriber with environment filter
    // Example: RUST_LOG=tempbox=debug,info
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tempbox=info")),
        )
        .with_span_events(FmtSpan::ENTER | FmtSpan::EXIT)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    let config = SessionConfig::builder().build()?;

    tracing::debug!("Configuration built successfully");

    // Selection emits spans for each provider's domain fetch
    let pool = providers::default_pool(&config.http)?;
    let mut rng = StdRng::from_entropy();
    let selected = pool
        .select(&config.selection, &config.retry, &mut rng)
        .await?;

    tracing::info!(provider = %selected.descriptor.name, "Provider selected");

    let mut session = MailboxSession::new(config);

    // Ctrl+C cancels the session; the mailbox is still deleted on the way out
    let cancel = session.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Ctrl+C received, shutting down");
            cancel.cancel();
        }
    });

    match session.run(selected.provider).await {
        Ok(delivered) => {
            tracing::info!(address = %delivered.address, "Session delivered");
            match delivered.code {
                Some(code) => println!("\nGot verification code: {}", code),
                None => println!("\nNo code in first message:\n{}", delivered.body_text),
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "Session ended without delivery");
            println!("\nSession failed: {}", e);
        }
    }

    Ok(())
}
