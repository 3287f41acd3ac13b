//! Basic example: Fetch a verification code through a throwaway mailbox.
//!
//! This example demonstrates the most common use case - provisioning a
//! disposable mailbox from a weighted-random provider, waiting for the
//! first message, and printing the 6-digit code it contains.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example fetch_code
//! ```
//!
//! The mailbox address is logged as soon as it exists ("Mailbox ready").
//! Send a verification email there, or press Ctrl+C to give up.

use std::time::Duration;
use tempbox::SessionConfig;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> tempbox::Result<()> {
    // Log at info level so the generated address is visible before delivery
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tempbox=info")),
        )
        .init();

    // Give up after five minutes of polling
    let config = SessionConfig::builder()
        .poll_interval(Duration::from_secs(5))
        .max_wait(Duration::from_secs(300))
        .build()?;

    println!("Provisioning a disposable mailbox...");

    let delivered = tempbox::run_session(config).await?;

    println!("Mailbox was: {}", delivered.address);
    match delivered.code {
        Some(code) => println!("Got verification code: {}", code),
        None => println!("First message had no code. Body:\n{}", delivered.body_text),
    }

    Ok(())
}
