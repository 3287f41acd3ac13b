//! Example: Pin the session to one specific provider.
//!
//! By default a provider is chosen at random, weighted by how many domains
//! each one advertises. When a particular provider is known to behave well
//! (or a test needs determinism), selection can be pinned by name instead.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example fixed_provider -- mail.gw
//! ```
//!
//! Known names: `mail.tm`, `mail.gw`, `temp-mail.io`.

use std::env;
use std::time::Duration;
use tempbox::SessionConfig;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> tempbox::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tempbox=info")),
        )
        .init();

    let name = env::args().nth(1).unwrap_or_else(|| "mail.gw".to_string());

    let config = SessionConfig::builder()
        .fixed_provider(&name)
        .max_wait(Duration::from_secs(300))
        .build()?;

    println!("Provisioning a mailbox on {}...", name);

    let delivered = tempbox::run_session(config).await?;

    match delivered.code {
        Some(code) => println!("Got verification code: {}", code),
        None => println!("First message had no code. Body:\n{}", delivered.body_text),
    }

    Ok(())
}
