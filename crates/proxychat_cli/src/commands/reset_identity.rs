//! Reset-identity command - Forget the persisted user identifier.

use anyhow::{Context, Result};
use tracing::info;

use super::{identity_store, Cli};

pub async fn execute(cli: &Cli) -> Result<()> {
    let config = cli.load_config()?;

    identity_store(&config)
        .clear_user_id()
        .context("Failed to clear the user identifier")?;

    info!("Cleared persisted user identifier");
    println!("✅ User identifier cleared. A new one is created on the next message.");

    Ok(())
}
