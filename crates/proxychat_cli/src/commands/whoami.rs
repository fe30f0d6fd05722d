//! Whoami command - Show client identifiers.

use anyhow::Result;
use clap::Args;

use super::{identity_store, Cli};

#[derive(Args)]
pub struct WhoamiArgs {
    /// Print identifiers as JSON
    #[arg(long)]
    json: bool,
}

pub async fn execute(cli: &Cli, args: &WhoamiArgs) -> Result<()> {
    let config = cli.load_config()?;
    let identifiers = identity_store(&config).identifiers();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&identifiers)?);
        return Ok(());
    }

    println!("Session: {}", display_or_unavailable(&identifiers.session_id));
    println!("User:    {}", display_or_unavailable(&identifiers.user_id));
    if let Some(dir) = config.resolved_state_dir() {
        println!("State:   {}", dir.display());
    }

    Ok(())
}

fn display_or_unavailable(id: &str) -> &str {
    if id.is_empty() {
        "(unavailable)"
    } else {
        id
    }
}
