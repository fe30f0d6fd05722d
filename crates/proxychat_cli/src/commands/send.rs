//! Send command - One-shot message.

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use proxychat_core::{Role, SubmitOutcome};

use super::{build_controller, Cli};

#[derive(Args)]
pub struct SendArgs {
    /// Message to send
    #[arg(required = true, trailing_var_arg = true)]
    message: Vec<String>,

    /// Print the whole conversation as JSON
    #[arg(long)]
    json: bool,
}

pub async fn execute(cli: &Cli, args: &SendArgs) -> Result<()> {
    let config = cli.load_config()?;
    let controller = build_controller(&config);
    let message = args.message.join(" ");

    info!("Sending message to {}", config.proxy_url());

    match controller.submit(&message).await {
        SubmitOutcome::Skipped => anyhow::bail!("Invalid argument: message is empty"),
        SubmitOutcome::Busy => anyhow::bail!("Another message is still being sent"),
        SubmitOutcome::Failed(err) => {
            if let Some(message) = controller.error() {
                eprintln!("⚠️  {}", message);
            }
            return Err(err).context("Failed to send message");
        }
        SubmitOutcome::Answered { degraded } => {
            if degraded {
                info!("Backend returned no reply content");
            }
        }
    }

    let conversation = controller.conversation();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&conversation)?);
    } else if let Some(reply) = conversation.last().filter(|t| t.role() == Role::Agent) {
        println!("{}", reply.content());
    }

    Ok(())
}
