//! CLI command definitions.
//!
//! This module defines the command structure for the proxychat CLI
//! and the wiring shared by all subcommands.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, warn};

use proxychat_core::{
    ChatConfig, ChatController, HttpExchanger, IdentityStore, MemoryStore, UnavailableStore,
};

pub mod chat;
pub mod reset_identity;
pub mod send;
pub mod whoami;

/// proxychat - chat with an agent through a backend proxy
#[derive(Parser)]
#[command(name = "proxychat")]
#[command(version, about = "proxychat - chat with an agent through a backend proxy")]
#[command(long_about = r#"
proxychat sends your messages to an agent backend through its proxy endpoint
and prints the replies. A session identifier is created per run and a user
identifier is kept on disk so the backend can follow the conversation.

COMMANDS:
  chat            → Interactive conversation (with suggested prompts)
  send            → Send a single message and print the reply
  whoami          → Show the session and user identifiers
  reset-identity  → Forget the persisted user identifier

EXIT CODES:
  0 - Success
  1 - General error
  2 - Invalid arguments or configuration
  3 - Exchange with the backend failed
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to a TOML config file
    #[arg(short, long, global = true, env = "PROXYCHAT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Backend base URL (overrides config and PROXYCHAT_ENDPOINT)
    #[arg(short, long, global = true)]
    pub endpoint: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start an interactive conversation
    Chat(chat::ChatArgs),

    /// Send one message and print the reply
    Send(send::SendArgs),

    /// Show the identifiers sent to the backend
    Whoami(whoami::WhoamiArgs),

    /// Forget the persisted user identifier
    #[command(name = "reset-identity")]
    ResetIdentity,
}

impl Cli {
    /// Resolve configuration: file, then environment, then flags.
    pub fn load_config(&self) -> Result<ChatConfig> {
        let config = match &self.config {
            Some(path) => ChatConfig::load(path)
                .with_context(|| format!("Failed to load config from {:?}", path))?,
            None => ChatConfig::default(),
        };

        let mut config = config.apply_env()?;

        if let Some(endpoint) = &self.endpoint {
            config = config.with_endpoint(endpoint.clone());
            config.validate()?;
        }

        debug!("Using proxy endpoint {}", config.proxy_url());
        Ok(config)
    }
}

/// Identity store for this process: session scope in memory, user scope on disk.
pub fn identity_store(config: &ChatConfig) -> IdentityStore {
    match config.resolved_state_dir() {
        Some(dir) => IdentityStore::with_state_dir(dir),
        None => {
            warn!("No data directory available, the user identifier will not be sent");
            IdentityStore::new(
                Arc::new(MemoryStore::new()),
                Arc::new(UnavailableStore::new("no data directory")),
            )
        }
    }
}

pub fn build_controller(config: &ChatConfig) -> ChatController {
    ChatController::from_config(
        config,
        identity_store(config),
        Arc::new(HttpExchanger::from_config(config)),
    )
}
