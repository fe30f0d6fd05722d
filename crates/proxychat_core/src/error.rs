//! Error types for the chat client.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for identifier storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Result type alias for turn exchanges.
pub type ExchangeResult<T> = Result<T, ExchangeError>;

/// Result type alias for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised by a key/value identifier store.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Corrupt store at {path:?}: {message}")]
    Corrupt { path: PathBuf, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised by a single turn exchange with the backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExchangeError {
    /// The backend answered with a non-success status.
    #[error("Server error {status}: {detail}")]
    Server { status: u16, detail: String },

    /// The backend could not be reached, or its answer could not be read.
    #[error("Transport error: {0}")]
    Transport(String),
}

impl ExchangeError {
    /// Message shown to the user in the controller's error slot.
    pub fn user_message(&self) -> String {
        match self {
            Self::Server { status, .. } => {
                format!("The agent service responded with status {}.", status)
            }
            Self::Transport(_) => {
                "Unable to reach the agent service. Please try again.".to_string()
            }
        }
    }
}

impl From<reqwest::Error> for ExchangeError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

/// Errors raised while loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration value for {field}: {message}")]
    Invalid { field: String, message: String },
}
