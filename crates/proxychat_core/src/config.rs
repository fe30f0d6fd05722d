//! Client configuration.
//!
//! Loaded from an optional TOML file, then overridden by environment variables:
//! - `PROXYCHAT_ENDPOINT`: base URL of the backend
//! - `PROXYCHAT_VERBOSE`: request verbose backend output (`true`/`false`)
//! - `PROXYCHAT_STATE_DIR`: directory holding the persisted user identifier

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

pub const DEFAULT_ENDPOINT: &str = "http://localhost:3000";
pub const DEFAULT_PROXY_PATH: &str = "/api/proxy";

pub const ENV_ENDPOINT: &str = "PROXYCHAT_ENDPOINT";
pub const ENV_VERBOSE: &str = "PROXYCHAT_VERBOSE";
pub const ENV_STATE_DIR: &str = "PROXYCHAT_STATE_DIR";

/// Chat client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Base URL of the backend
    pub endpoint: String,
    /// Path of the proxy route under `endpoint`
    pub proxy_path: String,
    /// Ask the backend to keep conversation state
    pub stateful: bool,
    /// Ask for a streamed answer (the client reads the whole body either way)
    pub stream: bool,
    /// Ask the backend for verbose output
    pub verbose: bool,
    /// Where the user identifier is persisted; platform data dir when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_dir: Option<PathBuf>,
    /// Quick replies offered by the presentation layer
    pub suggested_prompts: Vec<String>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            proxy_path: DEFAULT_PROXY_PATH.to_string(),
            stateful: true,
            stream: false,
            verbose: false,
            state_dir: None,
            suggested_prompts: vec![
                "What can you help me with?".to_string(),
                "Give me a quick overview of what you know about.".to_string(),
                "How do I get started?".to_string(),
            ],
        }
    }
}

impl ChatConfig {
    /// Load a TOML config file. Missing fields keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overridden by the process environment.
    pub fn from_env() -> ConfigResult<Self> {
        Self::default().apply_env()
    }

    /// Apply `PROXYCHAT_*` environment overrides.
    pub fn apply_env(self) -> ConfigResult<Self> {
        self.apply_vars(|name| std::env::var(name).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn apply_vars(mut self, lookup: impl Fn(&str) -> Option<String>) -> ConfigResult<Self> {
        if let Some(endpoint) = lookup(ENV_ENDPOINT).filter(|v| !v.trim().is_empty()) {
            self.endpoint = endpoint.trim().to_string();
        }

        if let Some(verbose) = lookup(ENV_VERBOSE) {
            self.verbose = parse_flag(ENV_VERBOSE, &verbose)?;
        }

        if let Some(dir) = lookup(ENV_STATE_DIR).filter(|v| !v.trim().is_empty()) {
            self.state_dir = Some(PathBuf::from(dir));
        }

        self.validate()?;
        Ok(self)
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_state_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.state_dir = Some(dir.into());
        self
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if !(self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                field: "endpoint".to_string(),
                message: format!("expected an http(s) URL, got {:?}", self.endpoint),
            });
        }
        if self.proxy_path.trim_matches('/').is_empty() {
            return Err(ConfigError::Invalid {
                field: "proxy_path".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Full URL of the proxy route.
    pub fn proxy_url(&self) -> String {
        format!(
            "{}/{}",
            self.endpoint.trim_end_matches('/'),
            self.proxy_path.trim_start_matches('/')
        )
    }

    /// Directory for persisted state, or `None` when the platform has no data dir.
    pub fn resolved_state_dir(&self) -> Option<PathBuf> {
        self.state_dir
            .clone()
            .or_else(|| dirs::data_dir().map(|dir| dir.join("proxychat")))
    }
}

fn parse_flag(name: &str, value: &str) -> ConfigResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::Invalid {
            field: name.to_string(),
            message: format!("expected a boolean, got {:?}", other),
        }),
    }
}
