//! Turn exchange with the proxy endpoint.
//!
//! One submission is one POST. There are no retries and no timeout beyond what the
//! HTTP client enforces on its own. A successful answer without reply content is
//! degraded to a placeholder reply instead of failing.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::config::ChatConfig;
use crate::conversation::Turn;
use crate::error::{ExchangeError, ExchangeResult};
use crate::identity::{Identifier, Identifiers};

/// Reply used when the backend answers without `output_data.content`.
pub const NO_REPLY_PLACEHOLDER: &str = "No valid response received from agent.";

/// Everything the backend needs for one user turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeRequest {
    pub turn: Turn,
    pub stateful: bool,
    pub stream: bool,
    pub user_id: Identifier,
    pub session_id: Identifier,
    pub verbose: bool,
}

impl ExchangeRequest {
    /// Stateful, non-streaming, non-verbose request for `turn`.
    pub fn new(turn: Turn, identifiers: &Identifiers) -> Self {
        Self {
            turn,
            stateful: true,
            stream: false,
            user_id: identifiers.user_id.clone(),
            session_id: identifiers.session_id.clone(),
            verbose: false,
        }
    }

    pub fn stateful(mut self, stateful: bool) -> Self {
        self.stateful = stateful;
        self
    }

    pub fn stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// JSON body posted to the proxy.
    pub fn body(&self) -> Value {
        json!({
            "data": { "message": self.turn },
            "stateful": self.stateful,
            "stream": self.stream,
            "user_id": self.user_id,
            "session_id": self.session_id,
            "verbose": self.verbose,
        })
    }
}

/// Reply text from a settled exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeResponse {
    pub content: String,
    /// True when the backend sent no reply content and the placeholder was used.
    pub degraded: bool,
}

impl ExchangeResponse {
    pub fn reply(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            degraded: false,
        }
    }

    pub fn placeholder() -> Self {
        Self {
            content: NO_REPLY_PLACEHOLDER.to_string(),
            degraded: true,
        }
    }

    /// Read the reply at `output_data.content`, falling back to the placeholder.
    pub fn from_body(body: &Value) -> Self {
        match body.pointer("/output_data/content").and_then(Value::as_str) {
            Some(content) => Self::reply(content),
            None => Self::placeholder(),
        }
    }

    /// The agent turn to append to the conversation.
    pub fn into_turn(self) -> Turn {
        Turn::agent(self.content)
    }
}

/// Sends one user turn and resolves with the agent's reply.
#[async_trait]
pub trait TurnExchanger: Send + Sync {
    async fn send(&self, request: &ExchangeRequest) -> ExchangeResult<ExchangeResponse>;
}

/// Exchanger posting JSON to the proxy endpoint.
#[derive(Debug, Clone)]
pub struct HttpExchanger {
    url: String,
    client: reqwest::Client,
}

impl HttpExchanger {
    /// Create an exchanger for a full proxy URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: reqwest::Client::new(),
        }
    }

    pub fn from_config(config: &ChatConfig) -> Self {
        Self::new(config.proxy_url())
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl TurnExchanger for HttpExchanger {
    async fn send(&self, request: &ExchangeRequest) -> ExchangeResult<ExchangeResponse> {
        debug!(
            url = %self.url,
            session_id = %request.session_id,
            "Sending turn to proxy"
        );

        let response = self.client.post(&self.url).json(&request.body()).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = if body.trim().is_empty() {
                status.canonical_reason().unwrap_or("unknown status").to_string()
            } else {
                body
            };
            return Err(ExchangeError::Server {
                status: status.as_u16(),
                detail,
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| ExchangeError::Transport(format!("Failed to parse response: {}", e)))?;

        let reply = ExchangeResponse::from_body(&body);
        if reply.degraded {
            warn!("Proxy response had no output_data.content, using placeholder");
        }
        Ok(reply)
    }
}
