//! Mock turn exchanger for testing.
//!
//! Provides a configurable implementation of the TurnExchanger trait
//! for use in tests and offline runs without a backend.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use tokio::sync::Notify;

use crate::error::{ExchangeError, ExchangeResult};
use crate::exchange::{ExchangeRequest, ExchangeResponse, TurnExchanger};

type ReplyFn = dyn Fn(&ExchangeRequest) -> ExchangeResult<ExchangeResponse> + Send + Sync;

/// Predefined outcome for one exchange.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Reply with this content.
    Content(String),
    /// Interpret this as the backend's JSON body.
    Body(Value),
    /// Fail with this error.
    Fail(ExchangeError),
}

impl MockReply {
    pub fn content(content: impl Into<String>) -> Self {
        Self::Content(content.into())
    }

    pub fn server_error(status: u16) -> Self {
        Self::Fail(ExchangeError::Server {
            status,
            detail: format!("mock status {}", status),
        })
    }

    pub fn transport_error(message: impl Into<String>) -> Self {
        Self::Fail(ExchangeError::Transport(message.into()))
    }

    fn resolve(self) -> ExchangeResult<ExchangeResponse> {
        match self {
            Self::Content(content) => Ok(ExchangeResponse::reply(content)),
            Self::Body(body) => Ok(ExchangeResponse::from_body(&body)),
            Self::Fail(err) => Err(err),
        }
    }
}

/// Captured request information for verification.
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub content: String,
    pub session_id: String,
    pub user_id: String,
    pub body: Value,
}

/// Mock exchanger.
///
/// Captures every request and answers from a handler, a list of scripted
/// replies (cycled), or an empty reply when nothing is configured.
#[derive(Clone)]
pub struct MockExchanger {
    replies: Arc<RwLock<Vec<MockReply>>>,
    reply_index: Arc<AtomicUsize>,
    handler: Arc<RwLock<Option<Arc<ReplyFn>>>>,
    captured: Arc<RwLock<Vec<CapturedRequest>>>,
    /// When set, each exchange waits for a notification before answering.
    gate: Arc<RwLock<Option<Arc<Notify>>>>,
}

impl Default for MockExchanger {
    fn default() -> Self {
        Self::new()
    }
}

impl MockExchanger {
    pub fn new() -> Self {
        Self {
            replies: Arc::new(RwLock::new(Vec::new())),
            reply_index: Arc::new(AtomicUsize::new(0)),
            handler: Arc::new(RwLock::new(None)),
            captured: Arc::new(RwLock::new(Vec::new())),
            gate: Arc::new(RwLock::new(None)),
        }
    }

    /// Answer every request by transforming the user's content.
    pub fn echo(transform: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        Self::new().with_handler(move |request| {
            Ok(ExchangeResponse::reply(transform(request.turn.content())))
        })
    }

    /// Add a scripted reply.
    pub fn add_reply(self, reply: MockReply) -> Self {
        self.replies.write().push(reply);
        self
    }

    /// Replace the scripted replies.
    pub fn with_replies(self, replies: Vec<MockReply>) -> Self {
        *self.replies.write() = replies;
        self
    }

    /// Compute replies from the request. Takes precedence over scripted replies.
    pub fn with_handler(
        self,
        handler: impl Fn(&ExchangeRequest) -> ExchangeResult<ExchangeResponse> + Send + Sync + 'static,
    ) -> Self {
        *self.handler.write() = Some(Arc::new(handler));
        self
    }

    /// Hold each exchange pending until `gate` is notified.
    pub fn hold_until(self, gate: Arc<Notify>) -> Self {
        *self.gate.write() = Some(gate);
        self
    }

    /// Get all captured requests.
    pub fn get_requests(&self) -> Vec<CapturedRequest> {
        self.captured.read().clone()
    }

    /// Get the number of exchanges started.
    pub fn call_count(&self) -> usize {
        self.captured.read().len()
    }

    pub fn clear_requests(&self) {
        self.captured.write().clear();
    }

    fn record(&self, request: &ExchangeRequest) {
        self.captured.write().push(CapturedRequest {
            content: request.turn.content().to_string(),
            session_id: request.session_id.clone(),
            user_id: request.user_id.clone(),
            body: request.body(),
        });
    }

    fn next_reply(&self) -> MockReply {
        let replies = self.replies.read();
        if replies.is_empty() {
            return MockReply::content("");
        }
        let index = self.reply_index.fetch_add(1, Ordering::SeqCst);
        replies
            .get(index % replies.len())
            .cloned()
            .unwrap_or_else(|| MockReply::content(""))
    }
}

#[async_trait]
impl TurnExchanger for MockExchanger {
    async fn send(&self, request: &ExchangeRequest) -> ExchangeResult<ExchangeResponse> {
        self.record(request);

        let gate = self.gate.read().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let handler = self.handler.read().clone();
        match handler {
            Some(handler) => handler(request),
            None => self.next_reply().resolve(),
        }
    }
}
