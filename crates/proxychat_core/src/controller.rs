//! Chat controller.
//!
//! Sequences one submission at a time through two states:
//!
//! ```text
//!            submit(text), text non-empty
//!   ┌──────┐ ─────────────────────────────▶ ┌────────────┐
//!   │ Idle │                                │ Submitting │
//!   └──────┘ ◀───────────────────────────── └────────────┘
//!            exchange settled (ok or error)
//! ```
//!
//! The user turn is appended before the exchange starts. The agent turn, or an
//! error message, is recorded only after it settles. A failed exchange leaves the
//! user turn in place with no answer. Submissions arriving while `Submitting` are
//! rejected. Presentation layers observe the state through [`ChatView`] snapshots.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::config::ChatConfig;
use crate::conversation::{Conversation, Turn};
use crate::error::ExchangeError;
use crate::exchange::{ExchangeRequest, TurnExchanger};
use crate::identity::{Identifiers, IdentityStore};

/// Everything a presentation layer renders
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChatView {
    pub conversation: Conversation,
    /// True while an exchange is in flight
    pub is_loading: bool,
    /// Message of the last failed exchange, cleared by the next submission
    pub error: Option<String>,
    pub identifiers: Identifiers,
    /// Pending text of the input field
    pub input: String,
}

/// What happened to a submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Input was empty or whitespace; nothing changed.
    Skipped,
    /// Another exchange is in flight; nothing changed.
    Busy,
    /// The agent replied. `degraded` is set when the placeholder reply was used.
    Answered { degraded: bool },
    /// The exchange failed; the error slot holds the user-facing message.
    Failed(ExchangeError),
}

/// Orchestrates identity, conversation and exchange for one chat.
pub struct ChatController {
    identity: IdentityStore,
    exchanger: Arc<dyn TurnExchanger>,
    stateful: bool,
    stream: bool,
    verbose: bool,
    view: watch::Sender<ChatView>,
}

impl ChatController {
    /// Create a controller with an empty conversation.
    pub fn new(identity: IdentityStore, exchanger: Arc<dyn TurnExchanger>) -> Self {
        let identifiers = identity.identifiers();
        let (view, _) = watch::channel(ChatView {
            identifiers,
            ..ChatView::default()
        });

        Self {
            identity,
            exchanger,
            stateful: true,
            stream: false,
            verbose: false,
            view,
        }
    }

    /// Create a controller using the request flags from `config`.
    pub fn from_config(
        config: &ChatConfig,
        identity: IdentityStore,
        exchanger: Arc<dyn TurnExchanger>,
    ) -> Self {
        let mut controller = Self::new(identity, exchanger);
        controller.stateful = config.stateful;
        controller.stream = config.stream;
        controller.verbose = config.verbose;
        controller
    }

    /// Current state snapshot.
    pub fn view(&self) -> ChatView {
        self.view.borrow().clone()
    }

    /// Receiver notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<ChatView> {
        self.view.subscribe()
    }

    pub fn is_loading(&self) -> bool {
        self.view.borrow().is_loading
    }

    pub fn conversation(&self) -> Conversation {
        self.view.borrow().conversation.clone()
    }

    pub fn error(&self) -> Option<String> {
        self.view.borrow().error.clone()
    }

    pub fn identifiers(&self) -> Identifiers {
        self.view.borrow().identifiers.clone()
    }

    /// Replace the pending input text.
    pub fn set_input(&self, text: impl Into<String>) {
        let text = text.into();
        self.view.send_modify(|view| view.input = text);
    }

    /// Submit the pending input text.
    pub async fn submit_input(&self) -> SubmitOutcome {
        let text = self.view.borrow().input.clone();
        self.submit(&text).await
    }

    /// Submit a predefined prompt: set it as input and send it right away.
    pub async fn submit_prompt(&self, text: &str) -> SubmitOutcome {
        if text.trim().is_empty() {
            // Nothing to send; the prompt only lands in an idle input field.
            self.view.send_if_modified(|view| {
                if view.is_loading || view.input == text {
                    return false;
                }
                view.input = text.to_string();
                true
            });
            return SubmitOutcome::Skipped;
        }

        // An accepted submission sets and clears the input in the same step as
        // the busy check, so a rejected prompt never reaches the input field.
        self.submit(text).await
    }

    /// Submit one user turn and wait for the exchange to settle.
    pub async fn submit(&self, text: &str) -> SubmitOutcome {
        let content = text.trim();
        if content.is_empty() {
            debug!("Ignoring empty submission");
            return SubmitOutcome::Skipped;
        }

        let user_turn = Turn::user(content);
        let started = self.view.send_if_modified(|view| {
            if view.is_loading {
                return false;
            }
            view.is_loading = true;
            view.error = None;
            view.input.clear();
            view.conversation = std::mem::take(&mut view.conversation).append(user_turn.clone());
            true
        });

        if !started {
            warn!("Submission rejected: an exchange is already in flight");
            return SubmitOutcome::Busy;
        }

        let _busy = BusyGuard { view: &self.view };

        let identifiers = self.identity.identifiers();
        let known = self.view.borrow().identifiers.clone();
        if identifiers != known {
            let refreshed = identifiers.clone();
            self.view.send_modify(|view| view.identifiers = refreshed);
        }

        let request = ExchangeRequest::new(user_turn, &identifiers)
            .stateful(self.stateful)
            .stream(self.stream)
            .verbose(self.verbose);

        match self.exchanger.send(&request).await {
            Ok(response) => {
                let degraded = response.degraded;
                debug!(degraded, "Exchange settled");
                self.view.send_modify(|view| {
                    view.conversation =
                        std::mem::take(&mut view.conversation).append(response.into_turn());
                });
                SubmitOutcome::Answered { degraded }
            }
            Err(err) => {
                warn!("Exchange failed: {}", err);
                let message = err.user_message();
                self.view.send_modify(|view| view.error = Some(message));
                SubmitOutcome::Failed(err)
            }
        }
    }
}

/// Returns the controller to `Idle` on every exit path, including a dropped future.
struct BusyGuard<'a> {
    view: &'a watch::Sender<ChatView>,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.view.send_modify(|view| view.is_loading = false);
    }
}
