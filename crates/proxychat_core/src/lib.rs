//! # proxychat_core - Conversation session protocol for proxychat
//!
//! This crate provides the client side of a proxied agent chat:
//! - Per-session and per-installation identifiers for the backend
//! - An append-only conversation of user/agent turns
//! - A single-shot turn exchange against the proxy endpoint
//! - A controller that sequences submissions and exposes observable state
//!
//! ## Key Features
//!
//! - **Injected Storage**: identifier stores are traits, with in-memory and file backends
//! - **Optimistic Turns**: the user turn is visible before the exchange settles
//! - **Degrade, Don't Fail**: missing reply content becomes a placeholder reply
//! - **Observable State**: presentation layers subscribe to `ChatView` snapshots
//! - **Mock Exchanger**: for testing without a backend
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌─────────────────┐     ┌─────────────────┐
//! │  Presentation   │────▶│ ChatController  │────▶│  TurnExchanger  │──▶ POST /api/proxy
//! └────────▲────────┘     └───┬─────────┬───┘     └─────────────────┘
//!          │                  │         │
//!          │ ChatView         ▼         ▼
//!          │          ┌─────────────┐ ┌──────────────┐
//!          └──────────│Conversation │ │IdentityStore │
//!                     └─────────────┘ └──────────────┘
//! ```

pub mod config;
pub mod controller;
pub mod conversation;
pub mod error;
pub mod exchange;
pub mod identity;
pub mod mock;

pub use config::ChatConfig;
pub use controller::{ChatController, ChatView, SubmitOutcome};
pub use conversation::{Conversation, Role, Turn};
pub use error::{
    ConfigError, ConfigResult, ExchangeError, ExchangeResult, StorageError, StorageResult,
};
pub use exchange::{
    ExchangeRequest, ExchangeResponse, HttpExchanger, TurnExchanger, NO_REPLY_PLACEHOLDER,
};
pub use identity::{
    generate_identifier, is_valid_identifier, FileStore, Identifier, Identifiers, IdentityStore,
    KeyValueStore, MemoryStore, UnavailableStore, MAX_IDENTIFIER_LEN,
};
pub use mock::{CapturedRequest, MockExchanger, MockReply};
