//! Client identity.
//!
//! Two identifiers travel with every exchange:
//! - `session_id` lives in session-scoped storage and dies with the process
//! - `user_id` lives in persistent storage and survives restarts until cleared
//!
//! Both are opaque alphanumeric tokens of at most [`MAX_IDENTIFIER_LEN`] characters.
//! A stored value that is missing, too long or malformed is replaced by a fresh one.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{StorageError, StorageResult};

/// Opaque client identifier
pub type Identifier = String;

/// Maximum length of a stored identifier.
pub const MAX_IDENTIFIER_LEN: usize = 32;

/// Key of the session identifier in the session store.
pub const SESSION_ID_KEY: &str = "session_id";

/// Key of the user identifier in the persistent store.
pub const USER_ID_KEY: &str = "user_id";

/// File name of the persistent store inside the state directory.
pub const IDENTITY_FILE: &str = "identity.json";

/// Generate a fresh identifier: a v4 UUID without separators, capped at 32 characters.
pub fn generate_identifier() -> Identifier {
    uuid::Uuid::new_v4()
        .to_string()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(MAX_IDENTIFIER_LEN)
        .collect()
}

/// Whether a stored value can be reused as an identifier.
pub fn is_valid_identifier(value: &str) -> bool {
    !value.is_empty()
        && value.len() <= MAX_IDENTIFIER_LEN
        && value.chars().all(|c| c.is_ascii_alphanumeric())
}

/// String key/value storage backing an identifier scope.
#[cfg_attr(test, mockall::automock)]
pub trait KeyValueStore: Send + Sync {
    /// Read a value; `Ok(None)` when the key was never set.
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Write a value, replacing any previous one.
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Remove a value. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> StorageResult<()>;
}

/// In-process store. Used for the session scope and as a test fake.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a value, e.g. to simulate what a previous run left behind.
    pub fn with_value(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.write().insert(key.into(), value.into());
        self
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.values.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.values.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        self.values.write().remove(key);
        Ok(())
    }
}

/// Persistent store: a flat JSON object in a single file.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Store at `<state_dir>/identity.json`.
    pub fn in_dir(state_dir: impl AsRef<Path>) -> Self {
        Self::new(state_dir.as_ref().join(IDENTITY_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> StorageResult<HashMap<String, String>> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }
        let content = fs::read_to_string(&self.path)?;
        serde_json::from_str(&content).map_err(|e| StorageError::Corrupt {
            path: self.path.clone(),
            message: e.to_string(),
        })
    }

    // A corrupt file is overwritten rather than blocking writes forever.
    fn load_for_write(&self) -> StorageResult<HashMap<String, String>> {
        match self.load() {
            Err(StorageError::Corrupt { path, message }) => {
                warn!("Replacing corrupt identity store {:?}: {}", path, message);
                Ok(HashMap::new())
            }
            other => other,
        }
    }

    fn save(&self, values: &HashMap<String, String>) -> StorageResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(values)?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.load()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut values = self.load_for_write()?;
        values.insert(key.to_string(), value.to_string());
        self.save(&values)
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        let mut values = self.load_for_write()?;
        if values.remove(key).is_some() {
            self.save(&values)?;
        }
        Ok(())
    }
}

/// Store for contexts without any storage. Every access fails with `Unavailable`.
#[derive(Debug, Clone)]
pub struct UnavailableStore {
    reason: String,
}

impl UnavailableStore {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl KeyValueStore for UnavailableStore {
    fn get(&self, _key: &str) -> StorageResult<Option<String>> {
        Err(StorageError::Unavailable(self.reason.clone()))
    }

    fn set(&self, _key: &str, _value: &str) -> StorageResult<()> {
        Err(StorageError::Unavailable(self.reason.clone()))
    }

    fn remove(&self, _key: &str) -> StorageResult<()> {
        Err(StorageError::Unavailable(self.reason.clone()))
    }
}

/// The identifier pair sent with each exchange.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identifiers {
    pub session_id: Identifier,
    pub user_id: Identifier,
}

/// Derives and persists the session and user identifiers.
#[derive(Clone)]
pub struct IdentityStore {
    session: Arc<dyn KeyValueStore>,
    persistent: Arc<dyn KeyValueStore>,
}

impl IdentityStore {
    /// Create an identity store over explicit backends.
    pub fn new(session: Arc<dyn KeyValueStore>, persistent: Arc<dyn KeyValueStore>) -> Self {
        Self {
            session,
            persistent,
        }
    }

    /// Both scopes in memory. Nothing survives the process.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()), Arc::new(MemoryStore::new()))
    }

    /// In-memory session scope, user scope persisted under `state_dir`.
    pub fn with_state_dir(state_dir: impl AsRef<Path>) -> Self {
        Self::new(
            Arc::new(MemoryStore::new()),
            Arc::new(FileStore::in_dir(state_dir)),
        )
    }

    /// Session identifier, generated on first use. Empty when storage is unavailable.
    pub fn session_id(&self) -> Identifier {
        resolve(self.session.as_ref(), SESSION_ID_KEY)
    }

    /// User identifier, generated on first use. Empty when storage is unavailable.
    pub fn user_id(&self) -> Identifier {
        resolve(self.persistent.as_ref(), USER_ID_KEY)
    }

    pub fn identifiers(&self) -> Identifiers {
        Identifiers {
            session_id: self.session_id(),
            user_id: self.user_id(),
        }
    }

    /// Forget the persisted user identifier; the next read generates a new one.
    pub fn clear_user_id(&self) -> StorageResult<()> {
        self.persistent.remove(USER_ID_KEY)
    }
}

fn resolve(store: &dyn KeyValueStore, key: &str) -> Identifier {
    let stored = match store.get(key) {
        Ok(value) => value,
        Err(StorageError::Unavailable(reason)) => {
            debug!(key, "Identifier storage unavailable: {}", reason);
            return Identifier::new();
        }
        Err(e) => {
            warn!(key, "Discarding unreadable identifier: {}", e);
            None
        }
    };

    if let Some(value) = stored {
        if is_valid_identifier(&value) {
            return value;
        }
        debug!(key, "Stored identifier is invalid, regenerating");
    }

    let fresh = generate_identifier();
    match store.set(key, &fresh) {
        Ok(()) => {
            info!(key, "Generated new identifier");
            fresh
        }
        Err(e) => {
            warn!(key, "Could not persist identifier: {}", e);
            Identifier::new()
        }
    }
}
