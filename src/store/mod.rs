//! Session Store - durable {account, chainId} hint
//!
//! Backends implement a tiny synchronous key-value interface. The session
//! talks to them only through [`SessionPersistence`], which swallows and logs
//! every storage failure: persistence is a convenience, never a reason for an
//! operation to fail.
//!
//! | Backend | Where |
//! |---------|-------|
//! | [`MemoryStore`] | process memory (tests, ephemeral sessions) |
//! | [`FileStore`] | JSON file under the data dir (`native`) |
//! | `LocalStorageStore` | `window.localStorage` (`wasm`) |

#[cfg(feature = "native")]
mod file;

#[cfg(feature = "native")]
pub use file::FileStore;

use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use thiserror::Error;

use crate::core::paths::keys;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

pub trait SessionStore {
    fn set(&self, key: &str, value: &str) -> StoreResult<()>;
    fn get(&self, key: &str) -> StoreResult<Option<String>>;
    fn remove(&self, key: &str) -> StoreResult<()>;
}

/// In-memory key-value store
#[derive(Clone, Default)]
pub struct MemoryStore {
    entries: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl SessionStore for MemoryStore {
    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.entries.borrow_mut().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

/// The persisted reconnect hint. Never trusted without revalidation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedSession {
    pub account: String,
    pub chain_id: String,
}

/// Fail-soft persistence of [`PersistedSession`] over any [`SessionStore`].
#[derive(Clone)]
pub struct SessionPersistence {
    store: Rc<dyn SessionStore>,
}

impl SessionPersistence {
    pub fn new(store: Rc<dyn SessionStore>) -> Self {
        Self { store }
    }

    /// `None` when nothing usable is stored or storage fails.
    pub fn load(&self) -> Option<PersistedSession> {
        let account = self.get(keys::CONNECTED_ACCOUNT)?;
        let chain_id = self.get(keys::CONNECTED_CHAIN).unwrap_or_default();
        if account.is_empty() {
            return None;
        }
        Some(PersistedSession { account, chain_id })
    }

    pub fn save(&self, session: &PersistedSession) {
        self.set(keys::CONNECTED_ACCOUNT, &session.account);
        self.set(keys::CONNECTED_CHAIN, &session.chain_id);
    }

    pub fn clear(&self) {
        for key in keys::ALL {
            if let Err(e) = self.store.remove(key) {
                tracing::warn!(key, "session store remove failed: {}", e);
            }
        }
    }

    fn get(&self, key: &str) -> Option<String> {
        match self.store.get(key) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key, "session store read failed: {}", e);
                None
            }
        }
    }

    fn set(&self, key: &str, value: &str) {
        if let Err(e) = self.store.set(key, value) {
            tracing::warn!(key, "session store write failed: {}", e);
        }
    }
}
