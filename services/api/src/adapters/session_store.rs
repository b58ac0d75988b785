//! services/api/src/adapters/session_store.rs
//!
//! An in-process implementation of the `SessionStore` port. The browser keeps
//! the authoritative copy in local storage; this adapter is the server-side
//! mirror the resolver reads and writes during a request.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use wordsprout_core::ports::{PortError, PortResult, SessionStore};

/// A `SessionStore` backed by a plain in-memory map.
#[derive(Default)]
pub struct MemorySessionStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> PortResult<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|e| PortError::Unexpected(format!("session store poisoned: {}", e)))
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, key: &str) -> PortResult<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> PortResult<()> {
        self.lock()?.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> PortResult<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}
