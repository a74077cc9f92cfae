//! In-memory key-value store

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use tokio::sync::RwLock;

use super::KeyValueStore;
use crate::error::{Error, Result};

/// Volatile store, primarily for tests and `--ephemeral` runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
    failing: AtomicBool,
    /// Remaining injected read failures per key
    read_failures: Mutex<HashMap<String, usize>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent operation fail until reset.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Make the next `times` reads of `key` fail. Writes are unaffected.
    pub fn fail_reads(&self, key: &str, times: usize) {
        self.read_failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), times);
    }

    /// Raw snapshot of a key, bypassing failure injection.
    pub async fn peek(&self, key: &str) -> Option<String> {
        self.entries.read().await.get(key).cloned()
    }

    fn check(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(Error::Store("memory store is unavailable".to_string()))
        } else {
            Ok(())
        }
    }

    fn check_read(&self, key: &str) -> Result<()> {
        self.check()?;
        let mut failures = self
            .read_failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        match failures.get_mut(key) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                Err(Error::Store(format!("read of {key} failed")))
            }
            _ => Ok(()),
        }
    }
}

impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.check_read(key)?;
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.check()?;
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.check()?;
        self.entries.write().await.remove(key);
        Ok(())
    }
}
