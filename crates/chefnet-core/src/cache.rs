//! Time-boxed read-through cache over the key-value store.
//!
//! Each resource is stored under `cache_<resource>` as
//! `{ "data": ..., "timestamp": <unix ms> }`. An entry is fresh while
//! `now - timestamp < ttl`. The cache fails open: storage errors and
//! undecodable envelopes read as misses and writes never fail the caller.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::clock::Clock;
use crate::store::{keys, read_json, write_json, KeyValueStore};

#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    data: Value,
    timestamp: i64,
}

/// Cache handle; cheap to clone.
pub struct Cache<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    ttl_millis: i64,
}

impl<S> Clone for Cache<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            clock: Arc::clone(&self.clock),
            ttl_millis: self.ttl_millis,
        }
    }
}

impl<S: KeyValueStore> Cache<S> {
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            store,
            clock,
            ttl_millis: i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX),
        }
    }

    /// Fresh cached value for `resource`, if any.
    pub async fn get(&self, resource: &str) -> Option<Value> {
        let key = keys::cache(resource);
        let entry: CacheEntry = read_json(self.store.as_ref(), &key).await?;
        let age = self.clock.now_millis().saturating_sub(entry.timestamp);

        if age < self.ttl_millis {
            tracing::debug!(resource, age_ms = age, "Cache hit");
            Some(entry.data)
        } else {
            tracing::debug!(resource, age_ms = age, "Cache entry expired");
            None
        }
    }

    /// Cached value for `resource` regardless of age.
    ///
    /// Used as the last resort when the backend cannot be reached.
    pub async fn get_stale(&self, resource: &str) -> Option<Value> {
        let entry: CacheEntry = read_json(self.store.as_ref(), &keys::cache(resource)).await?;
        tracing::debug!(resource, "Serving stale cache entry");
        Some(entry.data)
    }

    /// Typed variant of [`Cache::get_stale`].
    pub async fn get_stale_as<T: DeserializeOwned>(&self, resource: &str) -> Option<T> {
        let data = self.get_stale(resource).await?;
        serde_json::from_value(data).ok()
    }

    /// Store `data` for `resource`, stamped with the current time.
    pub async fn put(&self, resource: &str, data: Value) {
        let entry = CacheEntry {
            data,
            timestamp: self.clock.now_millis(),
        };
        if let Err(error) = write_json(self.store.as_ref(), &keys::cache(resource), &entry).await {
            tracing::warn!(resource, %error, "Failed to write cache entry");
        }
    }

    /// Typed variant of [`Cache::get`]; a payload of the wrong shape is a miss.
    pub async fn get_as<T: DeserializeOwned>(&self, resource: &str) -> Option<T> {
        let data = self.get(resource).await?;
        serde_json::from_value(data)
            .inspect_err(|error| tracing::debug!(resource, %error, "Cached payload has wrong shape"))
            .ok()
    }

    /// Typed variant of [`Cache::put`].
    pub async fn put_as<T: Serialize>(&self, resource: &str, data: &T) {
        match serde_json::to_value(data) {
            Ok(value) => self.put(resource, value).await,
            Err(error) => tracing::warn!(resource, %error, "Failed to encode cache entry"),
        }
    }

    /// Drop the cached value for `resource`.
    pub async fn invalidate(&self, resource: &str) {
        if let Err(error) = self.store.remove(&keys::cache(resource)).await {
            tracing::warn!(resource, %error, "Failed to invalidate cache entry");
        }
    }
}
