//! On-device key-value storage.
//!
//! Everything the data layer persists lives under a handful of string keys as
//! JSON documents. [`KeyValueStore`] is the storage seam; [`LibSqlStore`] is
//! the persistent implementation and [`MemoryStore`] backs tests.

mod memory;
mod migrations;
mod sqlite;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;

pub use memory::MemoryStore;
pub use sqlite::LibSqlStore;

/// Keys used by the data layer.
pub mod keys {
    /// Local fallback copy of the pending recipe list
    pub const PENDING_RECIPES: &str = "pending_recipes_list";
    /// Tombstone set of recipe ids removed from the pending list
    pub const REMOVED_RECIPES: &str = "permanently_removed_recipes";
    /// Signed-in user profile
    pub const USER_DATA: &str = "user_data";
    /// Offline attendance queue
    pub const PENDING_ATTENDANCE: &str = "pending_attendance";
    /// Prefix of cache envelopes
    pub const CACHE_PREFIX: &str = "cache_";

    /// Storage key of a cached resource.
    pub fn cache(resource: &str) -> String {
        format!("{CACHE_PREFIX}{resource}")
    }
}

/// Async string-keyed persistent store
#[allow(async_fn_in_trait)]
pub trait KeyValueStore {
    /// Read a value; `Ok(None)` when the key is absent
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Insert or replace a value
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete a value; deleting a missing key is not an error
    async fn remove(&self, key: &str) -> Result<()>;
}

/// Read and decode a JSON document, failing open.
///
/// Missing keys, store failures and undecodable payloads all yield `None`;
/// the latter two are logged.
pub async fn read_json<S, T>(store: &S, key: &str) -> Option<T>
where
    S: KeyValueStore,
    T: DeserializeOwned,
{
    match try_read_json(store, key).await {
        Ok(value) => value,
        Err(error) => {
            tracing::warn!(key, %error, "Local store read failed; treating as empty");
            None
        }
    }
}

/// Read and decode a JSON document ahead of a read-modify-write.
///
/// Store failures are returned so the caller can skip its write. Missing
/// keys and undecodable payloads yield `Ok(None)`.
pub async fn try_read_json<S, T>(store: &S, key: &str) -> Result<Option<T>>
where
    S: KeyValueStore,
    T: DeserializeOwned,
{
    let Some(raw) = store.get(key).await? else {
        return Ok(None);
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Ok(Some(value)),
        Err(error) => {
            tracing::warn!(key, %error, "Discarding undecodable local value");
            Ok(None)
        }
    }
}

/// Encode and write a JSON document.
pub async fn write_json<S, T>(store: &S, key: &str, value: &T) -> Result<()>
where
    S: KeyValueStore,
    T: Serialize + ?Sized,
{
    let raw = serde_json::to_string(value)?;
    store.set(key, &raw).await
}

/// Like [`write_json`], but logs instead of returning failures.
pub async fn write_json_logged<S, T>(store: &S, key: &str, value: &T)
where
    S: KeyValueStore,
    T: Serialize + ?Sized,
{
    if let Err(error) = write_json(store, key, value).await {
        tracing::warn!(key, %error, "Local store write failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_key_is_prefixed() {
        assert_eq!(keys::cache("recipes"), "cache_recipes");
    }

    #[tokio::test]
    async fn read_json_fails_open_on_garbage() {
        let store = MemoryStore::new();
        store.set("broken", "{not json").await.unwrap();
        let value: Option<Vec<String>> = read_json(&store, "broken").await;
        assert!(value.is_none());
    }

    #[tokio::test]
    async fn read_json_fails_open_on_store_error() {
        let store = MemoryStore::new();
        write_json(&store, "ids", &vec!["1"]).await.unwrap();
        store.set_failing(true);
        let value: Option<Vec<String>> = read_json(&store, "ids").await;
        assert!(value.is_none());
    }

    #[tokio::test]
    async fn try_read_json_reports_store_errors() {
        let store = MemoryStore::new();
        write_json(&store, "ids", &vec!["1"]).await.unwrap();
        store.set("broken", "{not json").await.unwrap();
        store.fail_reads("ids", 1);

        let failed: Result<Option<Vec<String>>> = try_read_json(&store, "ids").await;
        assert!(failed.is_err());
        let garbage: Option<Vec<String>> = try_read_json(&store, "broken").await.unwrap();
        assert!(garbage.is_none());
        let missing: Option<Vec<String>> = try_read_json(&store, "missing").await.unwrap();
        assert!(missing.is_none());
        let value: Option<Vec<String>> = try_read_json(&store, "ids").await.unwrap();
        assert_eq!(value, Some(vec!["1".to_string()]));
    }

    #[tokio::test]
    async fn write_then_read_json() {
        let store = MemoryStore::new();
        write_json(&store, "ids", &vec!["1", "2"]).await.unwrap();
        let value: Option<Vec<String>> = read_json(&store, "ids").await;
        assert_eq!(value, Some(vec!["1".to_string(), "2".to_string()]));
    }
}
