//! Persisted set of recipe ids the user removed from their pending list.

use std::collections::BTreeSet;

use serde_json::Value;

use crate::error::Result;
use crate::store::{keys, try_read_json, write_json_logged, KeyValueStore};
use crate::util::{json_id, normalize_id};

/// Sticky removal markers.
///
/// An id stays here until it is re-added or the set is cleared, so a stale
/// remote snapshot can never bring a removed recipe back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TombstoneSet {
    ids: BTreeSet<String>,
}

impl TombstoneSet {
    /// Load the set for reading only; a failed read counts as empty.
    pub async fn load<S: KeyValueStore>(store: &S) -> Self {
        Self::try_load(store).await.unwrap_or_else(|error| {
            tracing::warn!(%error, "Could not read tombstones; treating as empty");
            Self::default()
        })
    }

    /// Load the set before changing it.
    ///
    /// A failed store read is an error so the caller never saves a set
    /// rebuilt from nothing over the persisted one. An undecodable document
    /// counts as empty.
    pub async fn try_load<S: KeyValueStore>(store: &S) -> Result<Self> {
        let raw: Vec<Value> = try_read_json(store, keys::REMOVED_RECIPES)
            .await?
            .unwrap_or_default();
        Ok(raw
            .iter()
            .map(json_id)
            .filter(|id| !id.is_empty())
            .collect())
    }

    pub async fn save<S: KeyValueStore>(&self, store: &S) {
        write_json_logged(store, keys::REMOVED_RECIPES, &self.ids).await;
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(&normalize_id(id))
    }

    /// Returns `true` if the id was not already present.
    pub fn insert(&mut self, id: &str) -> bool {
        self.ids.insert(normalize_id(id))
    }

    /// Returns `true` if the id was present.
    pub fn remove(&mut self, id: &str) -> bool {
        self.ids.remove(&normalize_id(id))
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }
}

impl FromIterator<String> for TombstoneSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}
