//! The user's pending ("to cook") recipe list.
//!
//! The list lives in two places: a per-user resource on the backend and a
//! local fallback copy under `pending_recipes_list`. [`PendingRecipes::list`]
//! merges them:
//!
//! - membership comes from the backend whenever it answers, and local entries
//!   the backend no longer has are pruned;
//! - completion state comes from the local copy, since the backend does not
//!   always keep it;
//! - ids in the [`TombstoneSet`] never show up, whatever either side says.
//!
//! Mutations never fail on backend errors. They fall back to the local copy
//! and report [`MutationOutcome::PendingSync`].

mod tombstones;

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::Mutex;

use crate::cache::Cache;
use crate::catalog::{required_id, Catalog};
use crate::context::Context;
use crate::error::{Error, Result};
use crate::keyed_lock::KeyedLocks;
use crate::mappers::map_pending_entry;
use crate::models::{PendingListEntry, User};
use crate::remote::ChefNetApi;
use crate::store::{keys, try_read_json, write_json_logged, KeyValueStore};

pub use tombstones::TombstoneSet;

/// Cache resource holding the last merged list.
const SNAPSHOT: &str = "pending_recipes";

/// Result of a pending-list mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOutcome {
    /// The recipe was already in the list; nothing changed
    AlreadyPresent,
    /// The backend accepted the change
    Synced,
    /// Applied locally only; the backend could not be reached
    PendingSync,
}

impl MutationOutcome {
    pub const fn is_pending_sync(self) -> bool {
        matches!(self, Self::PendingSync)
    }
}

impl fmt::Display for MutationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            Self::AlreadyPresent => "already in the list",
            Self::Synced => "saved",
            Self::PendingSync => "saved on this device; will sync when online",
        };
        f.write_str(message)
    }
}

fn dedupe(entries: Vec<PendingListEntry>) -> Vec<PendingListEntry> {
    let mut seen = HashSet::new();
    entries
        .into_iter()
        .filter(|entry| {
            let key = entry.key();
            !key.is_empty() && seen.insert(key)
        })
        .collect()
}

/// Reconciliation engine for the pending recipe list.
pub struct PendingRecipes<S, A> {
    ctx: Context<S, A>,
    catalog: Catalog<S, A>,
    cache: Cache<S>,
    /// One in-flight mutation per recipe id
    locks: Arc<KeyedLocks>,
    /// Serializes read-modify-write of the local list and tombstones
    write_lock: Arc<Mutex<()>>,
}

impl<S, A> Clone for PendingRecipes<S, A> {
    fn clone(&self) -> Self {
        Self {
            ctx: self.ctx.clone(),
            catalog: self.catalog.clone(),
            cache: self.cache.clone(),
            locks: Arc::clone(&self.locks),
            write_lock: Arc::clone(&self.write_lock),
        }
    }
}

impl<S: KeyValueStore, A: ChefNetApi> PendingRecipes<S, A> {
    pub fn new(ctx: Context<S, A>) -> Self {
        Self {
            catalog: Catalog::new(ctx.clone()),
            cache: ctx.cache(),
            ctx,
            locks: Arc::new(KeyedLocks::new()),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Merged view of the pending list.
    pub async fn list(&self) -> Vec<PendingListEntry> {
        let _guard = self.write_lock.lock().await;
        let entries = self.reconcile(true).await;
        self.cache.put_as(SNAPSHOT, &entries).await;
        entries
    }

    /// Last merged list, if still fresh. Never touches the backend.
    ///
    /// Recipes removed after the snapshot was taken are left out.
    pub async fn snapshot(&self) -> Option<Vec<PendingListEntry>> {
        let mut entries: Vec<PendingListEntry> = self.cache.get_as(SNAPSHOT).await?;
        let tombstones = TombstoneSet::load(self.ctx.store.as_ref()).await;
        entries.retain(|entry| !tombstones.contains(&entry.key()));
        Some(entries)
    }

    /// Add a recipe to the list.
    ///
    /// Fails only when the recipe cannot be resolved.
    pub async fn add(&self, recipe_id: &str) -> Result<MutationOutcome> {
        let id = required_id(recipe_id, "recipe")?;
        let _slot = self.locks.lock(&id).await;

        let present = {
            let _guard = self.write_lock.lock().await;
            self.reconcile(false)
                .await
                .iter()
                .any(|entry| entry.key() == id)
        };
        if present {
            tracing::debug!(recipe_id = %id, "Recipe already pending");
            return Ok(MutationOutcome::AlreadyPresent);
        }

        {
            let _guard = self.write_lock.lock().await;
            let store = self.ctx.store.as_ref();
            match TombstoneSet::try_load(store).await {
                Ok(mut tombstones) => {
                    if tombstones.remove(&id) {
                        tracing::debug!(recipe_id = %id, "Clearing tombstone for re-added recipe");
                        tombstones.save(store).await;
                    }
                }
                Err(error) => {
                    tracing::warn!(recipe_id = %id, %error, "Could not read tombstones; leaving them unchanged");
                }
            }
        }

        let recipe = self
            .catalog
            .recipe(&id)
            .await?
            .ok_or_else(|| Error::RecipeNotFound(id.clone()))?;

        if let Some(user) = self.remote_user().await {
            match self.ctx.api.add_pending(&user.id, &id).await {
                Ok(()) => {
                    self.cache.invalidate(SNAPSHOT).await;
                    tracing::info!(recipe_id = %id, "Added recipe to pending list");
                    return Ok(MutationOutcome::Synced);
                }
                Err(error) => {
                    tracing::warn!(recipe_id = %id, %error, "Backend add failed; keeping a local copy");
                }
            }
        }

        {
            let _guard = self.write_lock.lock().await;
            match self.try_load_local().await {
                Ok(mut local) => {
                    let entry = PendingListEntry::new(recipe, self.ctx.clock.now());
                    match local.iter_mut().find(|existing| existing.key() == id) {
                        Some(existing) => *existing = entry,
                        None => local.push(entry),
                    }
                    self.save_local(&local).await;
                }
                Err(error) => {
                    tracing::warn!(recipe_id = %id, %error, "Could not read local pending list; copy not saved");
                }
            }
            self.cache.invalidate(SNAPSHOT).await;
        }

        tracing::info!(recipe_id = %id, "Added recipe to local pending list");
        Ok(MutationOutcome::PendingSync)
    }

    /// Remove a recipe and tombstone it so it cannot reappear.
    pub async fn remove(&self, recipe_id: &str) -> Result<MutationOutcome> {
        let id = required_id(recipe_id, "recipe")?;
        let _slot = self.locks.lock(&id).await;

        let synced = match self.remote_user().await {
            Some(user) => match self.ctx.api.remove_pending(&user.id, &id).await {
                Ok(()) => true,
                Err(error) => {
                    tracing::warn!(recipe_id = %id, %error, "Backend removal failed; removing locally");
                    false
                }
            },
            None => false,
        };

        {
            let _guard = self.write_lock.lock().await;
            let store = self.ctx.store.as_ref();

            match self.try_load_local().await {
                Ok(mut local) => {
                    let before = local.len();
                    local.retain(|entry| entry.key() != id);
                    if local.len() != before {
                        self.save_local(&local).await;
                    }
                }
                Err(error) => {
                    tracing::warn!(recipe_id = %id, %error, "Could not read local pending list; leaving it unchanged");
                }
            }

            match TombstoneSet::try_load(store).await {
                Ok(mut tombstones) => {
                    if tombstones.insert(&id) {
                        tombstones.save(store).await;
                    }
                }
                Err(error) => {
                    tracing::warn!(recipe_id = %id, %error, "Could not read tombstones; removal not recorded");
                }
            }
            self.cache.invalidate(SNAPSHOT).await;
        }

        tracing::info!(recipe_id = %id, synced, "Removed recipe from pending list");
        Ok(if synced {
            MutationOutcome::Synced
        } else {
            MutationOutcome::PendingSync
        })
    }

    /// Mark a recipe as cooked (or not).
    ///
    /// The local copy is always updated, since the backend may accept the
    /// call without storing the flag.
    pub async fn toggle_completed(
        &self,
        recipe_id: &str,
        completed: bool,
    ) -> Result<MutationOutcome> {
        let id = required_id(recipe_id, "recipe")?;
        let _slot = self.locks.lock(&id).await;

        let synced = match self.remote_user().await {
            Some(user) => match self
                .ctx
                .api
                .set_pending_completed(&user.id, &id, completed)
                .await
            {
                Ok(()) => true,
                Err(error) => {
                    tracing::warn!(recipe_id = %id, %error, "Backend status update failed");
                    false
                }
            },
            None => false,
        };

        // Entries are only created for recipes known not to be tombstoned.
        let has_local = self
            .try_load_local()
            .await
            .is_ok_and(|local| local.iter().any(|entry| entry.key() == id));
        let tombstoned = TombstoneSet::try_load(self.ctx.store.as_ref())
            .await
            .map_or(true, |tombstones| tombstones.contains(&id));
        let recipe = if has_local || tombstoned {
            None
        } else {
            self.catalog.recipe(&id).await.ok().flatten()
        };

        {
            let _guard = self.write_lock.lock().await;
            let now = self.ctx.clock.now();

            match self.try_load_local().await {
                Ok(mut local) => {
                    if let Some(entry) = local.iter_mut().find(|entry| entry.key() == id) {
                        entry.set_completed(completed, now);
                        self.save_local(&local).await;
                    } else if let Some(recipe) = recipe {
                        let mut entry = PendingListEntry {
                            recipe,
                            ..PendingListEntry::default()
                        };
                        entry.set_completed(completed, now);
                        local.push(entry);
                        self.save_local(&local).await;
                    } else {
                        tracing::debug!(recipe_id = %id, "No local entry to update");
                    }
                }
                Err(error) => {
                    tracing::warn!(recipe_id = %id, %error, "Could not read local pending list; completion not saved");
                }
            }
            self.cache.invalidate(SNAPSHOT).await;
        }

        Ok(if synced {
            MutationOutcome::Synced
        } else {
            MutationOutcome::PendingSync
        })
    }

    /// Current tombstones, sorted.
    pub async fn tombstones(&self) -> Vec<String> {
        TombstoneSet::load(self.ctx.store.as_ref())
            .await
            .iter()
            .map(str::to_string)
            .collect()
    }

    /// Forget every tombstone. Returns how many were cleared.
    pub async fn clear_tombstones(&self) -> usize {
        let _guard = self.write_lock.lock().await;
        let store = self.ctx.store.as_ref();
        let cleared = TombstoneSet::load(store).await.len();

        if let Err(error) = store.remove(keys::REMOVED_RECIPES).await {
            tracing::warn!(%error, "Failed to clear tombstones");
            return 0;
        }
        self.cache.invalidate(SNAPSHOT).await;
        tracing::info!(cleared, "Cleared pending list tombstones");
        cleared
    }

    /// Signed-in user, when the backend may be used.
    async fn remote_user(&self) -> Option<User> {
        if !self.ctx.backend_enabled() {
            return None;
        }
        self.ctx.current_user().await
    }

    /// Merge the remote and local lists. With `prune`, local entries the
    /// backend no longer has are deleted from the store.
    ///
    /// Callers hold `write_lock`.
    async fn reconcile(&self, prune: bool) -> Vec<PendingListEntry> {
        let store = self.ctx.store.as_ref();

        let (stored, stored_len) = match self.try_load_local().await {
            Ok(stored) => {
                let len = stored.len();
                (stored, Some(len))
            }
            Err(error) => {
                tracing::warn!(%error, "Could not read local pending list");
                (Vec::new(), None)
            }
        };

        // Removed recipes never live in the local list, so it is the safe
        // view while the tombstones cannot be read.
        let tombstones = match TombstoneSet::try_load(store).await {
            Ok(tombstones) => tombstones,
            Err(error) => {
                tracing::warn!(%error, "Could not read tombstones; using local pending list");
                return dedupe(stored);
            }
        };

        let local = dedupe(
            stored
                .into_iter()
                .filter(|entry| !tombstones.contains(&entry.key()))
                .collect(),
        );

        let Some(remote) = self.fetch_remote(&tombstones).await else {
            tracing::debug!(entries = local.len(), "Using local pending list");
            return local;
        };

        let remote_ids: HashSet<String> = remote.iter().map(PendingListEntry::key).collect();
        let kept: Vec<PendingListEntry> = local
            .into_iter()
            .filter(|entry| remote_ids.contains(&entry.key()))
            .collect();
        if prune && stored_len.is_some_and(|len| len != kept.len()) {
            tracing::debug!(
                kept = kept.len(),
                "Pruning local pending entries the backend no longer has"
            );
            self.save_local(&kept).await;
        }

        let overlays: HashMap<String, &PendingListEntry> =
            kept.iter().map(|entry| (entry.key(), entry)).collect();
        remote
            .into_iter()
            .map(|mut entry| {
                if let Some(local) = overlays.get(&entry.key()) {
                    entry.overlay_local(local);
                }
                entry
            })
            .collect()
    }

    /// Remote list without tombstoned entries; `None` when the backend
    /// cannot be used.
    async fn fetch_remote(&self, tombstones: &TombstoneSet) -> Option<Vec<PendingListEntry>> {
        let user = self.remote_user().await?;
        match self.ctx.api.pending_list(&user.id).await {
            Ok(raw) => Some(dedupe(
                raw.iter()
                    .map(map_pending_entry)
                    .filter(|entry| !tombstones.contains(&entry.key()))
                    .collect(),
            )),
            Err(error) => {
                tracing::warn!(%error, "Could not fetch pending list; using local copy");
                None
            }
        }
    }

    /// Local fallback list with normalized ids. Undecodable entries are
    /// skipped; a failed store read is an error.
    async fn try_load_local(&self) -> Result<Vec<PendingListEntry>> {
        let raw: Vec<Value> = try_read_json(self.ctx.store.as_ref(), keys::PENDING_RECIPES)
            .await?
            .unwrap_or_default();

        Ok(raw
            .into_iter()
            .filter_map(|value| match serde_json::from_value::<PendingListEntry>(value) {
                Ok(mut entry) => {
                    entry.recipe.id = entry.key();
                    Some(entry)
                }
                Err(error) => {
                    tracing::warn!(%error, "Skipping undecodable local pending entry");
                    None
                }
            })
            .collect())
    }

    async fn save_local(&self, entries: &[PendingListEntry]) {
        write_json_logged(self.ctx.store.as_ref(), keys::PENDING_RECIPES, entries).await;
    }
}
