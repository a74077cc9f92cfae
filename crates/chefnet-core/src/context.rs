//! Shared dependencies handed to every service.

use std::sync::Arc;

use crate::cache::Cache;
use crate::clock::{Clock, SystemClock};
use crate::config::ClientConfig;
use crate::models::User;
use crate::store::{keys, read_json, write_json, KeyValueStore};
use crate::Result;

/// Configuration, storage, backend client and clock for one app instance.
///
/// Services take a `Context` at construction instead of reaching for global
/// state, so independent instances (and tests) never share anything they
/// were not given.
pub struct Context<S, A> {
    pub config: Arc<ClientConfig>,
    pub store: Arc<S>,
    pub api: Arc<A>,
    pub clock: Arc<dyn Clock>,
}

impl<S, A> Clone for Context<S, A> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            store: Arc::clone(&self.store),
            api: Arc::clone(&self.api),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<S: KeyValueStore, A> Context<S, A> {
    pub fn new(config: ClientConfig, store: S, api: A) -> Self {
        Self {
            config: Arc::new(config),
            store: Arc::new(store),
            api: Arc::new(api),
            clock: Arc::new(SystemClock),
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Whether backend calls should be attempted.
    pub fn backend_enabled(&self) -> bool {
        self.config.use_backend
    }

    /// Cache over this context's store with the configured TTL.
    pub fn cache(&self) -> Cache<S> {
        Cache::new(
            Arc::clone(&self.store),
            Arc::clone(&self.clock),
            self.config.cache_ttl,
        )
    }

    /// Signed-in user, if any.
    pub async fn current_user(&self) -> Option<User> {
        read_json(self.store.as_ref(), keys::USER_DATA).await
    }

    /// Persist the signed-in user.
    pub async fn sign_in(&self, user: &User) -> Result<()> {
        write_json(self.store.as_ref(), keys::USER_DATA, user).await
    }

    /// Forget the signed-in user.
    pub async fn sign_out(&self) -> Result<()> {
        self.store.remove(keys::USER_DATA).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::OfflineApi;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn sign_in_and_out() {
        let ctx = Context::new(ClientConfig::offline(), MemoryStore::new(), OfflineApi);
        assert!(ctx.current_user().await.is_none());

        let user = User {
            id: "3".to_string(),
            username: "ana".to_string(),
            ..User::default()
        };
        ctx.sign_in(&user).await.unwrap();
        assert_eq!(ctx.current_user().await, Some(user));

        ctx.sign_out().await.unwrap();
        assert!(ctx.current_user().await.is_none());
    }

    #[tokio::test]
    async fn contexts_are_independent() {
        let first = Context::new(ClientConfig::offline(), MemoryStore::new(), OfflineApi);
        let second = Context::new(ClientConfig::default(), MemoryStore::new(), OfflineApi);

        first
            .sign_in(&User {
                id: "1".to_string(),
                ..User::default()
            })
            .await
            .unwrap();

        assert!(second.current_user().await.is_none());
        assert!(!first.backend_enabled());
        assert!(second.backend_enabled());
    }
}
