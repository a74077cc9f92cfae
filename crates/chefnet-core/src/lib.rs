//! chefnet-core - Core library for ChefNet
//!
//! This crate contains the offline-capable data layer used by ChefNet
//! front ends: backend DTO mappers, the local key-value store, the TTL cache,
//! the pending recipe list reconciliation and the attendance queue.

pub mod attendance;
pub mod cache;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod context;
pub mod error;
pub mod keyed_lock;
pub mod mappers;
pub mod models;
pub mod pending;
pub mod remote;
pub mod store;
pub mod util;

#[cfg(test)]
pub(crate) mod testing;

pub use attendance::{AttendanceOutcome, AttendanceRecorder, SyncReport};
pub use catalog::Catalog;
pub use config::ClientConfig;
pub use context::Context;
pub use error::{Error, Result};
pub use models::{AttendanceRecord, Course, PendingListEntry, Recipe, User};
pub use pending::{MutationOutcome, PendingRecipes, TombstoneSet};
pub use remote::{ChefNetApi, HttpApi, OfflineApi, RemoteError, RemoteErrorKind};
pub use store::{KeyValueStore, LibSqlStore, MemoryStore};
