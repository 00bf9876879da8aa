//! Shared handler state

use std::sync::Arc;

use crate::store::{MemoryStore, Repository, SharedStore};

/// State shared across all handlers: the one outbound store handle
pub struct ApiState {
    pub repository: Repository<SharedStore>,
}

impl ApiState {
    pub fn new(store: SharedStore) -> Self {
        Self {
            repository: Repository::new(store),
        }
    }

    /// State backed by an empty in-memory store with every collection created
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::with_collections(
            &crate::store::Collection::ALL,
        )))
    }
}
