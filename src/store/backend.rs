//! Document database boundary
//!
//! Everything the gateway needs from the external document store:
//! listing databases, selector queries, and revision-tracked writes.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::StoreResult;
use super::selector::Selector;

/// Id and revision returned by a successful write
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteReceipt {
    pub id: String,
    pub rev: String,
}

/// Trait for the document database
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Names of every database visible to the account
    async fn list_databases(&self) -> StoreResult<Vec<String>>;

    /// All documents in `db` matching `selector`
    async fn find(&self, db: &str, selector: &Selector) -> StoreResult<Vec<Value>>;

    /// Insert a new document; the id is taken from its `_id` field
    async fn insert(&self, db: &str, document: Value) -> StoreResult<WriteReceipt>;

    /// Fetch a document, including its current `_rev`
    async fn get(&self, db: &str, id: &str) -> StoreResult<Value>;

    /// Delete the document at exactly revision `rev`
    async fn destroy(&self, db: &str, id: &str, rev: &str) -> StoreResult<WriteReceipt>;
}

/// Shared handle to any store implementation
pub type SharedStore = Arc<dyn DocumentStore>;

#[async_trait]
impl<S: DocumentStore + ?Sized> DocumentStore for Arc<S> {
    async fn list_databases(&self) -> StoreResult<Vec<String>> {
        (**self).list_databases().await
    }

    async fn find(&self, db: &str, selector: &Selector) -> StoreResult<Vec<Value>> {
        (**self).find(db, selector).await
    }

    async fn insert(&self, db: &str, document: Value) -> StoreResult<WriteReceipt> {
        (**self).insert(db, document).await
    }

    async fn get(&self, db: &str, id: &str) -> StoreResult<Value> {
        (**self).get(db, id).await
    }

    async fn destroy(&self, db: &str, id: &str, rev: &str) -> StoreResult<WriteReceipt> {
        (**self).destroy(db, id, rev).await
    }
}
