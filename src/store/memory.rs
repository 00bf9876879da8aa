//! In-process document store
//!
//! Mirrors the database's observable behaviour closely enough for tests and
//! local development: revision tokens, `not_found` and `conflict` errors,
//! and selector evaluation. Nothing is persisted.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use super::backend::{DocumentStore, WriteReceipt};
use super::collection::Collection;
use super::errors::{StoreError, StoreResult};
use super::selector::Selector;

type Database = HashMap<String, Value>;

/// In-memory implementation of [`DocumentStore`]
pub struct MemoryStore {
    databases: RwLock<HashMap<String, Database>>,
    unreachable: AtomicBool,
    requests: AtomicUsize,
}

impl MemoryStore {
    /// Create a store with no databases
    pub fn new() -> Self {
        Self {
            databases: RwLock::new(HashMap::new()),
            unreachable: AtomicBool::new(false),
            requests: AtomicUsize::new(0),
        }
    }

    /// Create a store with an empty database per collection
    pub fn with_collections(collections: &[Collection]) -> Self {
        let store = Self::new();
        for collection in collections {
            store.create_database(collection.db_name());
        }
        store
    }

    /// Create an empty database if it does not exist yet
    pub fn create_database(&self, name: &str) {
        if let Ok(mut databases) = self.databases.write() {
            databases.entry(name.to_string()).or_default();
        }
    }

    /// Simulate losing the connection to the database
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    /// Number of requests that reached the store
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    /// Number of documents currently stored in `db`
    pub fn document_count(&self, db: &str) -> usize {
        self.databases
            .read()
            .map(|d| d.get(db).map(|docs| docs.len()).unwrap_or(0))
            .unwrap_or(0)
    }

    fn begin_request(&self) -> StoreResult<()> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(StoreError::Transport("connection refused".to_string()));
        }
        Ok(())
    }

    fn next_rev(previous: Option<&str>) -> String {
        let generation = previous
            .and_then(|rev| rev.split('-').next())
            .and_then(|n| n.parse::<u64>().ok())
            .unwrap_or(0);
        format!("{}-{}", generation + 1, Uuid::new_v4().simple())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned<E>(_: E) -> StoreError {
    StoreError::Transport("memory store lock poisoned".to_string())
}

fn missing_database() -> StoreError {
    StoreError::not_found("Database does not exist.")
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn list_databases(&self) -> StoreResult<Vec<String>> {
        self.begin_request()?;
        let databases = self.databases.read().map_err(poisoned)?;
        let mut names: Vec<String> = databases.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn find(&self, db: &str, selector: &Selector) -> StoreResult<Vec<Value>> {
        self.begin_request()?;
        let databases = self.databases.read().map_err(poisoned)?;
        let docs = databases.get(db).ok_or_else(missing_database)?;

        let mut matches: Vec<(&String, &Value)> = docs
            .iter()
            .filter(|(_, doc)| selector.matches(doc))
            .collect();
        matches.sort_by(|a, b| a.0.cmp(b.0));

        Ok(matches.into_iter().map(|(_, doc)| doc.clone()).collect())
    }

    async fn insert(&self, db: &str, mut document: Value) -> StoreResult<WriteReceipt> {
        self.begin_request()?;
        let mut databases = self.databases.write().map_err(poisoned)?;
        let docs = databases.get_mut(db).ok_or_else(missing_database)?;

        let id = document
            .get("_id")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .unwrap_or_else(|| Uuid::new_v4().simple().to_string());

        if docs.contains_key(&id) {
            return Err(StoreError::conflict());
        }

        let rev = Self::next_rev(None);
        let Some(obj) = document.as_object_mut() else {
            return Err(StoreError::database(400, "bad_request", "Document must be a JSON object"));
        };
        obj.insert("_id".to_string(), Value::String(id.clone()));
        obj.insert("_rev".to_string(), Value::String(rev.clone()));

        docs.insert(id.clone(), document);
        Ok(WriteReceipt { id, rev })
    }

    async fn get(&self, db: &str, id: &str) -> StoreResult<Value> {
        self.begin_request()?;
        let databases = self.databases.read().map_err(poisoned)?;
        databases
            .get(db)
            .ok_or_else(missing_database)?
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("missing"))
    }

    async fn destroy(&self, db: &str, id: &str, rev: &str) -> StoreResult<WriteReceipt> {
        self.begin_request()?;
        let mut databases = self.databases.write().map_err(poisoned)?;
        let docs = databases.get_mut(db).ok_or_else(missing_database)?;

        let current = docs
            .get(id)
            .and_then(|doc| doc.get("_rev"))
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| StoreError::not_found("missing"))?;

        if current != rev {
            return Err(StoreError::conflict());
        }

        docs.remove(id);
        Ok(WriteReceipt {
            id: id.to_string(),
            rev: Self::next_rev(Some(&current)),
        })
    }
}
