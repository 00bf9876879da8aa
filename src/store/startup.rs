//! Startup connectivity check
//!
//! The server must not accept traffic until every required collection has
//! been confirmed to exist.

use serde::Serialize;

use super::backend::DocumentStore;
use super::collection::Collection;
use super::errors::{StoreError, StoreResult};

/// Confirm that every collection in `required` exists.
///
/// Each missing collection is logged separately before the error is
/// returned, so the operator sees the full list at once.
pub async fn verify_collections<S>(store: &S, required: &[Collection]) -> StoreResult<()>
where
    S: DocumentStore + ?Sized,
{
    tracing::info!("initializing database connection");

    let existing = store.list_databases().await.map_err(|e| {
        tracing::error!(error = %e, "connect failure");
        e
    })?;

    let missing: Vec<String> = required
        .iter()
        .map(|c| c.db_name())
        .filter(|name| !existing.iter().any(|e| e.as_str() == *name))
        .map(|name| {
            tracing::error!(db = name, "database does not exist");
            name.to_string()
        })
        .collect();

    if !missing.is_empty() {
        return Err(StoreError::MissingCollections(missing));
    }

    let names: Vec<&str> = required.iter().map(|c| c.db_name()).collect();
    tracing::info!(databases = ?names, "database connection initialized");
    Ok(())
}

/// Live connectivity as seen by the health endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "detail", rename_all = "snake_case")]
pub enum ConnectionState {
    Connected,
    Unreachable(String),
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }
}

/// Probe the store with a cheap request
pub async fn check_connection<S>(store: &S) -> ConnectionState
where
    S: DocumentStore + ?Sized,
{
    match store.list_databases().await {
        Ok(_) => ConnectionState::Connected,
        Err(e) => {
            tracing::warn!(error = %e, "database health probe failed");
            ConnectionState::Unreachable(e.to_string())
        }
    }
}
