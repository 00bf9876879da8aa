//! # Store Errors
//!
//! Error types for the data access layer and the database boundary.

use serde::Serialize;
use thiserror::Error;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Data access errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    // ==================
    // Input Errors
    // ==================
    /// A lookup argument was empty after trimming
    #[error("empty {0}")]
    EmptyArgument(&'static str),

    // ==================
    // Database Errors
    // ==================
    /// The database answered with a non-success status
    #[error("{error}: {reason}")]
    Database {
        status: u16,
        error: String,
        reason: String,
    },

    /// The database could not be reached
    #[error("Transport error: {0}")]
    Transport(String),

    /// The API key could not be exchanged for a bearer token
    #[error("IAM authentication failed: {0}")]
    Auth(String),

    /// The database answered with a body we could not interpret
    #[error("Invalid database response: {0}")]
    Decode(String),

    // ==================
    // Startup Errors
    // ==================
    /// Required collections are absent
    #[error("Missing DB: {}", .0.join(", "))]
    MissingCollections(Vec<String>),
}

impl StoreError {
    /// Create a database error
    pub fn database(status: u16, error: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Database {
            status,
            error: error.into(),
            reason: reason.into(),
        }
    }

    /// Create a CouchDB-style `not_found` error
    pub fn not_found(reason: impl Into<String>) -> Self {
        Self::database(404, "not_found", reason)
    }

    /// Create a CouchDB-style revision `conflict` error
    pub fn conflict() -> Self {
        Self::database(409, "conflict", "Document update conflict.")
    }

    /// HTTP status code carried by this error.
    ///
    /// Database errors keep the status the database answered with when it is
    /// positive; everything else without a natural status maps to 500.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::EmptyArgument(_) => 400,
            Self::Database { status, .. } if *status > 0 => *status,
            Self::Database { .. } => 500,
            Self::Transport(_) => 500,
            Self::Auth(_) => 500,
            Self::Decode(_) => 500,
            Self::MissingCollections(_) => 500,
        }
    }

    /// Short machine-readable error name
    pub fn kind(&self) -> &str {
        match self {
            Self::EmptyArgument(_) => "empty_argument",
            Self::Database { error, .. } => error,
            Self::Transport(_) => "transport_error",
            Self::Auth(_) => "iam_error",
            Self::Decode(_) => "decode_error",
            Self::MissingCollections(_) => "missing_db",
        }
    }

    /// Whether the database reported the target as absent
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Database { status: 404, .. })
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::Decode(e.to_string())
        } else {
            Self::Transport(e.to_string())
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        Self::Decode(e.to_string())
    }
}

/// Serialized form of a [`StoreError`] sent back to HTTP clients
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub reason: String,
    #[serde(rename = "statusCode")]
    pub status_code: u16,
}

impl From<&StoreError> for ErrorBody {
    fn from(err: &StoreError) -> Self {
        let reason = match err {
            StoreError::Database { reason, .. } => reason.clone(),
            other => other.to_string(),
        };
        Self {
            error: err.kind().to_string(),
            reason,
            status_code: err.status_code(),
        }
    }
}
