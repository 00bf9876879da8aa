//! # API Errors
//!
//! Error types for the HTTP routing layer.
//!
//! Validation failures answer with `{"errors": "<message>"}`. Data-layer
//! failures go through [`handle_error`], which keeps the status the error
//! carries and serializes the error itself as the body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::store::{ErrorBody, StoreError, UnknownCollection};

/// Result type for route handlers
pub type ApiResult<T> = Result<T, ApiError>;

/// Routing layer errors
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    // ==================
    // Validation Errors
    // ==================
    /// Required body field missing or blank
    #[error("{0} must be provided")]
    MissingField(&'static str),

    /// Upload body is not a JSON object of the expected shape
    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    /// Required query parameter missing or blank
    #[error("{0} must be provided")]
    MissingParam(&'static str),

    /// Page is not a positive integer
    #[error("Page must be a positive integer, got '{0}'")]
    InvalidPage(String),

    /// `db_name` names no known collection
    #[error(transparent)]
    UnknownCollection(#[from] UnknownCollection),

    /// Delete target does not exist
    #[error("Document not found: {0}")]
    NotFound(String),

    // ==================
    // Data Layer Errors
    // ==================
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ApiError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::MissingField(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::InvalidBody(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::MissingParam(_) => StatusCode::BAD_REQUEST,
            ApiError::InvalidPage(_) => StatusCode::BAD_REQUEST,
            ApiError::UnknownCollection(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Store(err) => store_status(err),
        }
    }
}

/// Validation error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub errors: String,
}

fn store_status(err: &StoreError) -> StatusCode {
    StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

/// Map a data-layer failure to a response
pub fn handle_error(err: &StoreError) -> Response {
    (store_status(err), Json(ErrorBody::from(err))).into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Store(err) => handle_error(&err),
            other => {
                let status = other.status_code();
                let body = Json(ErrorResponse {
                    errors: other.to_string(),
                });
                (status, body).into_response()
            }
        }
    }
}
