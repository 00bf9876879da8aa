//! Query HTTP Routes
//!
//! Lookup, pagination and delete endpoints. Every route names its
//! collection through the `db_name` query parameter.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    routing::{delete, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::{ApiError, ApiResult};
use super::state::ApiState;
use crate::store::{now_millis, Collection, DeleteOutcome};

// ==================
// Request/Response Types
// ==================

#[derive(Debug, Default, Deserialize)]
pub struct CollectionQuery {
    #[serde(default)]
    pub db_name: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
}

impl CollectionQuery {
    fn collection(&self) -> ApiResult<Collection> {
        let name = self
            .db_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .ok_or(ApiError::MissingParam("db_name"))?;
        Ok(name.parse()?)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedResponse {
    pub deleted_id: String,
    pub deleted_rev_id: String,
}

// ==================
// Query Routes
// ==================

/// Create query routes
pub fn query_routes(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/getPage/:page", get(get_page_handler))
        .route("/getByLink", get(get_by_link_handler))
        .route("/getById/:id", get(get_by_id_handler))
        .route("/deleteById/:id", delete(delete_by_id_handler))
        .with_state(state)
}

/// Parse a 1-based page number
pub fn parse_page(raw: &str) -> ApiResult<u32> {
    match raw.trim().parse::<u32>() {
        Ok(page) if page > 0 => Ok(page),
        _ => Err(ApiError::InvalidPage(raw.to_string())),
    }
}

// ==================
// Handlers
// ==================

async fn get_page_handler(
    State(state): State<Arc<ApiState>>,
    Path(page): Path<String>,
    Query(query): Query<CollectionQuery>,
) -> ApiResult<Json<Vec<Value>>> {
    let page = parse_page(&page)?;
    let collection = query.collection()?;

    let response = state
        .repository
        .get_page(collection, page, now_millis())
        .await?;
    Ok(Json(response.data))
}

async fn get_by_link_handler(
    State(state): State<Arc<ApiState>>,
    Query(query): Query<CollectionQuery>,
) -> ApiResult<Json<Vec<Value>>> {
    let collection = query.collection()?;
    let link = query.link.as_deref().unwrap_or_default();

    let response = state.repository.find_by_link(collection, link).await?;
    Ok(Json(response.data))
}

async fn get_by_id_handler(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
    Query(query): Query<CollectionQuery>,
) -> ApiResult<Json<Vec<Value>>> {
    let collection = query.collection()?;

    let response = state.repository.find_by_id(collection, &id).await?;
    Ok(Json(response.data))
}

async fn delete_by_id_handler(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
    Query(query): Query<CollectionQuery>,
) -> ApiResult<Json<DeletedResponse>> {
    let collection = query.collection()?;

    match state.repository.delete_by_id(collection, &id).await? {
        DeleteOutcome::Deleted(receipt) => Ok(Json(DeletedResponse {
            deleted_id: receipt.id,
            deleted_rev_id: receipt.rev,
        })),
        DeleteOutcome::NotFound => Err(ApiError::NotFound(id)),
    }
}
