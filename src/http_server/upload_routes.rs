//! Upload HTTP Routes
//!
//! Endpoints that create one document each. Required fields are checked
//! here; nothing reaches the store when one is missing.

use std::sync::Arc;

use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Request, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::errors::{ApiError, ApiResult};
use super::state::ApiState;
use crate::store::{Created, StoreResponse};

// ==================
// Request Types
// ==================

#[derive(Debug, Default, Deserialize)]
pub struct ShopItemUpload {
    #[serde(default)]
    pub item_name: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub cost: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResearchNewsUpload {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TwitterNewsUpload {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    /// Accepted for compatibility, not stored
    #[serde(default)]
    pub description: Option<String>,
}

/// JSON upload body.
///
/// The body is read whatever its content type. An absent or blank body is an
/// empty upload, so the handler reports the first missing field; a body that
/// is not a valid upload is [`ApiError::InvalidBody`].
pub struct UploadBody<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for UploadBody<T>
where
    T: DeserializeOwned + Default,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| ApiError::InvalidBody(e.body_text()))?;
        parse_upload(&bytes).map(UploadBody)
    }
}

fn parse_upload<T: DeserializeOwned + Default>(bytes: &[u8]) -> ApiResult<T> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(bytes).map_err(|e| ApiError::InvalidBody(e.to_string()))
}

/// Accept a JSON string or number, keeping its text form
fn text_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected a string or number, got {}",
            other
        ))),
    }
}

// ==================
// Upload Routes
// ==================

/// Create upload routes
pub fn upload_routes(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/upload/shop", post(upload_shop_item_handler))
        .route("/upload/shop/", post(upload_shop_item_handler))
        .route("/upload/news/research", post(upload_research_news_handler))
        .route("/upload/news/twitter", post(upload_twitter_news_handler))
        .with_state(state)
}

// ==================
// Helper Functions
// ==================

/// Value of a required field, rejecting absent and blank values
fn required<'a>(value: &'a Option<String>, field: &'static str) -> ApiResult<&'a str> {
    value
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .ok_or(ApiError::MissingField(field))
}

fn optional(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or_default()
}

fn created(response: StoreResponse<Created>) -> (StatusCode, Json<Created>) {
    let status = StatusCode::from_u16(response.status_code).unwrap_or(StatusCode::CREATED);
    (status, Json(response.data))
}

// ==================
// Handlers
// ==================

async fn upload_shop_item_handler(
    State(state): State<Arc<ApiState>>,
    UploadBody(body): UploadBody<ShopItemUpload>,
) -> ApiResult<(StatusCode, Json<Created>)> {
    let item_name = required(&body.item_name, "Item name")?;
    let link = required(&body.link, "Link")?;

    let response = state
        .repository
        .add_shop_item(item_name, link, optional(&body.description), optional(&body.cost))
        .await?;
    Ok(created(response))
}

async fn upload_research_news_handler(
    State(state): State<Arc<ApiState>>,
    UploadBody(body): UploadBody<ResearchNewsUpload>,
) -> ApiResult<(StatusCode, Json<Created>)> {
    let title = required(&body.title, "Title")?;
    let link = required(&body.link, "Link")?;

    let response = state
        .repository
        .add_research_news(title, link, optional(&body.description))
        .await?;
    Ok(created(response))
}

async fn upload_twitter_news_handler(
    State(state): State<Arc<ApiState>>,
    UploadBody(body): UploadBody<TwitterNewsUpload>,
) -> ApiResult<(StatusCode, Json<Created>)> {
    let text = required(&body.text, "Text")?;
    let link = required(&body.link, "Link")?;
    let author = required(&body.author, "Author")?;

    let response = state
        .repository
        .add_twitter_news(text, link, author)
        .await?;
    Ok(created(response))
}
