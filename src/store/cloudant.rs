//! # Cloudant Client
//!
//! HTTP client for the hosted document database (CouchDB wire API).
//!
//! | Operation        | Request                       |
//! |------------------|-------------------------------|
//! | `list_databases` | `GET /_all_dbs`               |
//! | `find`           | `POST /{db}/_find`            |
//! | `insert`         | `POST /{db}`                  |
//! | `get`            | `GET /{db}/{id}`              |
//! | `destroy`        | `DELETE /{db}/{id}?rev={rev}` |
//!
//! Requests carry an IAM bearer token obtained by exchanging the API key.
//! The token is cached and refreshed shortly before it expires.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Method, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::RwLock;

use super::backend::{DocumentStore, WriteReceipt};
use super::config::CloudantConfig;
use super::errors::{StoreError, StoreResult};
use super::selector::Selector;

const CONNECT_TIMEOUT_SECS: u64 = 10;
const TOKEN_REFRESH_MARGIN_SECS: i64 = 60;
const IAM_GRANT_TYPE: &str = "urn:ibm:params:oauth:grant-type:apikey";
/// Documents requested per `_find` round trip
const FIND_PAGE_SIZE: usize = 200;

/// Cached IAM bearer token
#[derive(Debug, Clone)]
struct IamToken {
    access_token: String,
    /// Expiry as Unix seconds
    expiration: i64,
}

impl IamToken {
    fn is_fresh(&self, now: i64) -> bool {
        self.expiration - TOKEN_REFRESH_MARGIN_SECS > now
    }
}

#[derive(Debug, Deserialize)]
struct IamTokenResponse {
    access_token: String,
    expiration: i64,
}

#[derive(Debug, Deserialize)]
struct CouchErrorBody {
    error: String,
    #[serde(default)]
    reason: String,
}

#[derive(Debug, Deserialize)]
struct FindResponse {
    docs: Vec<Value>,
    #[serde(default)]
    bookmark: Option<String>,
}

/// [`DocumentStore`] backed by a Cloudant account
pub struct CloudantClient {
    http: reqwest::Client,
    base_url: Url,
    iam_url: String,
    api_key: String,
    page_size: usize,
    token: RwLock<Option<IamToken>>,
}

impl CloudantClient {
    pub fn new(config: &CloudantConfig) -> StoreResult<Self> {
        let base_url = Url::parse(&config.account_url())
            .map_err(|e| StoreError::Transport(format!("invalid account URL: {}", e)))?;

        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            http,
            base_url,
            iam_url: config.iam_url.clone(),
            api_key: config.api_key.clone(),
            page_size: FIND_PAGE_SIZE,
            token: RwLock::new(None),
        })
    }

    /// Set how many documents each `_find` round trip asks for
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Account URL requests are made against
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// URL made of the base plus percent-encoded path segments
    fn url(&self, segments: &[&str]) -> StoreResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::Transport(format!("{} cannot be a base URL", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn bearer_token(&self) -> StoreResult<String> {
        let now = Utc::now().timestamp();

        if let Some(token) = self.token.read().await.as_ref() {
            if token.is_fresh(now) {
                return Ok(token.access_token.clone());
            }
        }

        let mut cached = self.token.write().await;
        // Another request may have refreshed while we waited for the lock
        if let Some(token) = cached.as_ref() {
            if token.is_fresh(now) {
                return Ok(token.access_token.clone());
            }
        }

        let token = self.fetch_token().await?;
        let access_token = token.access_token.clone();
        *cached = Some(token);
        Ok(access_token)
    }

    async fn fetch_token(&self) -> StoreResult<IamToken> {
        tracing::debug!(iam_url = %self.iam_url, "requesting IAM token");

        let response = self
            .http
            .post(&self.iam_url)
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&[("grant_type", IAM_GRANT_TYPE), ("apikey", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| StoreError::Auth(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Auth(format!("{}: {}", status, body)));
        }

        let body: IamTokenResponse = response
            .json()
            .await
            .map_err(|e| StoreError::Auth(e.to_string()))?;

        Ok(IamToken {
            access_token: body.access_token,
            expiration: body.expiration,
        })
    }

    async fn request(&self, method: Method, url: Url) -> StoreResult<RequestBuilder> {
        let token = self.bearer_token().await?;
        Ok(self
            .http
            .request(method, url)
            .bearer_auth(token)
            .header(reqwest::header::ACCEPT, "application/json"))
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> StoreResult<T> {
        let response = request.send().await?;
        let response = error_for_status(response).await?;
        Ok(response.json::<T>().await?)
    }
}

/// Turn a non-success response into [`StoreError::Database`]
async fn error_for_status(response: Response) -> StoreResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let (error, reason) = match serde_json::from_str::<CouchErrorBody>(&text) {
        Ok(body) => (body.error, body.reason),
        Err(_) => (
            status
                .canonical_reason()
                .unwrap_or("unknown_error")
                .to_lowercase()
                .replace(' ', "_"),
            text,
        ),
    };

    tracing::debug!(status = status.as_u16(), %error, %reason, "database request failed");
    Err(StoreError::database(status.as_u16(), error, reason))
}

#[async_trait]
impl DocumentStore for CloudantClient {
    async fn list_databases(&self) -> StoreResult<Vec<String>> {
        let url = self.url(&["_all_dbs"])?;
        let request = self.request(Method::GET, url).await?;
        self.send(request).await
    }

    /// Every match, following the bookmark past the server's page limit
    async fn find(&self, db: &str, selector: &Selector) -> StoreResult<Vec<Value>> {
        let mut docs = Vec::new();
        let mut bookmark: Option<String> = None;

        loop {
            let url = self.url(&[db, "_find"])?;
            let query = selector.to_page_query(self.page_size, bookmark.as_deref());
            let request = self.request(Method::POST, url).await?.json(&query);
            let page: FindResponse = self.send(request).await?;

            let exhausted = page.docs.len() < self.page_size;
            docs.extend(page.docs);

            match page.bookmark {
                Some(next) if !exhausted && bookmark.as_deref() != Some(next.as_str()) => {
                    bookmark = Some(next);
                }
                _ => break,
            }
        }

        tracing::debug!(db, matches = docs.len(), "find complete");
        Ok(docs)
    }

    async fn insert(&self, db: &str, document: Value) -> StoreResult<WriteReceipt> {
        let url = self.url(&[db])?;
        let request = self.request(Method::POST, url).await?.json(&document);
        self.send(request).await
    }

    async fn get(&self, db: &str, id: &str) -> StoreResult<Value> {
        let url = self.url(&[db, id])?;
        let request = self.request(Method::GET, url).await?;
        self.send(request).await
    }

    async fn destroy(&self, db: &str, id: &str, rev: &str) -> StoreResult<WriteReceipt> {
        let url = self.url(&[db, id])?;
        let request = self
            .request(Method::DELETE, url)
            .await?
            .query(&[("rev", rev)]);
        self.send(request).await
    }
}
