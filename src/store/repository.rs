//! # Repository
//!
//! Data access layer: turns domain operations into selector queries and
//! document writes, and wraps every success in a `{data, statusCode}`
//! response.
//!
//! Lookups with an empty argument fail before any query is issued. Nothing
//! is retried; database errors are returned unchanged.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::backend::{DocumentStore, WriteReceipt};
use super::collection::Collection;
use super::document::{now_millis, Record, ResearchNewsItem, ShopItem, TwitterNewsItem};
use super::errors::{StoreError, StoreResult};
use super::selector::Selector;

/// One page of `get_page` covers one day
pub const DAY_MILLIS: i64 = 24 * 60 * 60 * 1000;

/// Successful result of a data-layer operation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreResponse<T> {
    pub data: T,
    #[serde(rename = "statusCode")]
    pub status_code: u16,
}

impl<T> StoreResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            data,
            status_code: 200,
        }
    }

    pub fn created(data: T) -> Self {
        Self {
            data,
            status_code: 201,
        }
    }
}

/// Id and revision of a newly created document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Created {
    pub created_id: String,
    pub created_rev_id: String,
}

impl From<WriteReceipt> for Created {
    fn from(receipt: WriteReceipt) -> Self {
        Self {
            created_id: receipt.id,
            created_rev_id: receipt.rev,
        }
    }
}

/// Outcome of a delete that did not fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The document was destroyed at its current revision
    Deleted(WriteReceipt),
    /// No document with that id exists
    NotFound,
}

/// Inclusive `[start, end]` timestamp bounds of a 1-based day page.
///
/// Page `p` ends `p - 1` days before `now` and starts one millisecond after
/// the end of page `p + 1`, so pages never overlap.
pub fn page_bounds(page: u32, now: i64) -> (i64, i64) {
    let end = now - (i64::from(page) - 1) * DAY_MILLIS;
    let start = end - DAY_MILLIS + 1;
    (start, end)
}

/// Data access operations over a [`DocumentStore`]
pub struct Repository<S> {
    store: S,
}

impl<S: DocumentStore> Repository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Underlying store
    pub fn store(&self) -> &S {
        &self.store
    }

    async fn insert_record<R: Record>(&self, record: &R) -> StoreResult<StoreResponse<Created>> {
        let db = R::COLLECTION.db_name();
        let document = serde_json::to_value(record)?;

        match self.store.insert(db, document).await {
            Ok(receipt) => {
                tracing::info!(db, id = %receipt.id, rev = %receipt.rev, "document created");
                Ok(StoreResponse::created(receipt.into()))
            }
            Err(e) => {
                tracing::error!(db, id = record.id(), error = %e, "create failed");
                Err(e)
            }
        }
    }

    // ==================
    // Writes
    // ==================

    pub async fn add_shop_item(
        &self,
        item_name: &str,
        link: &str,
        description: &str,
        cost: &str,
    ) -> StoreResult<StoreResponse<Created>> {
        let item = ShopItem::new(item_name, link, description, cost, now_millis());
        self.insert_record(&item).await
    }

    pub async fn add_research_news(
        &self,
        title: &str,
        link: &str,
        description: &str,
    ) -> StoreResult<StoreResponse<Created>> {
        let news = ResearchNewsItem::new(title, link, description, now_millis());
        self.insert_record(&news).await
    }

    pub async fn add_twitter_news(
        &self,
        text: &str,
        link: &str,
        author: &str,
    ) -> StoreResult<StoreResponse<Created>> {
        let news = TwitterNewsItem::new(text, link, author, now_millis());
        self.insert_record(&news).await
    }

    // ==================
    // Lookups
    // ==================

    async fn find(
        &self,
        collection: Collection,
        selector: Selector,
    ) -> StoreResult<StoreResponse<Vec<Value>>> {
        let docs = self.store.find(collection.db_name(), &selector).await?;
        Ok(StoreResponse::ok(docs))
    }

    /// Every document whose `_id` equals `id`
    pub async fn find_by_id(
        &self,
        collection: Collection,
        id: &str,
    ) -> StoreResult<StoreResponse<Vec<Value>>> {
        let id = id.trim();
        if id.is_empty() {
            return Err(StoreError::EmptyArgument("id"));
        }
        self.find(collection, Selector::eq("_id", id)).await
    }

    /// Every document whose `link` equals `link`
    pub async fn find_by_link(
        &self,
        collection: Collection,
        link: &str,
    ) -> StoreResult<StoreResponse<Vec<Value>>> {
        let link = link.trim();
        if link.is_empty() {
            return Err(StoreError::EmptyArgument("link"));
        }
        self.find(collection, Selector::eq("link", link)).await
    }

    pub async fn get_by_time_start(
        &self,
        collection: Collection,
        start: i64,
    ) -> StoreResult<StoreResponse<Vec<Value>>> {
        self.find(collection, Selector::new().gte("timestamp", start))
            .await
    }

    pub async fn get_by_time_end(
        &self,
        collection: Collection,
        end: i64,
    ) -> StoreResult<StoreResponse<Vec<Value>>> {
        self.find(collection, Selector::new().lte("timestamp", end))
            .await
    }

    pub async fn get_by_time_range(
        &self,
        collection: Collection,
        start: i64,
        end: i64,
    ) -> StoreResult<StoreResponse<Vec<Value>>> {
        let selector = Selector::new()
            .gte("timestamp", start)
            .lte("timestamp", end);
        self.find(collection, selector).await
    }

    /// Documents created during day-page `page` counted back from `now`
    pub async fn get_page(
        &self,
        collection: Collection,
        page: u32,
        now: i64,
    ) -> StoreResult<StoreResponse<Vec<Value>>> {
        let (start, end) = page_bounds(page, now);
        self.get_by_time_range(collection, start, end).await
    }

    // ==================
    // Delete
    // ==================

    /// Fetch the current revision of `id`, then destroy exactly that revision.
    ///
    /// The two steps are not atomic: a concurrent write between them
    /// surfaces as a `conflict` error.
    pub async fn delete_by_id(&self, collection: Collection, id: &str) -> StoreResult<DeleteOutcome> {
        let id = id.trim();
        if id.is_empty() {
            return Err(StoreError::EmptyArgument("id"));
        }
        let db = collection.db_name();

        let document = match self.store.get(db, id).await {
            Ok(doc) => doc,
            Err(e) if e.is_not_found() => return Ok(DeleteOutcome::NotFound),
            Err(e) => return Err(e),
        };

        let rev = document
            .get("_rev")
            .and_then(|v| v.as_str())
            .ok_or_else(|| StoreError::Decode(format!("document {} has no _rev", id)))?;

        let receipt = self.store.destroy(db, id, rev).await?;
        tracing::info!(db, id, rev = %receipt.rev, "document deleted");
        Ok(DeleteOutcome::Deleted(receipt))
    }
}
