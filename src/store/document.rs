//! # Document Records
//!
//! One record type per collection. Every record is keyed by an id derived
//! from its creation time and the host of its link:
//!
//! ```text
//! <timestamp-ms>:<host>
//! ```
//!
//! Ids are unique only as long as two documents with the same host are not
//! created within the same millisecond.

use std::sync::OnceLock;

use chrono::Utc;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::collection::Collection;

/// A typed document stored in one collection
pub trait Record: Serialize {
    /// Collection the record belongs to
    const COLLECTION: Collection;

    /// Document id
    fn id(&self) -> &str;
}

/// Current wall-clock time in milliseconds since the Unix epoch
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

fn scheme_prefix() -> &'static Regex {
    static SCHEME: OnceLock<Regex> = OnceLock::new();
    SCHEME.get_or_init(|| Regex::new(r"(?i)^https?://").expect("static scheme pattern"))
}

/// Strip an optional `http://` or `https://` prefix and keep only the host.
///
/// This is not URL validation: anything before the first `/` is returned.
pub fn clean_url(url: &str) -> String {
    let without_scheme = scheme_prefix().replace(url, "");
    without_scheme
        .split('/')
        .next()
        .unwrap_or_default()
        .to_string()
}

/// Derive the document id for a link created at `timestamp`
pub fn document_id(timestamp: i64, link: &str) -> String {
    format!("{}:{}", timestamp, clean_url(link.trim()))
}

/// Item listed in the shop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShopItem {
    #[serde(rename = "_id")]
    pub id: String,
    pub item_name: String,
    pub link: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub cost: String,
    pub timestamp: i64,
}

impl ShopItem {
    pub fn new(item_name: &str, link: &str, description: &str, cost: &str, timestamp: i64) -> Self {
        Self {
            id: document_id(timestamp, link),
            item_name: item_name.trim().to_string(),
            link: link.trim().to_string(),
            description: description.trim().to_string(),
            cost: cost.trim().to_string(),
            timestamp,
        }
    }
}

impl Record for ShopItem {
    const COLLECTION: Collection = Collection::Shop;

    fn id(&self) -> &str {
        &self.id
    }
}

/// News item taken from a research publication
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchNewsItem {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub link: String,
    #[serde(default)]
    pub description: String,
    pub timestamp: i64,
}

impl ResearchNewsItem {
    pub fn new(title: &str, link: &str, description: &str, timestamp: i64) -> Self {
        Self {
            id: document_id(timestamp, link),
            title: title.trim().to_string(),
            link: link.trim().to_string(),
            description: description.trim().to_string(),
            timestamp,
        }
    }
}

impl Record for ResearchNewsItem {
    const COLLECTION: Collection = Collection::NewsResearch;

    fn id(&self) -> &str {
        &self.id
    }
}

/// News item taken from a tweet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TwitterNewsItem {
    #[serde(rename = "_id")]
    pub id: String,
    pub text: String,
    pub link: String,
    pub author: String,
    pub timestamp: i64,
}

impl TwitterNewsItem {
    pub fn new(text: &str, link: &str, author: &str, timestamp: i64) -> Self {
        Self {
            id: document_id(timestamp, link),
            text: text.trim().to_string(),
            link: link.trim().to_string(),
            author: author.trim().to_string(),
            timestamp,
        }
    }
}

impl Record for TwitterNewsItem {
    const COLLECTION: Collection = Collection::NewsTwitter;

    fn id(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_url_strips_scheme_and_path() {
        assert_eq!(clean_url("https://shop.example.com/leash"), "shop.example.com");
        assert_eq!(clean_url("http://example.org"), "example.org");
        assert_eq!(clean_url("HTTPS://Example.org/a/b?c=d"), "Example.org");
    }

    #[test]
    fn test_clean_url_without_scheme() {
        assert_eq!(clean_url("example.org/path"), "example.org");
        assert_eq!(clean_url("ftp://example.org/x"), "ftp:");
        assert_eq!(clean_url(""), "");
    }

    #[test]
    fn test_document_id_trims_link() {
        assert_eq!(
            document_id(1_700_000_000_000, "  https://arxiv.org/abs/1234 "),
            "1700000000000:arxiv.org"
        );
    }

    #[test]
    fn test_shop_item_trims_fields() {
        let item = ShopItem::new(" Leash ", " https://shop.example.com/leash ", " red ", " 12.50 ", 42);
        assert_eq!(item.id, "42:shop.example.com");
        assert_eq!(item.item_name, "Leash");
        assert_eq!(item.link, "https://shop.example.com/leash");
        assert_eq!(item.description, "red");
        assert_eq!(item.cost, "12.50");
        assert_eq!(item.timestamp, 42);
    }

    #[test]
    fn test_records_serialize_id_as_underscore_id() {
        let item = TwitterNewsItem::new("hello", "https://twitter.com/dog/status/1", "dog", 7);
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["_id"], "7:twitter.com");
        assert_eq!(json["author"], "dog");
        assert!(json.get("id").is_none());
    }

    #[test]
    fn test_record_collections() {
        assert_eq!(ShopItem::COLLECTION, Collection::Shop);
        assert_eq!(ResearchNewsItem::COLLECTION, Collection::NewsResearch);
        assert_eq!(TwitterNewsItem::COLLECTION, Collection::NewsTwitter);
    }
}
