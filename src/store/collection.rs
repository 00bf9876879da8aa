//! Logical collections served by the gateway

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A named logical partition of documents in the database
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    /// Shop items
    Shop,
    /// News collected from research publications
    NewsResearch,
    /// News collected from Twitter
    NewsTwitter,
    /// Political news; verified at startup, no upload route writes here
    NewsPolitics,
}

impl Collection {
    /// Every collection that must exist before traffic is served
    pub const ALL: [Collection; 4] = [
        Collection::Shop,
        Collection::NewsTwitter,
        Collection::NewsResearch,
        Collection::NewsPolitics,
    ];

    /// Database name backing this collection
    pub fn db_name(&self) -> &'static str {
        match self {
            Collection::Shop => "shop",
            Collection::NewsResearch => "news_research",
            Collection::NewsTwitter => "news_twitter",
            Collection::NewsPolitics => "news_politics",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.db_name())
    }
}

/// Returned when a database name matches no known collection
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown db_name: {0}")]
pub struct UnknownCollection(pub String);

impl FromStr for Collection {
    type Err = UnknownCollection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        Collection::ALL
            .into_iter()
            .find(|c| c.db_name() == name)
            .ok_or_else(|| UnknownCollection(name.to_string()))
    }
}
