//! # Store Module
//!
//! Data access layer in front of the hosted document database.
//!
//! - [`Repository`] builds selector queries and writes for each domain
//!   operation and normalizes results into [`StoreResponse`].
//! - [`DocumentStore`] is the database boundary, implemented by
//!   [`CloudantClient`] and, for tests and local runs, [`MemoryStore`].
//! - [`verify_collections`] gates server startup on the required
//!   collections existing.

pub mod backend;
pub mod cloudant;
pub mod collection;
pub mod config;
pub mod document;
pub mod errors;
pub mod memory;
pub mod repository;
pub mod selector;
pub mod startup;

pub use backend::{DocumentStore, SharedStore, WriteReceipt};
pub use cloudant::CloudantClient;
pub use collection::{Collection, UnknownCollection};
pub use config::CloudantConfig;
pub use document::{clean_url, now_millis, ResearchNewsItem, ShopItem, TwitterNewsItem};
pub use errors::{ErrorBody, StoreError, StoreResult};
pub use memory::MemoryStore;
pub use repository::{page_bounds, Created, DeleteOutcome, Repository, StoreResponse, DAY_MILLIS};
pub use selector::{Condition, Operator, Selector};
pub use startup::{check_connection, verify_collections, ConnectionState};
