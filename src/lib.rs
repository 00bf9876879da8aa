//! barkr - A minimal REST gateway in front of a hosted document database
//!
//! Shop items, research news and Twitter news are created, looked up,
//! paginated by day and deleted through a small JSON API. All persistence
//! and querying is delegated to the database.

pub mod cli;
pub mod http_server;
pub mod store;
