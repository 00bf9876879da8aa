//! # BARKR HTTP Server Module
//!
//! REST surface of the gateway, combining all endpoint routers into one
//! Axum server.
//!
//! # Endpoints
//!
//! - `/`, `/health` - Liveness banner and database health
//! - `/api/upload/*` - Create shop items and news
//! - `/api/getPage/:page`, `/api/getByLink`, `/api/getById/:id` - Lookups
//! - `/api/deleteById/:id` - Delete

pub mod config;
pub mod errors;
pub mod health_routes;
pub mod query_routes;
pub mod server;
pub mod state;
pub mod upload_routes;

pub use config::HttpServerConfig;
pub use errors::{handle_error, ApiError, ApiResult};
pub use server::HttpServer;
pub use state::ApiState;
