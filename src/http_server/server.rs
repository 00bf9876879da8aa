//! # HTTP Server
//!
//! Main HTTP server combining all endpoint routers.

use std::io;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::config::HttpServerConfig;
use super::health_routes::health_routes;
use super::query_routes::query_routes;
use super::state::ApiState;
use super::upload_routes::upload_routes;
use crate::store::SharedStore;

/// HTTP server for the gateway
pub struct HttpServer {
    config: HttpServerConfig,
    router: Router,
}

impl HttpServer {
    /// Create a server over an already verified store
    pub fn new(config: HttpServerConfig, store: SharedStore) -> Self {
        let state = Arc::new(ApiState::new(store));
        let router = Self::build_router(&config, state);
        Self { config, router }
    }

    /// Build the combined router with all endpoints
    pub fn build_router(config: &HttpServerConfig, state: Arc<ApiState>) -> Router {
        let cors = if config.cors_origins.is_empty() {
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        } else {
            let origins: Vec<_> = config
                .cors_origins
                .iter()
                .filter_map(|s| s.parse().ok())
                .collect();

            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods(Any)
                .allow_headers(Any)
        };

        Router::new()
            // Banner and health check at root level
            .merge(health_routes(state.clone()))
            // Uploads, lookups, pagination and delete under /api
            .nest(
                "/api",
                upload_routes(state.clone()).merge(query_routes(state)),
            )
            .layer(TraceLayer::new_for_http())
            .layer(cors)
    }

    /// Get the socket address
    pub fn socket_addr(&self) -> String {
        self.config.socket_addr()
    }

    /// Get the router (for testing)
    pub fn router(self) -> Router {
        self.router
    }

    /// Bind the configured host and port; host names are resolved
    pub async fn bind(&self) -> Result<TcpListener, io::Error> {
        TcpListener::bind((self.config.host.as_str(), self.config.port)).await
    }

    /// Bind and serve until the process is terminated
    pub async fn start(self) -> Result<(), io::Error> {
        let listener = self.bind().await?;
        let addr = listener.local_addr()?;
        tracing::info!(%addr, "BARKR server listening");
        tracing::info!("health check: http://{}/health", addr);

        axum::serve(listener, self.router).await?;

        Ok(())
    }
}
