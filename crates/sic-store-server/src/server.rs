//! HTTP server implementation using Axum.

use crate::handlers::{get_status, handle_health, handle_root, post_search_index};
use axum::{
    routing::{get, post},
    Router,
};
use sic_vector_store::{LifecycleCoordinator, SearchGateway, ServerConfig, StoreConfig};
use std::net::SocketAddr;
use std::sync::Arc;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Application state shared across handlers.
pub struct AppState {
    /// Owns the index lifecycle and the status registry
    pub coordinator: LifecycleCoordinator,
    /// Readiness-gated search entry point
    pub gateway: SearchGateway,
}

impl AppState {
    pub fn new(coordinator: LifecycleCoordinator) -> Self {
        let gateway = SearchGateway::new(coordinator.clone());
        Self {
            coordinator,
            gateway,
        }
    }
}

/// Build the router. Status and search are served both under the versioned
/// prefix and at the root.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .route("/status", get(get_status))
        .route(
            "/search-index",
            post(post_search_index)
                .layer(ConcurrencyLimitLayer::new(ServerConfig::MAX_CONCURRENT_SEARCHES)),
        );

    Router::new()
        .route("/", get(handle_root))
        .route("/health", get(handle_health))
        .nest(StoreConfig::API_PREFIX, api.clone())
        .merge(api)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server.
///
/// Returns the actual address the server is bound to (useful when port=0).
pub async fn start_server(state: AppState, host: &str, port: u16) -> anyhow::Result<SocketAddr> {
    let app = build_router(Arc::new(state));

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let actual_addr = listener.local_addr()?;

    info!("Server listening on {}", actual_addr);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("Server error: {}", e);
        }
    });

    Ok(actual_addr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sic_vector_store::{HashIndexBuilder, StatusRegistry};

    #[tokio::test]
    async fn test_server_starts() {
        let coordinator = LifecycleCoordinator::new(
            Arc::new(HashIndexBuilder::new()),
            Arc::new(StatusRegistry::new()),
        );

        let addr = start_server(AppState::new(coordinator), "127.0.0.1", 0)
            .await
            .unwrap();
        assert!(addr.port() > 0);
    }
}
