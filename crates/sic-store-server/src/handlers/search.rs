//! Search index handler.

use super::ApiError;
use crate::server::AppState;
use axum::{extract::State, Json};
use sic_vector_store::{SearchQuery, SearchResultItem};
use std::sync::Arc;
use tracing::{debug, warn};

/// Nearest SIC entries for the three query fields.
///
/// The gateway never waits for the build, so a request during loading
/// returns 503 immediately.
pub async fn post_search_index(
    State(state): State<Arc<AppState>>,
    Json(query): Json<SearchQuery>,
) -> Result<Json<Vec<SearchResultItem>>, ApiError> {
    let gateway = state.gateway.clone();
    let results = tokio::task::spawn_blocking(move || gateway.search(&query))
        .await
        .map_err(|e| ApiError::Internal(format!("Search task failed: {}", e)))?
        .map_err(|e| {
            warn!("Search request rejected: {}", e);
            ApiError::from(e)
        })?;

    debug!("Search returned {} results", results.len());
    Ok(Json(results))
}
