//! Status handler.

use crate::server::AppState;
use axum::{extract::State, Json};
use sic_vector_store::StatusSnapshot;
use std::sync::Arc;

/// Current lifecycle state and build configuration. Always 200.
pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<StatusSnapshot> {
    Json(state.coordinator.registry().snapshot())
}
