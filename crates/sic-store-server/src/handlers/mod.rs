//! HTTP request handlers, split by endpoint.

mod search;
mod status;

pub use search::post_search_index;
pub use status::get_status;

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use sic_vector_store::{SearchError, ServerConfig, StoreConfig};
use tracing::error;

/// Root endpoint.
pub async fn handle_root() -> impl IntoResponse {
    Json(json!({"message": format!("{} is running", StoreConfig::APP_NAME)}))
}

/// Liveness check; succeeds while the index is still loading.
pub async fn handle_health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

/// Error body returned by the API.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<&'static str>,
}

/// Errors converted into HTTP responses at the transport boundary.
#[derive(Debug)]
pub enum ApiError {
    Search(SearchError),
    Internal(String),
}

impl From<SearchError> for ApiError {
    fn from(err: SearchError) -> Self {
        ApiError::Search(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Search(err) => {
                let code = StatusCode::from_u16(err.status_code())
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                let status = match err {
                    SearchError::NotReady => Some("loading"),
                    SearchError::IndexFailed { .. } => Some("failed"),
                    SearchError::Search { .. } => None,
                };
                let body = ErrorBody {
                    error: err.to_string(),
                    status,
                };

                let mut response = (code, Json(body)).into_response();
                if err.is_retryable() {
                    let secs = ServerConfig::NOT_READY_RETRY_AFTER.as_secs();
                    response
                        .headers_mut()
                        .insert(header::RETRY_AFTER, HeaderValue::from(secs));
                }
                response
            }
            ApiError::Internal(message) => {
                error!("Internal error: {}", message);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorBody {
                        error: message,
                        status: None,
                    }),
                )
                    .into_response()
            }
        }
    }
}
