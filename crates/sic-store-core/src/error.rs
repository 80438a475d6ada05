//! Error types for the SIC vector store.
//!
//! Build failures are recorded centrally by the lifecycle coordinator, while
//! request-scoped failures are converted into [`SearchError`] at the gateway
//! so that no collaborator error type leaks to the transport layer.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// General error type for store plumbing (I/O, serialization, configuration).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error at {path:?}: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("{0}")]
    Other(String),
}

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io {
            message: err.to_string(),
            path: None,
            source: Some(err),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl StoreError {
    /// Create an IO error with path context.
    pub fn io_with_path(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        StoreError::Io {
            message: err.to_string(),
            path: Some(path.into()),
            source: Some(err),
        }
    }
}

/// Index construction could not complete.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Invalid reference data in {path}: {message}")]
    Reference { path: PathBuf, message: String },

    #[error("Reference data produced an empty index")]
    EmptyReference,

    #[error("Failed to persist vector store: {message}")]
    Persist { message: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<std::io::Error> for BuildError {
    fn from(err: std::io::Error) -> Self {
        BuildError::Store(err.into())
    }
}

/// Failure raised by a ready index while answering a single query.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct IndexError {
    pub message: String,
}

impl IndexError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Returned by [`crate::LifecycleCoordinator::await_ready`] when no index
/// handle can be produced.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NotReady {
    #[error("Vector store not ready after {0:?}")]
    TimedOut(Duration),

    #[error("Vector store failed to load: {reason}")]
    Failed { reason: String },

    #[error("Vector store build ended without publishing a result")]
    Abandoned,
}

/// Errors surfaced by the search gateway.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SearchError {
    /// The index is still being built; retry later.
    #[error("Vector store is not ready")]
    NotReady,

    /// The build failed and this process will never become ready.
    #[error("Vector store failed to load: {reason}")]
    IndexFailed { reason: String },

    /// The ready index could not answer this query.
    #[error("Search failed: {message}")]
    Search { message: String },
}

impl SearchError {
    /// HTTP status code equivalent for this error.
    ///
    /// - 503: index not available (loading or permanently failed)
    /// - 500: the query itself failed inside the index
    pub fn status_code(&self) -> u16 {
        match self {
            SearchError::NotReady | SearchError::IndexFailed { .. } => 503,
            SearchError::Search { .. } => 500,
        }
    }

    /// Whether the caller should retry the same request later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SearchError::NotReady)
    }
}

impl From<IndexError> for SearchError {
    fn from(err: IndexError) -> Self {
        SearchError::Search {
            message: err.message,
        }
    }
}
