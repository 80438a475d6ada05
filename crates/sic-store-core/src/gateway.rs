//! Search gateway: the single entry point for queries against the index.
//!
//! The gateway never waits for the build. It checks readiness once, forwards
//! the three probes to the published index, and converts every failure into
//! a [`SearchError`].

use crate::error::SearchError;
use crate::index::SearchResultItem;
use crate::lifecycle::LifecycleCoordinator;
use crate::status::LifecycleState;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Composite query probing the index from three angles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub industry_descr: Option<String>,
    #[serde(default)]
    pub job_title: Option<String>,
    #[serde(default)]
    pub job_description: Option<String>,
}

impl SearchQuery {
    pub fn new(
        industry_descr: impl Into<String>,
        job_title: impl Into<String>,
        job_description: impl Into<String>,
    ) -> Self {
        Self {
            industry_descr: Some(industry_descr.into()),
            job_title: Some(job_title.into()),
            job_description: Some(job_description.into()),
        }
    }

    /// Probes in fixed order; absent fields become empty strings.
    pub fn probes(&self) -> [&str; 3] {
        [
            self.industry_descr.as_deref().unwrap_or(""),
            self.job_title.as_deref().unwrap_or(""),
            self.job_description.as_deref().unwrap_or(""),
        ]
    }
}

/// Gates searches on the lifecycle coordinator's readiness.
#[derive(Debug, Clone)]
pub struct SearchGateway {
    coordinator: LifecycleCoordinator,
}

impl SearchGateway {
    pub fn new(coordinator: LifecycleCoordinator) -> Self {
        Self { coordinator }
    }

    pub fn coordinator(&self) -> &LifecycleCoordinator {
        &self.coordinator
    }

    /// Run a query against the published index.
    ///
    /// Results are returned in the order the index produced them.
    pub fn search(&self, query: &SearchQuery) -> Result<Vec<SearchResultItem>, SearchError> {
        let Some(index) = self.coordinator.handle() else {
            return Err(self.not_ready_error());
        };

        let probes = query.probes();
        debug!("Searching vector store with probes {:?}", probes);

        index.search_multi(&probes).map_err(|e| {
            warn!("Vector store search failed: {}", e);
            SearchError::from(e)
        })
    }

    fn not_ready_error(&self) -> SearchError {
        match self.coordinator.current_state() {
            LifecycleState::Failed => SearchError::IndexFailed {
                reason: self
                    .coordinator
                    .failure()
                    .unwrap_or_else(|| "unknown build failure".to_string()),
            },
            _ => SearchError::NotReady,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probes_default_to_empty() {
        let query = SearchQuery {
            job_title: Some("teach maths".into()),
            ..SearchQuery::default()
        };
        assert_eq!(query.probes(), ["", "teach maths", ""]);
    }

    #[test]
    fn test_query_deserializes_missing_fields() {
        let query: SearchQuery = serde_json::from_str(r#"{"job_title": "nurse"}"#).unwrap();
        assert_eq!(query.industry_descr, None);
        assert_eq!(query.probes(), ["", "nurse", ""]);
    }

    #[test]
    fn test_query_deserializes_null_fields() {
        let query: SearchQuery =
            serde_json::from_str(r#"{"industry_descr": null, "job_title": "x"}"#).unwrap();
        assert_eq!(query.probes(), ["", "x", ""]);
    }
}
