//! Status registry for the vector store.
//!
//! Holds the build configuration and runtime metrics reported by the status
//! endpoint. The lifecycle state is stored in the same record so that a
//! snapshot taken under one lock is always internally consistent.

use crate::index::EmbedConfig;
use serde::{Deserialize, Serialize};
use std::sync::{PoisonError, RwLock};

/// Lifecycle states of the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LifecycleState {
    #[default]
    #[serde(rename = "starting")]
    Uninitialized,
    #[serde(rename = "loading")]
    Loading,
    #[serde(rename = "ready")]
    Ready,
    #[serde(rename = "failed")]
    Failed,
}

impl LifecycleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleState::Uninitialized => "starting",
            LifecycleState::Loading => "loading",
            LifecycleState::Ready => "ready",
            LifecycleState::Failed => "failed",
        }
    }

    /// Ready and Failed never change for the rest of the process lifetime.
    pub fn is_terminal(&self) -> bool {
        matches!(self, LifecycleState::Ready | LifecycleState::Failed)
    }
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Point-in-time copy of the registry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub status: LifecycleState,
    pub embedding_model_name: String,
    pub llm_model_name: String,
    pub db_dir: String,
    pub sic_index_file: String,
    pub sic_structure_file: String,
    pub sic_condensed_file: String,
    pub matches: usize,
    pub index_size: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Partial update merged into the registry; `None` fields are left as is.
#[derive(Debug, Clone, Default)]
pub(crate) struct StatusUpdate {
    pub status: Option<LifecycleState>,
    pub embedding_model_name: Option<String>,
    pub llm_model_name: Option<String>,
    pub db_dir: Option<String>,
    pub sic_index_file: Option<String>,
    pub sic_structure_file: Option<String>,
    pub sic_condensed_file: Option<String>,
    pub matches: Option<usize>,
    pub index_size: Option<usize>,
    pub error: Option<String>,
}

impl StatusUpdate {
    /// Update carrying every field of an embed configuration.
    pub fn from_embed_config(config: &EmbedConfig) -> Self {
        Self {
            embedding_model_name: Some(config.embedding_model_name.clone()),
            llm_model_name: Some(config.llm_model_name.clone()),
            db_dir: Some(config.db_dir.clone()),
            sic_index_file: Some(config.sic_index_file.clone()),
            sic_structure_file: Some(config.sic_structure_file.clone()),
            sic_condensed_file: Some(config.sic_condensed_file.clone()),
            matches: Some(config.matches),
            index_size: Some(config.index_size),
            ..Self::default()
        }
    }

    /// Flip to Failed and store the cause.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            status: Some(LifecycleState::Failed),
            error: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn with_status(mut self, status: LifecycleState) -> Self {
        self.status = Some(status);
        self
    }

    /// Merge the provided fields into `record`.
    pub fn apply_to(self, record: &mut StatusSnapshot) {
        if let Some(v) = self.status {
            record.status = v;
        }
        if let Some(v) = self.embedding_model_name {
            record.embedding_model_name = v;
        }
        if let Some(v) = self.llm_model_name {
            record.llm_model_name = v;
        }
        if let Some(v) = self.db_dir {
            record.db_dir = v;
        }
        if let Some(v) = self.sic_index_file {
            record.sic_index_file = v;
        }
        if let Some(v) = self.sic_structure_file {
            record.sic_structure_file = v;
        }
        if let Some(v) = self.sic_condensed_file {
            record.sic_condensed_file = v;
        }
        if let Some(v) = self.matches {
            record.matches = v;
        }
        if let Some(v) = self.index_size {
            record.index_size = v;
        }
        if let Some(v) = self.error {
            record.error = Some(v);
        }
    }
}

/// Thread-safe status record shared between the build thread and readers.
///
/// Only the lifecycle coordinator writes to it, and always through
/// [`StatusRegistry::commit`], which keeps the write lock held while the
/// coordinator publishes the matching readiness value. A snapshot therefore
/// never disagrees with what the search gateway sees.
#[derive(Debug, Default)]
pub struct StatusRegistry {
    record: RwLock<StatusSnapshot>,
}

impl StatusRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` against the live record with the write lock held.
    pub(crate) fn commit<R>(&self, f: impl FnOnce(&mut StatusSnapshot) -> R) -> R {
        let mut record = self.record.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut record)
    }

    /// Copy out all current fields.
    pub fn snapshot(&self) -> StatusSnapshot {
        self.record
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
