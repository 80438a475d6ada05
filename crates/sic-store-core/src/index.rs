//! Capabilities consumed by the lifecycle coordinator and the search gateway.
//!
//! The embedding engine is an external collaborator: anything that can build
//! a [`SearchIndex`] from an [`IndexConfig`] plugs in through [`IndexBuilder`].

use crate::config::IndexConfig;
use crate::error::{BuildError, IndexError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// One ranked match returned by a search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResultItem {
    pub distance: f32,
    pub title: String,
    pub code: String,
    pub four_digit_code: String,
    pub two_digit_code: String,
}

/// A queryable index. Only `&self` access is exposed, so a published index
/// is read-only for every caller.
pub trait SearchIndex: Send + Sync {
    /// Rank index entries against up to three free-text probes.
    ///
    /// Results are ordered nearest first; the caller must not re-sort them.
    fn search_multi(&self, probes: &[&str]) -> Result<Vec<SearchResultItem>, IndexError>;

    /// Number of embedded entries.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Shared, immutable reference to a built index.
#[derive(Clone)]
pub struct IndexHandle(Arc<dyn SearchIndex>);

impl IndexHandle {
    pub fn new(index: impl SearchIndex + 'static) -> Self {
        Self(Arc::new(index))
    }

    pub fn from_arc(index: Arc<dyn SearchIndex>) -> Self {
        Self(index)
    }

    /// Whether two handles point at the same published index.
    pub fn ptr_eq(&self, other: &IndexHandle) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl std::ops::Deref for IndexHandle {
    type Target = dyn SearchIndex;

    fn deref(&self) -> &Self::Target {
        &*self.0
    }
}

impl fmt::Debug for IndexHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexHandle")
            .field("len", &self.0.len())
            .finish()
    }
}

/// Configuration the builder actually used, published to the status registry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmbedConfig {
    pub embedding_model_name: String,
    pub llm_model_name: String,
    pub db_dir: String,
    pub sic_index_file: String,
    pub sic_structure_file: String,
    pub sic_condensed_file: String,
    pub matches: usize,
    pub index_size: usize,
}

impl EmbedConfig {
    /// Describe a build from its input configuration and resulting size.
    pub fn from_config(config: &IndexConfig, index_size: usize) -> Self {
        Self {
            embedding_model_name: config.embedding_model_name.clone(),
            llm_model_name: config.llm_model_name.clone(),
            db_dir: config.db_dir.display().to_string(),
            sic_index_file: config.sic_index_file.clone(),
            sic_structure_file: config.sic_structure_file.clone(),
            sic_condensed_file: config.sic_condensed_file.clone(),
            matches: config.matches,
            index_size,
        }
    }
}

/// Output of a successful build.
#[derive(Debug)]
pub struct BuiltIndex {
    pub handle: IndexHandle,
    pub embed_config: EmbedConfig,
}

/// Constructs an index. May take minutes and may fail.
pub trait IndexBuilder: Send + Sync + 'static {
    fn build(&self, config: &IndexConfig) -> Result<BuiltIndex, BuildError>;
}

impl<F> IndexBuilder for F
where
    F: Fn(&IndexConfig) -> Result<BuiltIndex, BuildError> + Send + Sync + 'static,
{
    fn build(&self, config: &IndexConfig) -> Result<BuiltIndex, BuildError> {
        self(config)
    }
}
