//! Centralized configuration for the SIC vector store.
//!
//! Constants live on unit structs, runtime settings on [`IndexConfig`], which
//! is resolved from the environment by the server's composition root.

use crate::error::{Result, StoreError};
use std::path::PathBuf;
use std::time::Duration;

/// Service-level constants.
pub struct StoreConfig;

impl StoreConfig {
    pub const APP_NAME: &'static str = "SIC Vector Store API";
    pub const API_PREFIX: &'static str = "/v1/sic-vector-store";
    pub const BUILD_THREAD_NAME: &'static str = "index-build";

    // Defaults for the reference data and vector store locations
    pub const DEFAULT_VECTOR_STORE_DIR: &'static str = "data/vector_store";
    pub const DEFAULT_DATA_DIR: &'static str = "data/sic_index";
    pub const DEFAULT_SIC_INDEX_FILE: &'static str =
        "uksic2007indexeswithaddendumdecember2022.json";
    pub const DEFAULT_SIC_STRUCTURE_FILE: &'static str =
        "publisheduksicsummaryofstructureworksheet.json";
    pub const DEFAULT_SIC_CONDENSED_FILE: &'static str = "sic_2d_condensed.txt";
    pub const VECTOR_CACHE_FILE: &'static str = "sic_vectors.json";

    // Model names reported in the status endpoint
    pub const DEFAULT_EMBEDDING_MODEL: &'static str = "fnv1a-hash-384";
    pub const DEFAULT_LLM_MODEL: &'static str = "gemini-1.5-flash";

    pub const DEFAULT_MATCHES: usize = 20;
    pub const MAX_MATCHES: usize = 1000;
}

/// HTTP-facing timings and limits.
pub struct ServerConfig;

impl ServerConfig {
    pub const NOT_READY_RETRY_AFTER: Duration = Duration::from_secs(5);
    pub const MAX_CONCURRENT_SEARCHES: usize = 64;
}

/// Environment variable names read by [`IndexConfig::from_env`].
pub mod env_keys {
    pub const VECTOR_STORE_DIR: &str = "VECTOR_STORE_DIR";
    pub const SIC_DATA_DIR: &str = "SIC_DATA_DIR";
    pub const SIC_INDEX_FILE: &str = "SIC_INDEX_FILE";
    pub const SIC_STRUCTURE_FILE: &str = "SIC_STRUCTURE_FILE";
    pub const SIC_CONDENSED_FILE: &str = "SIC_CONDENSED_FILE";
    pub const EMBEDDING_MODEL_NAME: &str = "EMBEDDING_MODEL_NAME";
    pub const LLM_MODEL_NAME: &str = "LLM_MODEL_NAME";
    pub const SIC_MATCHES: &str = "SIC_MATCHES";
    pub const VECTOR_STORE_REBUILD: &str = "VECTOR_STORE_REBUILD";
}

/// Build configuration handed to the index builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexConfig {
    pub embedding_model_name: String,
    pub llm_model_name: String,
    /// Directory holding the persisted vector store.
    pub db_dir: PathBuf,
    /// Directory the reference file names are resolved against.
    pub data_dir: PathBuf,
    pub sic_index_file: String,
    pub sic_structure_file: String,
    pub sic_condensed_file: String,
    /// Number of nearest matches returned per search.
    pub matches: usize,
    /// Ignore any persisted vectors and embed from scratch.
    pub from_empty: bool,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            embedding_model_name: StoreConfig::DEFAULT_EMBEDDING_MODEL.to_string(),
            llm_model_name: StoreConfig::DEFAULT_LLM_MODEL.to_string(),
            db_dir: PathBuf::from(StoreConfig::DEFAULT_VECTOR_STORE_DIR),
            data_dir: PathBuf::from(StoreConfig::DEFAULT_DATA_DIR),
            sic_index_file: StoreConfig::DEFAULT_SIC_INDEX_FILE.to_string(),
            sic_structure_file: StoreConfig::DEFAULT_SIC_STRUCTURE_FILE.to_string(),
            sic_condensed_file: StoreConfig::DEFAULT_SIC_CONDENSED_FILE.to_string(),
            matches: StoreConfig::DEFAULT_MATCHES,
            from_empty: false,
        }
    }
}

impl IndexConfig {
    /// Resolve configuration from process environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve configuration from an arbitrary key lookup, falling back to
    /// defaults for missing or blank keys.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(v) = get(env_keys::VECTOR_STORE_DIR) {
            config.db_dir = PathBuf::from(v);
        }
        if let Some(v) = get(env_keys::SIC_DATA_DIR) {
            config.data_dir = PathBuf::from(v);
        }
        if let Some(v) = get(env_keys::SIC_INDEX_FILE) {
            config.sic_index_file = v;
        }
        if let Some(v) = get(env_keys::SIC_STRUCTURE_FILE) {
            config.sic_structure_file = v;
        }
        if let Some(v) = get(env_keys::SIC_CONDENSED_FILE) {
            config.sic_condensed_file = v;
        }
        if let Some(v) = get(env_keys::EMBEDDING_MODEL_NAME) {
            config.embedding_model_name = v;
        }
        if let Some(v) = get(env_keys::LLM_MODEL_NAME) {
            config.llm_model_name = v;
        }
        if let Some(v) = get(env_keys::SIC_MATCHES) {
            config.matches = v.trim().parse().map_err(|_| StoreError::Config {
                message: format!("{} must be a positive integer, got {:?}", env_keys::SIC_MATCHES, v),
            })?;
        }
        if let Some(v) = get(env_keys::VECTOR_STORE_REBUILD) {
            config.from_empty = matches!(
                v.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            );
        }

        config.validate()?;
        Ok(config)
    }

    /// Check invariants that the builder relies on.
    pub fn validate(&self) -> Result<()> {
        if self.matches == 0 || self.matches > StoreConfig::MAX_MATCHES {
            return Err(StoreError::Config {
                message: format!(
                    "matches must be between 1 and {}, got {}",
                    StoreConfig::MAX_MATCHES,
                    self.matches
                ),
            });
        }
        if self.embedding_model_name.trim().is_empty() {
            return Err(StoreError::Config {
                message: "embedding model name must not be empty".to_string(),
            });
        }
        if self.sic_index_file.trim().is_empty() {
            return Err(StoreError::Config {
                message: "SIC index file must not be empty".to_string(),
            });
        }
        Ok(())
    }

    pub fn sic_index_path(&self) -> PathBuf {
        self.data_dir.join(&self.sic_index_file)
    }

    pub fn sic_structure_path(&self) -> PathBuf {
        self.data_dir.join(&self.sic_structure_file)
    }

    pub fn vector_cache_path(&self) -> PathBuf {
        self.db_dir.join(StoreConfig::VECTOR_CACHE_FILE)
    }
}
