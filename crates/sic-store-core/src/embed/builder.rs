//! Index builder backed by the hash embedder.
//!
//! Loads the SIC index and structure reference files, embeds every entry, and
//! persists the vectors under `db_dir` so the next start can skip embedding
//! when neither the inputs nor the model changed.

use super::hasher::HashEmbedder;
use super::reference::{dedup_entries, load_reference, SicEntry};
use super::vector_index::VectorIndex;
use crate::config::IndexConfig;
use crate::error::{BuildError, StoreError};
use crate::index::{BuiltIndex, EmbedConfig, IndexBuilder, IndexHandle, SearchIndex};
use serde::{Deserialize, Serialize};
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{debug, info, warn};

/// On-disk layout of the persisted vectors.
#[derive(Debug, Serialize, Deserialize)]
struct VectorCache {
    model: String,
    fingerprint: String,
    dimension: usize,
    vectors: Vec<Vec<f32>>,
}

/// Builds a [`VectorIndex`] from SIC reference files.
#[derive(Debug, Clone, Copy, Default)]
pub struct HashIndexBuilder;

impl HashIndexBuilder {
    pub fn new() -> Self {
        Self
    }

    fn load_entries(config: &IndexConfig) -> Result<Vec<SicEntry>, BuildError> {
        let index_path = config.sic_index_path();
        let structure_path = config.sic_structure_path();
        info!(
            "Loading the vector store - sic_index_file: {}",
            index_path.display()
        );
        info!(
            "Loading the vector store - sic_structure_file: {}",
            structure_path.display()
        );

        let mut entries = load_reference(&index_path)?;
        entries.extend(load_reference(&structure_path)?);
        let entries = dedup_entries(entries);

        if entries.is_empty() {
            return Err(BuildError::EmptyReference);
        }
        Ok(entries)
    }
}

impl IndexBuilder for HashIndexBuilder {
    fn build(&self, config: &IndexConfig) -> Result<BuiltIndex, BuildError> {
        let embedder = HashEmbedder::from_model_name(&config.embedding_model_name)?;
        let entries = Self::load_entries(config)?;
        let fingerprint = fingerprint(&config.embedding_model_name, &entries);
        let cache_path = config.vector_cache_path();

        let cached = if config.from_empty {
            info!("Rebuild requested, ignoring persisted vectors");
            None
        } else {
            load_cache(&cache_path, &fingerprint, embedder.dimension(), entries.len())
        };

        let vectors = match cached {
            Some(vectors) => {
                info!("Reusing persisted vectors from {}", cache_path.display());
                vectors
            }
            None => {
                info!("Embedding {} reference entries", entries.len());
                let vectors = VectorIndex::embed_entries(&embedder, &entries);
                let cache = VectorCache {
                    model: config.embedding_model_name.clone(),
                    fingerprint,
                    dimension: embedder.dimension(),
                    vectors,
                };
                persist_cache(&config.db_dir, &cache_path, &cache)?;
                cache.vectors
            }
        };

        let index = VectorIndex::new(embedder, entries, vectors, config.matches)?;
        let index_size = index.len();
        Ok(BuiltIndex {
            handle: IndexHandle::new(index),
            embed_config: EmbedConfig::from_config(config, index_size),
        })
    }
}

/// blake3 digest of the model name and every `(code, title)` pair.
fn fingerprint(model: &str, entries: &[SicEntry]) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(model.as_bytes());
    hasher.update(b"\n");
    for entry in entries {
        hasher.update(entry.code.as_bytes());
        hasher.update(b"\t");
        hasher.update(entry.title.as_bytes());
        hasher.update(b"\n");
    }
    hasher.finalize().to_hex().to_string()
}

/// Read persisted vectors if they match the current inputs.
fn load_cache(
    path: &Path,
    fingerprint: &str,
    dimension: usize,
    expected_len: usize,
) -> Option<Vec<Vec<f32>>> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            debug!("No persisted vectors at {}: {}", path.display(), e);
            return None;
        }
    };

    let cache: VectorCache = match serde_json::from_str(&content) {
        Ok(cache) => cache,
        Err(e) => {
            warn!("Ignoring unreadable vector cache {}: {}", path.display(), e);
            return None;
        }
    };

    if cache.fingerprint != fingerprint
        || cache.dimension != dimension
        || cache.vectors.len() != expected_len
    {
        info!("Persisted vectors are stale, re-embedding");
        return None;
    }
    Some(cache.vectors)
}

/// Write the cache atomically: temp file in `db_dir`, then rename.
fn persist_cache(db_dir: &Path, path: &Path, cache: &VectorCache) -> Result<(), BuildError> {
    std::fs::create_dir_all(db_dir).map_err(|e| StoreError::io_with_path(e, db_dir))?;

    let persist_err = |message: String| BuildError::Persist { message };

    let mut tmp = tempfile::NamedTempFile::new_in(db_dir)
        .map_err(|e| persist_err(format!("cannot create temp file: {}", e)))?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        serde_json::to_writer(&mut writer, cache)
            .map_err(|e| persist_err(format!("cannot serialize vectors: {}", e)))?;
        writer
            .flush()
            .map_err(|e| persist_err(format!("cannot write vectors: {}", e)))?;
    }
    tmp.persist(path)
        .map_err(|e| persist_err(format!("cannot replace {}: {}", path.display(), e.error)))?;

    debug!("Persisted {} vectors to {}", cache.vectors.len(), path.display());
    Ok(())
}
