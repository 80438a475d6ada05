//! FNV-1a feature-hashing embedder.
//!
//! Deterministic and dependency-free: unigrams and adjacent bigrams are
//! hashed into a fixed number of buckets with a sign bit, then the vector is
//! L2-normalized. Model names take the form `fnv1a-hash-<dimension>`.

use crate::error::StoreError;

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

const MODEL_PREFIX: &str = "fnv1a-hash-";
const MIN_DIMENSION: usize = 16;
const MAX_DIMENSION: usize = 4096;
const BIGRAM_WEIGHT: f32 = 0.5;

fn fnv1a(parts: &[&str]) -> u64 {
    let mut hash = FNV_OFFSET_BASIS;
    for byte in parts.iter().flat_map(|p| p.bytes()) {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Lowercase alphanumeric words.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashEmbedder {
    dimension: usize,
}

impl HashEmbedder {
    pub fn new(dimension: usize) -> Result<Self, StoreError> {
        if !(MIN_DIMENSION..=MAX_DIMENSION).contains(&dimension) {
            return Err(StoreError::Config {
                message: format!(
                    "embedding dimension must be between {} and {}, got {}",
                    MIN_DIMENSION, MAX_DIMENSION, dimension
                ),
            });
        }
        Ok(Self { dimension })
    }

    /// Parse a model name such as `fnv1a-hash-384`.
    pub fn from_model_name(name: &str) -> Result<Self, StoreError> {
        let dimension = name
            .strip_prefix(MODEL_PREFIX)
            .and_then(|d| d.parse::<usize>().ok())
            .ok_or_else(|| StoreError::Config {
                message: format!(
                    "unsupported embedding model {:?}, expected {}<dimension>",
                    name, MODEL_PREFIX
                ),
            })?;
        Self::new(dimension)
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Embed `text` into a unit vector, or the zero vector when it has no tokens.
    pub fn embed(&self, text: &str) -> Vec<f32> {
        let tokens = tokenize(text);
        let mut vector = vec![0.0f32; self.dimension];

        for token in &tokens {
            self.add_feature(&mut vector, &["w:", token.as_str()], 1.0);
        }
        for pair in tokens.windows(2) {
            self.add_feature(
                &mut vector,
                &["b:", pair[0].as_str(), " ", pair[1].as_str()],
                BIGRAM_WEIGHT,
            );
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|v| *v /= norm);
        }
        vector
    }

    fn add_feature(&self, vector: &mut [f32], parts: &[&str], weight: f32) {
        let hash = fnv1a(parts);
        let bucket = (hash % self.dimension as u64) as usize;
        let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
        vector[bucket] += sign * weight;
    }
}

/// Cosine distance between two unit vectors, clamped to `[0, 2]`.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    (1.0 - dot).clamp(0.0, 2.0)
}
