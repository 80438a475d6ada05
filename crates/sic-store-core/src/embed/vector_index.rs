//! Brute-force vector index over SIC reference entries.

use super::hasher::{cosine_distance, HashEmbedder};
use super::reference::SicEntry;
use crate::error::{IndexError, StoreError};
use crate::index::{SearchIndex, SearchResultItem};
use std::collections::HashMap;

/// Maximum number of probes accepted by [`VectorIndex::search_multi`].
pub const MAX_PROBES: usize = 3;

pub struct VectorIndex {
    embedder: HashEmbedder,
    entries: Vec<SicEntry>,
    vectors: Vec<Vec<f32>>,
    matches: usize,
}

impl VectorIndex {
    /// Assemble an index from entries and their precomputed vectors.
    pub fn new(
        embedder: HashEmbedder,
        entries: Vec<SicEntry>,
        vectors: Vec<Vec<f32>>,
        matches: usize,
    ) -> Result<Self, StoreError> {
        if entries.len() != vectors.len() {
            return Err(StoreError::Other(format!(
                "{} entries but {} vectors",
                entries.len(),
                vectors.len()
            )));
        }
        if let Some(bad) = vectors.iter().find(|v| v.len() != embedder.dimension()) {
            return Err(StoreError::Other(format!(
                "vector dimension {} does not match embedder dimension {}",
                bad.len(),
                embedder.dimension()
            )));
        }
        Ok(Self {
            embedder,
            entries,
            vectors,
            matches,
        })
    }

    /// Embed every entry title with `embedder`.
    pub fn embed_entries(embedder: &HashEmbedder, entries: &[SicEntry]) -> Vec<Vec<f32>> {
        entries.iter().map(|e| embedder.embed(&e.title)).collect()
    }

    /// Nearest `matches` entries for one query vector, as `(entry, distance)`.
    fn rank(&self, query: &[f32]) -> Vec<(usize, f32)> {
        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(i, v)| (i, cosine_distance(query, v)))
            .collect();
        scored.sort_by(|a, b| self.compare(a, b));
        scored.truncate(self.matches);
        scored
    }

    fn compare(&self, a: &(usize, f32), b: &(usize, f32)) -> std::cmp::Ordering {
        a.1.total_cmp(&b.1)
            .then_with(|| self.entries[a.0].code.cmp(&self.entries[b.0].code))
            .then_with(|| a.0.cmp(&b.0))
    }

    fn item(&self, idx: usize, distance: f32) -> SearchResultItem {
        let entry = &self.entries[idx];
        SearchResultItem {
            distance,
            title: entry.title.clone(),
            code: entry.code.clone(),
            four_digit_code: entry.four_digit_code().to_string(),
            two_digit_code: entry.two_digit_code().to_string(),
        }
    }
}

impl SearchIndex for VectorIndex {
    /// Each non-blank probe is ranked independently; the per-probe lists are
    /// merged keeping each entry's best distance, then sorted ascending.
    fn search_multi(&self, probes: &[&str]) -> Result<Vec<SearchResultItem>, IndexError> {
        if probes.len() > MAX_PROBES {
            return Err(IndexError::new(format!(
                "at most {} probes are supported, got {}",
                MAX_PROBES,
                probes.len()
            )));
        }

        let mut best: HashMap<usize, f32> = HashMap::new();
        for probe in probes {
            let query = self.embedder.embed(probe);
            if query.iter().all(|v| *v == 0.0) {
                continue;
            }
            for (idx, distance) in self.rank(&query) {
                best.entry(idx)
                    .and_modify(|d| *d = d.min(distance))
                    .or_insert(distance);
            }
        }

        let mut merged: Vec<(usize, f32)> = best.into_iter().collect();
        merged.sort_by(|a, b| self.compare(a, b));
        merged.truncate(self.matches);

        Ok(merged
            .into_iter()
            .map(|(idx, distance)| self.item(idx, distance))
            .collect())
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_index(matches: usize) -> VectorIndex {
        let embedder = HashEmbedder::new(384).unwrap();
        let entries = vec![
            SicEntry::new("85310", "Secondary school teacher").unwrap(),
            SicEntry::new("85200", "Primary school teacher").unwrap(),
            SicEntry::new("86101", "Hospital nurse").unwrap(),
            SicEntry::new("01110", "Growing of cereals").unwrap(),
            SicEntry::new("85590", "Mathematics tutor").unwrap(),
        ];
        let vectors = VectorIndex::embed_entries(&embedder, &entries);
        VectorIndex::new(embedder, entries, vectors, matches).unwrap()
    }

    #[test]
    fn test_results_sorted_by_distance() {
        let index = sample_index(5);
        let results = index
            .search_multi(&["school teacher", "teach maths", "mainstream education"])
            .unwrap();

        assert!(!results.is_empty());
        assert!(results.windows(2).all(|w| w[0].distance <= w[1].distance));
        assert_eq!(results[0].two_digit_code, "85");
    }

    #[test]
    fn test_results_bounded_by_matches() {
        let index = sample_index(2);
        let results = index.search_multi(&["school teacher", "nurse", "cereals"]).unwrap();
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn test_entries_not_duplicated_across_probes() {
        let index = sample_index(5);
        let results = index
            .search_multi(&["secondary school teacher", "secondary school teacher", ""])
            .unwrap();
        let mut codes: Vec<&str> = results.iter().map(|r| r.code.as_str()).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), results.len());
        assert_eq!(results[0].code, "85310");
        assert!(results[0].distance < 1e-5);
    }

    #[test]
    fn test_blank_probes_return_empty() {
        let index = sample_index(5);
        assert!(index.search_multi(&["", "  ", ""]).unwrap().is_empty());
    }

    #[test]
    fn test_too_many_probes_rejected() {
        let index = sample_index(5);
        let err = index.search_multi(&["a", "b", "c", "d"]).unwrap_err();
        assert!(err.message.contains("at most 3"));
    }

    #[test]
    fn test_derived_codes() {
        let index = sample_index(1);
        let results = index.search_multi(&["hospital nurse"]).unwrap();
        assert_eq!(results[0].code, "86101");
        assert_eq!(results[0].four_digit_code, "8610");
        assert_eq!(results[0].two_digit_code, "86");
    }

    #[test]
    fn test_mismatched_vectors_rejected() {
        let embedder = HashEmbedder::new(32).unwrap();
        let entries = vec![SicEntry::new("85310", "Teacher").unwrap()];
        assert!(VectorIndex::new(embedder, entries.clone(), vec![], 5).is_err());
        assert!(VectorIndex::new(embedder, entries, vec![vec![0.0; 16]], 5).is_err());
    }
}
