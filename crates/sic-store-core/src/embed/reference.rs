//! SIC reference data loading.
//!
//! Reference files are JSON arrays of `{"code": "...", "title": "..."}`
//! objects. Codes may contain punctuation (`"85.31/1"`); only the digits are
//! kept.

use crate::error::{BuildError, StoreError};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

/// One classified activity or structure heading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SicEntry {
    pub code: String,
    pub title: String,
}

impl SicEntry {
    /// Build an entry, normalizing the code to digits only.
    ///
    /// Returns `None` when fewer than two digits remain or the title is blank.
    pub fn new(code: &str, title: &str) -> Option<Self> {
        let code: String = code.chars().filter(|c| c.is_ascii_digit()).collect();
        let title = title.trim();
        if code.len() < 2 || title.is_empty() {
            return None;
        }
        Some(Self {
            code,
            title: title.to_string(),
        })
    }

    pub fn four_digit_code(&self) -> &str {
        &self.code[..self.code.len().min(4)]
    }

    pub fn two_digit_code(&self) -> &str {
        &self.code[..2]
    }
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    code: String,
    title: String,
}

/// Load and validate one reference file.
pub fn load_reference(path: &Path) -> Result<Vec<SicEntry>, BuildError> {
    let content =
        std::fs::read_to_string(path).map_err(|e| StoreError::io_with_path(e, path))?;

    let raw: Vec<RawEntry> = serde_json::from_str(&content).map_err(|e| BuildError::Reference {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    raw.iter()
        .enumerate()
        .map(|(i, entry)| {
            SicEntry::new(&entry.code, &entry.title).ok_or_else(|| BuildError::Reference {
                path: path.to_path_buf(),
                message: format!(
                    "entry {} has an invalid code {:?} or empty title",
                    i, entry.code
                ),
            })
        })
        .collect()
}

/// Drop repeated `(code, title)` pairs, keeping first occurrences in order.
pub fn dedup_entries(entries: Vec<SicEntry>) -> Vec<SicEntry> {
    let mut seen = HashSet::new();
    entries
        .into_iter()
        .filter(|e| seen.insert((e.code.clone(), e.title.to_lowercase())))
        .collect()
}
