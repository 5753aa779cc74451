//! Reference vocabulary model.
//!
//! A vocabulary source (LOINC, SNOMED, an OMOP concept extract, ...) is
//! flattened into a [`ReferenceIndex`]: one [`ReferenceEntry`] per label or
//! synonym, each pointing back at the canonical code and preferred label of
//! the row it came from.
//!
//! ## Ordering
//!
//! Entries keep their insertion order. Exact lookup returns the first entry
//! inserted under a key, and approximate scans walk entries in the same
//! order, so every tie is broken by source row order.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// One searchable key of a vocabulary source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceEntry {
    /// Normalized label or synonym. Never empty inside an index.
    pub key: String,

    /// Vocabulary code of the originating row (e.g. "10230-1").
    /// `None` when the row had no usable code.
    pub code: Option<String>,

    /// Preferred label of the originating row, shared by all its synonyms.
    pub label: String,

    /// Concept identifier carried directly by the row, if the source has one.
    pub concept_id: Option<String>,
}

/// Counters collected while an index is built.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    pub rows: usize,
    pub entries: usize,
    pub distinct_keys: usize,
    pub duplicate_keys: usize,
    pub skipped_empty_keys: usize,
    pub missing_codes: usize,
}

/// Ordered, read-only collection of reference entries for one source.
#[derive(Debug, Clone, Default)]
pub struct ReferenceIndex {
    /// Source name (e.g. "LOINC").
    pub source: String,
    entries: Vec<ReferenceEntry>,
    /// Normalized key -> position of the first entry with that key.
    exact: HashMap<String, usize>,
    stats: IndexStats,
}

impl ReferenceIndex {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ..Self::default()
        }
    }

    /// Append an entry. Entries with an empty key are dropped and `false`
    /// is returned.
    pub fn push(&mut self, entry: ReferenceEntry) -> bool {
        if entry.key.is_empty() {
            self.stats.skipped_empty_keys += 1;
            return false;
        }
        let position = self.entries.len();
        match self.exact.get(&entry.key) {
            Some(_) => self.stats.duplicate_keys += 1,
            None => {
                self.exact.insert(entry.key.clone(), position);
                self.stats.distinct_keys += 1;
            }
        }
        self.entries.push(entry);
        self.stats.entries += 1;
        true
    }

    /// Record that one source row was consumed.
    pub fn record_row(&mut self, has_code: bool) {
        self.stats.rows += 1;
        if !has_code {
            self.stats.missing_codes += 1;
        }
    }

    /// First entry whose key equals `key`.
    pub fn exact(&self, key: &str) -> Option<&ReferenceEntry> {
        self.exact.get(key).map(|&idx| &self.entries[idx])
    }

    pub fn entries(&self) -> &[ReferenceEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> IndexStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(key: &str, code: &str, label: &str) -> ReferenceEntry {
        ReferenceEntry {
            key: key.to_string(),
            code: Some(code.to_string()),
            label: label.to_string(),
            concept_id: None,
        }
    }

    #[test]
    fn exact_lookup_returns_first_inserted() {
        let mut index = ReferenceIndex::new("LOINC");
        index.push(entry("ef", "10230-1", "Ejection fraction"));
        index.push(entry("ef", "18043-0", "Left ventricular Ejection fraction"));

        let hit = index.exact("ef").unwrap();
        assert_eq!(hit.code.as_deref(), Some("10230-1"));
        assert_eq!(index.stats().duplicate_keys, 1);
        assert_eq!(index.stats().distinct_keys, 1);
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn empty_keys_are_rejected() {
        let mut index = ReferenceIndex::new("LOINC");
        assert!(!index.push(entry("", "1", "blank")));
        assert!(index.is_empty());
        assert_eq!(index.stats().skipped_empty_keys, 1);
    }
}
