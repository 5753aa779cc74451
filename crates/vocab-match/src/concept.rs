//! Code to concept-id resolution through cross-reference tables.
//!
//! A primary table maps a vocabulary code straight to a concept id. When
//! it has no row for a code, broader fallback tables (for example an OMOP
//! `CONCEPT` extract) are scanned in order for a row with the same code
//! whose vocabulary id is in an allow-set.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use vocab_model::{ConceptRef, Table};

use crate::error::Result;

/// Column names for a primary `code -> concept_id` table.
#[derive(Debug, Clone)]
pub struct CrossReferenceColumns {
    pub code_column: String,
    pub concept_column: String,
}

/// Direct code to concept-id mapping. First row wins for duplicate codes.
#[derive(Debug, Clone, Default)]
pub struct CrossReferenceTable {
    vocabulary: String,
    concepts: HashMap<String, String>,
    duplicates: usize,
}

impl CrossReferenceTable {
    /// Empty table reporting concepts under `vocabulary`.
    pub fn new(vocabulary: impl Into<String>) -> Self {
        Self {
            vocabulary: vocabulary.into(),
            ..Self::default()
        }
    }

    pub fn from_table(
        vocabulary: impl Into<String>,
        table: &Table,
        columns: &CrossReferenceColumns,
    ) -> Result<Self> {
        let code_idx = table.column_index(&columns.code_column)?;
        let concept_idx = table.column_index(&columns.concept_column)?;

        let mut xref = Self::new(vocabulary);
        for row in &table.rows {
            xref.insert(Table::cell(row, code_idx), Table::cell(row, concept_idx));
        }
        if xref.duplicates > 0 {
            debug!(
                table = %table.name,
                duplicates = xref.duplicates,
                "duplicate codes in cross-reference table, first row wins"
            );
        }
        Ok(xref)
    }

    /// Add a mapping; ignored when either side is blank or the code is
    /// already present.
    pub fn insert(&mut self, code: &str, concept_id: &str) {
        let code = code.trim();
        let concept_id = concept_id.trim();
        if code.is_empty() || concept_id.is_empty() {
            return;
        }
        if self.concepts.contains_key(code) {
            self.duplicates += 1;
            return;
        }
        self.concepts.insert(code.to_string(), concept_id.to_string());
    }

    pub fn get(&self, code: &str) -> Option<ConceptRef> {
        self.concepts.get(code.trim()).map(|concept_id| ConceptRef {
            concept_id: concept_id.clone(),
            vocabulary: self.vocabulary.clone(),
        })
    }

    pub fn vocabulary(&self) -> &str {
        &self.vocabulary
    }

    pub fn len(&self) -> usize {
        self.concepts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.concepts.is_empty()
    }

    pub fn duplicates(&self) -> usize {
        self.duplicates
    }
}

/// Column names and filter for a fallback concept table.
#[derive(Debug, Clone)]
pub struct FallbackColumns {
    pub code_column: String,
    pub concept_column: String,
    pub vocabulary_column: String,
}

#[derive(Debug, Clone)]
struct FallbackRow {
    code: String,
    concept_id: String,
    /// Uppercased vocabulary id.
    vocabulary: String,
}

/// Broader concept table filtered by code and an allowed vocabulary set.
#[derive(Debug, Clone)]
pub struct FallbackTable {
    label: String,
    allowed: HashSet<String>,
    rows: Vec<FallbackRow>,
}

impl FallbackTable {
    /// `label` tags concepts found here; `allowed` vocabulary ids compare
    /// case-insensitively.
    pub fn new<I, S>(label: impl Into<String>, allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            label: label.into(),
            allowed: allowed
                .into_iter()
                .map(|vocab| vocab.as_ref().trim().to_uppercase())
                .collect(),
            rows: Vec::new(),
        }
    }

    pub fn from_table<I, S>(
        label: impl Into<String>,
        allowed: I,
        table: &Table,
        columns: &FallbackColumns,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let code_idx = table.column_index(&columns.code_column)?;
        let concept_idx = table.column_index(&columns.concept_column)?;
        let vocab_idx = table.column_index(&columns.vocabulary_column)?;

        let mut fallback = Self::new(label, allowed);
        for row in &table.rows {
            fallback.push(
                Table::cell(row, code_idx),
                Table::cell(row, concept_idx),
                Table::cell(row, vocab_idx),
            );
        }
        Ok(fallback)
    }

    pub fn push(&mut self, code: &str, concept_id: &str, vocabulary: &str) {
        let concept_id = concept_id.trim();
        if concept_id.is_empty() {
            return;
        }
        self.rows.push(FallbackRow {
            code: code.trim().to_string(),
            concept_id: concept_id.to_string(),
            vocabulary: vocabulary.trim().to_uppercase(),
        });
    }

    /// First row with `code` whose vocabulary is allowed.
    pub fn find(&self, code: &str) -> Option<ConceptRef> {
        let code = code.trim();
        self.rows
            .iter()
            .find(|row| row.code == code && self.allowed.contains(&row.vocabulary))
            .map(|row| ConceptRef {
                concept_id: row.concept_id.clone(),
                vocabulary: self.label.clone(),
            })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Primary table first, then each fallback in order.
#[derive(Debug, Clone, Default)]
pub struct ConceptResolver {
    primary: Option<CrossReferenceTable>,
    fallbacks: Vec<FallbackTable>,
}

impl ConceptResolver {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_primary(mut self, primary: CrossReferenceTable) -> Self {
        self.primary = Some(primary);
        self
    }

    #[must_use]
    pub fn with_fallback(mut self, fallback: FallbackTable) -> Self {
        self.fallbacks.push(fallback);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.primary.is_none() && self.fallbacks.is_empty()
    }

    /// Concept for `code`, or `None` when no table knows it. A blank code
    /// never resolves.
    pub fn resolve(&self, code: &str) -> Option<ConceptRef> {
        if code.trim().is_empty() {
            return None;
        }
        self.primary
            .as_ref()
            .and_then(|primary| primary.get(code))
            .or_else(|| self.fallbacks.iter().find_map(|fallback| fallback.find(code)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> ConceptResolver {
        let mut primary = CrossReferenceTable::new("LOINC");
        primary.insert("10230-1", "3040044");
        primary.insert("10230-1", "1111");

        let mut fallback = FallbackTable::new("MEASUREMENT", ["loinc", "SNOMED"]);
        fallback.push("10230-1", "9999", "LOINC");
        fallback.push("18043-0", "3020460", "Loinc");
        fallback.push("8867-4", "777", "CPT4");

        ConceptResolver::new()
            .with_primary(primary)
            .with_fallback(fallback)
    }

    #[test]
    fn primary_table_wins_over_fallback() {
        let concept = resolver().resolve("10230-1").unwrap();
        assert_eq!(concept.concept_id, "3040044");
        assert_eq!(concept.vocabulary, "LOINC");
    }

    #[test]
    fn fallback_matches_vocabulary_case_insensitively() {
        let concept = resolver().resolve(" 18043-0 ").unwrap();
        assert_eq!(concept.concept_id, "3020460");
        assert_eq!(concept.vocabulary, "MEASUREMENT");
    }

    #[test]
    fn disallowed_vocabulary_is_ignored() {
        assert_eq!(resolver().resolve("8867-4"), None);
        assert_eq!(resolver().resolve(""), None);
    }

    #[test]
    fn resolver_without_tables_is_empty() {
        assert!(ConceptResolver::new().is_empty());
        assert!(!resolver().is_empty());
        assert_eq!(ConceptResolver::new().resolve("10230-1"), None);
    }

    #[test]
    fn duplicate_primary_codes_keep_first_row() {
        let table = Table::new(
            "LOINC_OMOP.csv",
            vec!["LOINC".to_string(), "CONCEPT_ID".to_string()],
            vec![
                vec!["10230-1".to_string(), "3040044".to_string()],
                vec!["10230-1".to_string(), "42".to_string()],
                vec![String::new(), "5".to_string()],
            ],
        );
        let columns = CrossReferenceColumns {
            code_column: "loinc".to_string(),
            concept_column: "concept_id".to_string(),
        };
        let xref = CrossReferenceTable::from_table("LOINC", &table, &columns).unwrap();
        assert_eq!(xref.len(), 1);
        assert_eq!(xref.duplicates(), 1);
        assert_eq!(xref.get("10230-1").unwrap().concept_id, "3040044");
    }

    #[test]
    fn fallback_requires_vocabulary_column() {
        let table = Table::new(
            "CONCEPT.csv",
            vec!["CONCEPT_CODE".to_string(), "CONCEPT_ID".to_string()],
            Vec::new(),
        );
        let columns = FallbackColumns {
            code_column: "CONCEPT_CODE".to_string(),
            concept_column: "CONCEPT_ID".to_string(),
            vocabulary_column: "VOCABULARY_ID".to_string(),
        };
        let err = FallbackTable::from_table("MEASUREMENT", ["LOINC"], &table, &columns)
            .unwrap_err();
        assert!(err.to_string().contains("VOCABULARY_ID"));
    }
}
