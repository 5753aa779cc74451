//! Reference index construction.
//!
//! Each vocabulary row contributes one entry for its label and one per
//! synonym. All entries of a row share the row's code, preferred label and
//! (when present) concept id. Duplicate keys are kept; exact lookup resolves
//! them to the first row in file order.

use regex::Regex;
use tracing::{debug, warn};

use vocab_model::{ReferenceEntry, ReferenceIndex, Table};

use crate::error::{MatchError, Result};
use crate::normalize::Normalizer;

/// Default separator inside a synonym cell.
pub const DEFAULT_SYNONYM_DELIMITER: &str = "|";

/// LOINC code at the end of a class URI.
pub const TRAILING_LOINC_PATTERN: &str = r"([0-9\-]+)$";

/// Pulls a code out of a longer identifier, e.g. the trailing `10230-1` of
/// `http://purl.bioontology.org/ontology/LNC/10230-1`.
#[derive(Debug, Clone)]
pub struct CodePattern {
    regex: Regex,
}

impl CodePattern {
    pub fn new(pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern).map_err(|source| MatchError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self { regex })
    }

    /// First capture group if the pattern has one, otherwise the whole match.
    pub fn extract(&self, raw: &str) -> Option<String> {
        let captures = self.regex.captures(raw)?;
        let found = captures.get(1).or_else(|| captures.get(0))?;
        let code = found.as_str().trim();
        (!code.is_empty()).then(|| code.to_string())
    }
}

/// Which columns of a vocabulary table feed the index.
#[derive(Debug, Clone)]
pub struct IndexSpec {
    pub label_column: String,
    pub synonym_column: Option<String>,
    pub synonym_delimiter: String,
    pub code_column: String,
    pub code_pattern: Option<CodePattern>,
    /// Column holding a concept id directly on the vocabulary row.
    pub concept_column: Option<String>,
}

impl IndexSpec {
    pub fn new(label_column: impl Into<String>, code_column: impl Into<String>) -> Self {
        Self {
            label_column: label_column.into(),
            synonym_column: None,
            synonym_delimiter: DEFAULT_SYNONYM_DELIMITER.to_string(),
            code_column: code_column.into(),
            code_pattern: None,
            concept_column: None,
        }
    }

    #[must_use]
    pub fn with_synonyms(mut self, column: impl Into<String>) -> Self {
        self.synonym_column = Some(column.into());
        self
    }

    #[must_use]
    pub fn with_synonym_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.synonym_delimiter = delimiter.into();
        self
    }

    #[must_use]
    pub fn with_code_pattern(mut self, pattern: CodePattern) -> Self {
        self.code_pattern = Some(pattern);
        self
    }

    #[must_use]
    pub fn with_concept_column(mut self, column: impl Into<String>) -> Self {
        self.concept_column = Some(column.into());
        self
    }
}

/// Build the index for one vocabulary source.
///
/// Fails only when a configured column is absent from `table`. Rows whose
/// code is missing or does not match the code pattern are still indexed
/// under their label; they simply cannot resolve a concept later.
pub fn build_index(
    source: &str,
    table: &Table,
    spec: &IndexSpec,
    normalizer: Normalizer,
) -> Result<ReferenceIndex> {
    let label_idx = table.column_index(&spec.label_column)?;
    let code_idx = table.column_index(&spec.code_column)?;
    let synonym_idx = table.optional_column_index(spec.synonym_column.as_deref())?;
    let concept_idx = table.optional_column_index(spec.concept_column.as_deref())?;

    let mut index = ReferenceIndex::new(source);
    for row in &table.rows {
        let label = Table::cell(row, label_idx).trim().to_string();
        let raw_code = Table::cell(row, code_idx).trim();
        let code = match &spec.code_pattern {
            Some(pattern) => pattern.extract(raw_code),
            None => (!raw_code.is_empty()).then(|| raw_code.to_string()),
        };
        let concept_id = concept_idx
            .map(|idx| Table::cell(row, idx).trim())
            .filter(|value| !value.is_empty())
            .map(str::to_string);
        index.record_row(code.is_some());

        index.push(ReferenceEntry {
            key: normalizer.normalize(&label),
            code: code.clone(),
            label: label.clone(),
            concept_id: concept_id.clone(),
        });

        if let Some(idx) = synonym_idx {
            for synonym in split_synonyms(Table::cell(row, idx), &spec.synonym_delimiter) {
                index.push(ReferenceEntry {
                    key: normalizer.normalize(synonym),
                    code: code.clone(),
                    label: label.clone(),
                    concept_id: concept_id.clone(),
                });
            }
        }
    }

    let stats = index.stats();
    if stats.missing_codes > 0 {
        warn!(
            source,
            table = %table.name,
            rows = stats.missing_codes,
            "rows without a usable code are indexed by label only"
        );
    }
    if stats.duplicate_keys > 0 {
        debug!(
            source,
            duplicates = stats.duplicate_keys,
            "duplicate index keys resolve to the first row"
        );
    }
    debug!(
        source,
        rows = stats.rows,
        entries = stats.entries,
        distinct_keys = stats.distinct_keys,
        "reference index built"
    );
    Ok(index)
}

fn split_synonyms<'a>(raw: &'a str, delimiter: &str) -> Vec<&'a str> {
    let parts: Vec<&str> = if delimiter.is_empty() {
        vec![raw]
    } else {
        raw.split(delimiter).collect()
    };
    parts
        .into_iter()
        .map(str::trim)
        .filter(|synonym| !synonym.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loinc_table() -> Table {
        Table::new(
            "LOINC_CUI.csv",
            vec![
                "CLASS ID".to_string(),
                "PREFERRED LABEL".to_string(),
                "SYNONYMS".to_string(),
            ],
            vec![
                vec![
                    "http://purl.bioontology.org/ontology/LNC/10230-1".to_string(),
                    "Ejection fraction".to_string(),
                    "EF | LV ejection fraction|".to_string(),
                ],
                vec![
                    "http://purl.bioontology.org/ontology/LNC/".to_string(),
                    "Heart rate".to_string(),
                    String::new(),
                ],
            ],
        )
    }

    fn loinc_spec() -> IndexSpec {
        IndexSpec::new("Preferred Label", "Class ID")
            .with_synonyms("Synonyms")
            .with_code_pattern(CodePattern::new(TRAILING_LOINC_PATTERN).unwrap())
    }

    #[test]
    fn synonyms_share_code_and_preferred_label() {
        let index = build_index("LOINC", &loinc_table(), &loinc_spec(), Normalizer::MINIMAL)
            .expect("build index");
        let keys: Vec<&str> = index.entries().iter().map(|e| e.key.as_str()).collect();
        assert_eq!(
            keys,
            vec!["ejection fraction", "ef", "lv ejection fraction", "heart rate"]
        );

        let synonym = index.exact("lv ejection fraction").unwrap();
        assert_eq!(synonym.code.as_deref(), Some("10230-1"));
        assert_eq!(synonym.label, "Ejection fraction");
    }

    #[test]
    fn malformed_code_is_indexed_without_code() {
        let index = build_index("LOINC", &loinc_table(), &loinc_spec(), Normalizer::MINIMAL)
            .expect("build index");
        let heart = index.exact("heart rate").unwrap();
        assert_eq!(heart.code, None);
        assert_eq!(index.stats().missing_codes, 1);
        assert_eq!(index.stats().rows, 2);
    }

    #[test]
    fn missing_column_fails_early() {
        let spec = IndexSpec::new("Preferred Label", "LOINC");
        let err = build_index("LOINC", &loinc_table(), &spec, Normalizer::MINIMAL).unwrap_err();
        assert!(err.to_string().contains("LOINC_CUI.csv"));
        assert!(err.to_string().contains("'LOINC'"));
    }

    #[test]
    fn code_pattern_uses_whole_match_without_group() {
        let pattern = CodePattern::new(r"\d+-\d").unwrap();
        assert_eq!(pattern.extract("LNC/8867-4"), Some("8867-4".to_string()));
        assert_eq!(pattern.extract("no code"), None);
        assert!(CodePattern::new("(").is_err());
    }

    #[test]
    fn concept_column_is_carried_on_every_entry() {
        let table = Table::new(
            "snomed_omop.csv",
            vec![
                "CONCEPT_ID".to_string(),
                "CONCEPT_NAME".to_string(),
                "CONCEPT_CODE".to_string(),
            ],
            vec![vec![
                "4164783".to_string(),
                "Aortic root diameter".to_string(),
                "251024002".to_string(),
            ]],
        );
        let spec = IndexSpec::new("CONCEPT_NAME", "CONCEPT_CODE").with_concept_column("CONCEPT_ID");
        let index = build_index("SNOMED", &table, &spec, Normalizer::MINIMAL).unwrap();
        let entry = index.exact("aortic root diameter").unwrap();
        assert_eq!(entry.concept_id.as_deref(), Some("4164783"));
        assert_eq!(entry.code.as_deref(), Some("251024002"));
    }
}
