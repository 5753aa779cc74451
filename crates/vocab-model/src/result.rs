use std::fmt;

use serde::{Deserialize, Serialize};

/// Validation tag for terms that appear in no domain corpus.
pub const NOT_FOUND: &str = "Not Found";

/// How a term was matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    /// Normalized term equals a reference key.
    Exact,
    /// Best approximate key of a cascade stage.
    Fuzzy,
    /// Best approximate row of a global-best stage.
    FuzzyPartial,
    Unmatched,
}

impl MatchType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Fuzzy => "fuzzy",
            Self::FuzzyPartial => "fuzzy_partial",
            Self::Unmatched => "unmatched",
        }
    }

    pub const fn is_match(&self) -> bool {
        !matches!(self, Self::Unmatched)
    }
}

impl fmt::Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The reference entry chosen for a term, before concept resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedEntry {
    pub label: String,
    pub code: Option<String>,
    pub concept_id: Option<String>,
    pub match_type: MatchType,
    /// 0-100; always 100 for exact matches.
    pub score: u8,
}

/// A concept identifier together with the vocabulary tag it was found under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptRef {
    pub concept_id: String,
    pub vocabulary: String,
}

/// Terminal record of the pipeline: one per input row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    #[serde(rename = "DISPLAY_NAME")]
    pub input_term: String,
    #[serde(rename = "MATCHED_TERM")]
    pub matched_label: Option<String>,
    #[serde(rename = "CODE")]
    pub matched_code: Option<String>,
    #[serde(rename = "CONCEPT_ID")]
    pub concept_id: Option<String>,
    #[serde(rename = "CONCEPT_VOCAB")]
    pub concept_vocab: Option<String>,
    #[serde(rename = "MATCH_SOURCE")]
    pub match_source: String,
    #[serde(rename = "MATCH_TYPE")]
    pub match_type: MatchType,
    #[serde(rename = "FUZZY_SCORE")]
    pub fuzzy_score: u8,
    #[serde(rename = "VALIDATED_IN")]
    pub validated_in: String,
}

impl MatchResult {
    /// Result for a term that matched `entry` in `source`.
    pub fn matched(
        input_term: impl Into<String>,
        source: impl Into<String>,
        entry: MatchedEntry,
        concept: Option<ConceptRef>,
        validated_in: impl Into<String>,
    ) -> Self {
        let (concept_id, concept_vocab) = match concept {
            Some(concept) => (Some(concept.concept_id), Some(concept.vocabulary)),
            None => (None, None),
        };
        let fuzzy_score = match entry.match_type {
            MatchType::Exact => 100,
            MatchType::Unmatched => 0,
            _ => entry.score.min(100),
        };
        Self {
            input_term: input_term.into(),
            matched_label: Some(entry.label),
            matched_code: entry.code,
            concept_id,
            concept_vocab,
            match_source: source.into(),
            match_type: entry.match_type,
            fuzzy_score,
            validated_in: validated_in.into(),
        }
    }

    /// Result for a term no source could match; `source` is the last one tried.
    pub fn unmatched(
        input_term: impl Into<String>,
        source: impl Into<String>,
        validated_in: impl Into<String>,
    ) -> Self {
        Self {
            input_term: input_term.into(),
            matched_label: None,
            matched_code: None,
            concept_id: None,
            concept_vocab: None,
            match_source: source.into(),
            match_type: MatchType::Unmatched,
            fuzzy_score: 0,
            validated_in: validated_in.into(),
        }
    }

    pub fn is_matched(&self) -> bool {
        self.match_type.is_match()
    }

    pub fn is_validated(&self) -> bool {
        self.validated_in != NOT_FOUND
    }
}
