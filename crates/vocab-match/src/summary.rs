//! Run summary counts.

use std::collections::BTreeMap;

use serde::Serialize;

use vocab_model::{MatchResult, MatchType, NOT_FOUND};

use crate::cascade::StageStats;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceCount {
    pub source: String,
    /// Input rows whose final result came from this source.
    pub matched: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CorpusCount {
    pub corpus: String,
    pub rows: usize,
}

/// Counts over the final results of one run. Row counts include
/// duplicate input terms; stage counts are per distinct term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub total_rows: usize,
    pub unique_terms: usize,
    pub matched: usize,
    pub unmatched: usize,
    pub by_source: Vec<SourceCount>,
    pub by_match_type: BTreeMap<MatchType, usize>,
    pub validated: Vec<CorpusCount>,
    pub not_validated: usize,
    pub stages: Vec<StageStats>,
}

impl RunSummary {
    /// `sources` and `corpora` give reporting order; every name appears
    /// even with a zero count.
    pub fn build<'a>(
        results: &[MatchResult],
        unique_terms: usize,
        sources: impl IntoIterator<Item = &'a str>,
        corpora: impl IntoIterator<Item = &'a str>,
        stages: Vec<StageStats>,
    ) -> Self {
        let mut by_source: Vec<SourceCount> = sources
            .into_iter()
            .map(|source| SourceCount {
                source: source.to_string(),
                matched: 0,
            })
            .collect();
        let mut validated: Vec<CorpusCount> = corpora
            .into_iter()
            .map(|corpus| CorpusCount {
                corpus: corpus.to_string(),
                rows: 0,
            })
            .collect();
        let mut by_match_type = BTreeMap::new();
        let mut matched = 0;
        let mut not_validated = 0;

        for result in results {
            *by_match_type.entry(result.match_type).or_insert(0) += 1;
            if result.is_matched() {
                matched += 1;
                if let Some(count) = by_source
                    .iter_mut()
                    .find(|count| count.source == result.match_source)
                {
                    count.matched += 1;
                }
            }
            if result.validated_in == NOT_FOUND {
                not_validated += 1;
            } else if let Some(count) = validated
                .iter_mut()
                .find(|count| count.corpus == result.validated_in)
            {
                count.rows += 1;
            }
        }

        Self {
            total_rows: results.len(),
            unique_terms,
            matched,
            unmatched: results.len() - matched,
            by_source,
            by_match_type,
            validated,
            not_validated,
            stages,
        }
    }

    pub fn match_type_count(&self, match_type: MatchType) -> usize {
        self.by_match_type.get(&match_type).copied().unwrap_or(0)
    }
}
