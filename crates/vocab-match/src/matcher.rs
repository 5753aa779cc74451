//! Similarity matcher: exact lookup plus approximate scan with a cutoff.
//!
//! Two strategies share the same primitive:
//! - [`MatchStrategy::Cascade`]: exact key lookup first; only when that fails,
//!   scan every entry for the best ratio. Accepted approximate hits are
//!   [`MatchType::Fuzzy`].
//! - [`MatchStrategy::GlobalBest`]: scan every entry without pruning and
//!   keep the single best one. Accepted hits are [`MatchType::FuzzyPartial`].
//!
//! An identical key is [`MatchType::Exact`] in both strategies and is never
//! subject to the cutoff. Otherwise a candidate is accepted only when its
//! ratio is strictly greater than the cutoff, and ties go to the first entry
//! in index order.

use std::fmt;

use serde::{Deserialize, Serialize};

use vocab_model::{MatchType, MatchedEntry, ReferenceEntry, ReferenceIndex};

use crate::error::{MatchError, Result};
use crate::score::{IndelRatio, Similarity, score_percent};

/// Absorbs floating-point noise between a length bound and the real ratio.
const BOUND_SLACK: f64 = 1e-9;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    #[default]
    Cascade,
    GlobalBest,
}

impl MatchStrategy {
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Cascade => "cascade",
            Self::GlobalBest => "global_best",
        }
    }

    /// Match type reported for an accepted, non-identical candidate.
    const fn approximate_type(&self) -> MatchType {
        match self {
            Self::Cascade => MatchType::Fuzzy,
            Self::GlobalBest => MatchType::FuzzyPartial,
        }
    }
}

impl fmt::Display for MatchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Minimum similarity ratio, exclusive.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Cutoff(f64);

impl Cutoff {
    /// Validate a cutoff on the 0-1 scale. `source` names the owning
    /// vocabulary source in the error.
    pub fn new(value: f64, source: &str) -> Result<Self> {
        if !(0.0..=1.0).contains(&value) {
            return Err(MatchError::InvalidCutoff {
                source_name: source.to_string(),
                value,
            });
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// Strictly-greater acceptance.
    pub fn accepts(&self, ratio: f64) -> bool {
        ratio > self.0
    }
}

/// Best candidate found for a query.
#[derive(Debug, Clone, PartialEq)]
pub struct Hit<'a> {
    pub entry: &'a ReferenceEntry,
    pub match_type: MatchType,
    pub ratio: f64,
    /// Other entries (with a different key) that reached the same ratio.
    pub ties: usize,
}

impl Hit<'_> {
    pub fn score(&self) -> u8 {
        match self.match_type {
            MatchType::Exact => 100,
            _ => score_percent(self.ratio),
        }
    }

    pub fn to_matched_entry(&self) -> MatchedEntry {
        MatchedEntry {
            label: self.entry.label.clone(),
            code: self.entry.code.clone(),
            concept_id: self.entry.concept_id.clone(),
            match_type: self.match_type,
            score: self.score(),
        }
    }
}

/// Finds the best reference entry for a normalized query key.
#[derive(Debug, Clone, Default)]
pub struct SimilarityMatcher<S = IndelRatio> {
    scorer: S,
}

impl SimilarityMatcher<IndelRatio> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<S: Similarity> SimilarityMatcher<S> {
    pub fn with_scorer(scorer: S) -> Self {
        Self { scorer }
    }

    /// Best entry for `query` in `index`, or `None` when nothing clears the
    /// cutoff. An empty query never matches.
    pub fn find<'a>(
        &self,
        query: &str,
        index: &'a ReferenceIndex,
        cutoff: Cutoff,
        strategy: MatchStrategy,
    ) -> Option<Hit<'a>> {
        if query.is_empty() {
            return None;
        }
        if let Some(entry) = index.exact(query) {
            return Some(Hit {
                entry,
                match_type: MatchType::Exact,
                ratio: 1.0,
                ties: 0,
            });
        }
        let prune = match strategy {
            MatchStrategy::Cascade => Some(cutoff),
            MatchStrategy::GlobalBest => None,
        };
        self.best_approximate(query, index, strategy, prune)
            .filter(|hit| cutoff.accepts(hit.ratio))
    }

    /// Highest-ratio entry, first one on ties. When `prune` is given,
    /// entries whose length bound cannot clear it are not scored; the full
    /// scan (`None`) scores every entry.
    fn best_approximate<'a>(
        &self,
        query: &str,
        index: &'a ReferenceIndex,
        strategy: MatchStrategy,
        prune: Option<Cutoff>,
    ) -> Option<Hit<'a>> {
        let query_len = query.chars().count();
        let mut best: Option<(&ReferenceEntry, f64)> = None;
        let mut ties = 0usize;

        for entry in index.entries() {
            if let Some(cutoff) = prune {
                let bound = self.scorer.upper_bound(query_len, entry.key.chars().count());
                let best_ratio = best.map_or(0.0, |(_, ratio)| ratio);
                if bound + BOUND_SLACK <= cutoff.value() || bound + BOUND_SLACK < best_ratio {
                    continue;
                }
            }
            let ratio = self.scorer.ratio(query, &entry.key);
            match best {
                Some((current, best_ratio)) if ratio == best_ratio => {
                    if entry.key != current.key {
                        ties += 1;
                    }
                }
                Some((_, best_ratio)) if ratio < best_ratio => {}
                _ => {
                    best = Some((entry, ratio));
                    ties = 0;
                }
            }
        }

        best.map(|(entry, ratio)| Hit {
            entry,
            match_type: strategy.approximate_type(),
            ratio,
            ties,
        })
    }
}
