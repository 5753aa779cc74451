//! Multi-source cascade.
//!
//! Sources run in configured order. A [`MatchStrategy::Cascade`] source
//! only sees terms that no earlier source resolved. A
//! [`MatchStrategy::GlobalBest`] source sees every term and its accepted
//! hits replace earlier results, except exact ones. The replacement does
//! not compare scores: a low global-best hit overwrites a stronger fuzzy
//! result from an earlier source, so a global-best source belongs after the
//! sources it is meant to refine and should carry a cutoff that reflects
//! how much it is trusted.
//!
//! Terms are matched once per distinct text; every input position gets a
//! copy of its text's resolution.

use std::collections::HashMap;
use std::time::Instant;

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, info_span, trace};

use vocab_model::{ConceptRef, MatchType, MatchedEntry, ReferenceEntry, ReferenceIndex};

use crate::concept::ConceptResolver;
use crate::error::{MatchError, Result};
use crate::matcher::{Cutoff, MatchStrategy, SimilarityMatcher};
use crate::normalize::Normalizer;
use crate::score::{IndelRatio, Similarity};

/// One reference vocabulary together with how it is matched.
#[derive(Debug, Clone)]
pub struct VocabularySource {
    name: String,
    /// Tag reported for concept ids carried directly by index entries.
    vocabulary: String,
    index: ReferenceIndex,
    cutoff: Cutoff,
    strategy: MatchStrategy,
    normalizer: Normalizer,
    resolver: ConceptResolver,
}

impl VocabularySource {
    /// Fails when `cutoff` is outside `[0, 1]`.
    pub fn new(name: impl Into<String>, index: ReferenceIndex, cutoff: f64) -> Result<Self> {
        let name = name.into();
        let cutoff = Cutoff::new(cutoff, &name)?;
        Ok(Self {
            vocabulary: name.clone(),
            name,
            index,
            cutoff,
            strategy: MatchStrategy::default(),
            normalizer: Normalizer::default(),
            resolver: ConceptResolver::default(),
        })
    }

    #[must_use]
    pub fn with_strategy(mut self, strategy: MatchStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Policy applied to input terms before they are compared to this
    /// source's keys. Should match the policy the index was built with.
    #[must_use]
    pub fn with_normalizer(mut self, normalizer: Normalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    #[must_use]
    pub fn with_resolver(mut self, resolver: ConceptResolver) -> Self {
        self.resolver = resolver;
        self
    }

    #[must_use]
    pub fn with_vocabulary(mut self, vocabulary: impl Into<String>) -> Self {
        self.vocabulary = vocabulary.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn index(&self) -> &ReferenceIndex {
        &self.index
    }

    pub fn cutoff(&self) -> Cutoff {
        self.cutoff
    }

    pub fn strategy(&self) -> MatchStrategy {
        self.strategy
    }

    pub fn normalizer(&self) -> Normalizer {
        self.normalizer
    }

    /// Concept for a matched entry: its own concept id if it carries one,
    /// otherwise its code through the cross-reference tables.
    pub fn concept_for(&self, entry: &ReferenceEntry) -> Option<ConceptRef> {
        if let Some(concept_id) = &entry.concept_id {
            return Some(ConceptRef {
                concept_id: concept_id.clone(),
                vocabulary: self.vocabulary.clone(),
            });
        }
        entry
            .code
            .as_deref()
            .and_then(|code| self.resolver.resolve(code))
    }
}

/// A term's accepted match, with the position of the source that made it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accepted {
    pub source: usize,
    pub entry: MatchedEntry,
    pub concept: Option<ConceptRef>,
}

/// A hit from one source before it is applied to the term's state.
#[derive(Debug)]
struct Candidate {
    entry: MatchedEntry,
    concept: Option<ConceptRef>,
    ties: usize,
}

/// Counters for one source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StageStats {
    pub source: String,
    pub strategy: MatchStrategy,
    /// Distinct terms scored against the source.
    pub evaluated: usize,
    pub exact: usize,
    pub fuzzy: usize,
    pub fuzzy_partial: usize,
    /// Earlier results replaced by a global-best hit.
    pub overridden: usize,
    /// Hits that had equally scored candidates; the first one was kept.
    pub ties: usize,
}

impl StageStats {
    fn new(source: &VocabularySource) -> Self {
        Self {
            source: source.name.clone(),
            strategy: source.strategy,
            ..Self::default()
        }
    }

    pub fn accepted(&self) -> usize {
        self.exact + self.fuzzy + self.fuzzy_partial
    }

    fn count(&mut self, match_type: MatchType) {
        match match_type {
            MatchType::Exact => self.exact += 1,
            MatchType::Fuzzy => self.fuzzy += 1,
            MatchType::FuzzyPartial => self.fuzzy_partial += 1,
            MatchType::Unmatched => {}
        }
    }
}

/// Output of [`CascadeController::resolve_all`].
#[derive(Debug, Clone)]
pub struct CascadeOutcome {
    /// One entry per input term, in input order. `None` means unmatched.
    pub resolutions: Vec<Option<Accepted>>,
    pub stages: Vec<StageStats>,
    pub unique_terms: usize,
}

/// Runs terms through an ordered list of sources.
#[derive(Debug, Clone, Default)]
pub struct CascadeController<S = IndelRatio> {
    matcher: SimilarityMatcher<S>,
    parallel: bool,
}

impl CascadeController<IndelRatio> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<S: Similarity> CascadeController<S> {
    pub fn with_matcher(matcher: SimilarityMatcher<S>) -> Self {
        Self {
            matcher,
            parallel: false,
        }
    }

    /// Score terms on the rayon pool. Results are identical either way.
    #[must_use]
    pub fn parallel(mut self, enabled: bool) -> Self {
        self.parallel = enabled;
        self
    }

    pub fn is_parallel(&self) -> bool {
        self.parallel
    }

    pub fn resolve_all<T: AsRef<str>>(
        &self,
        terms: &[T],
        sources: &[VocabularySource],
    ) -> Result<CascadeOutcome> {
        if sources.is_empty() {
            return Err(MatchError::NoSources);
        }
        let (unique, positions) = dedupe(terms);
        let _run = info_span!("reconcile", terms = terms.len(), unique = unique.len()).entered();

        let mut state: Vec<Option<Accepted>> = vec![None; unique.len()];
        let mut stages = Vec::with_capacity(sources.len());

        for (source_idx, source) in sources.iter().enumerate() {
            let _stage = info_span!(
                "stage",
                source = %source.name,
                strategy = %source.strategy
            )
            .entered();
            let started = Instant::now();

            let candidates: Vec<usize> = match source.strategy {
                MatchStrategy::Cascade => {
                    (0..unique.len()).filter(|&i| state[i].is_none()).collect()
                }
                MatchStrategy::GlobalBest => (0..unique.len()).collect(),
            };
            let hits = self.evaluate(&unique, &candidates, source);

            let mut stats = StageStats::new(source);
            stats.evaluated = candidates.len();
            for (term_idx, hit) in candidates.into_iter().zip(hits) {
                let Some(candidate) = hit else {
                    trace!(term = term_idx, "no candidate above cutoff");
                    continue;
                };
                let previous = state[term_idx].as_ref();
                if previous.is_some_and(|prev| prev.entry.match_type == MatchType::Exact) {
                    trace!(term = term_idx, "exact result kept over global-best hit");
                    continue;
                }
                if previous.is_some() {
                    stats.overridden += 1;
                }
                if candidate.ties > 0 {
                    stats.ties += 1;
                    debug!(
                        term = term_idx,
                        ties = candidate.ties,
                        score = candidate.entry.score,
                        "equally scored candidates, first in index order kept"
                    );
                }
                trace!(
                    term = term_idx,
                    match_type = %candidate.entry.match_type,
                    score = candidate.entry.score,
                    "accepted"
                );
                stats.count(candidate.entry.match_type);
                state[term_idx] = Some(Accepted {
                    source: source_idx,
                    entry: candidate.entry,
                    concept: candidate.concept,
                });
            }

            let remaining = state.iter().filter(|slot| slot.is_none()).count();
            info!(
                evaluated = stats.evaluated,
                matched = stats.accepted(),
                overridden = stats.overridden,
                remaining,
                duration_ms = started.elapsed().as_millis() as u64,
                "stage complete"
            );
            stages.push(stats);
        }

        let resolutions = positions.iter().map(|&idx| state[idx].clone()).collect();
        Ok(CascadeOutcome {
            resolutions,
            stages,
            unique_terms: unique.len(),
        })
    }

    /// Best hit per candidate term, in candidate order.
    fn evaluate(
        &self,
        unique: &[&str],
        candidates: &[usize],
        source: &VocabularySource,
    ) -> Vec<Option<Candidate>> {
        let score = |&term_idx: &usize| {
            let key = source.normalizer.normalize(unique[term_idx]);
            self.matcher
                .find(&key, &source.index, source.cutoff, source.strategy)
                .map(|hit| Candidate {
                    concept: source.concept_for(hit.entry),
                    entry: hit.to_matched_entry(),
                    ties: hit.ties,
                })
        };
        if self.parallel {
            candidates.par_iter().map(score).collect()
        } else {
            candidates.iter().map(score).collect()
        }
    }
}

/// Distinct texts in first-appearance order, and each input's position
/// among them.
fn dedupe<T: AsRef<str>>(terms: &[T]) -> (Vec<&str>, Vec<usize>) {
    let mut seen: HashMap<&str, usize> = HashMap::with_capacity(terms.len());
    let mut unique = Vec::new();
    let positions: Vec<usize> = terms
        .iter()
        .map(|term| {
            let text = term.as_ref();
            *seen.entry(text).or_insert_with(|| {
                unique.push(text);
                unique.len() - 1
            })
        })
        .collect();
    (unique, positions)
}
