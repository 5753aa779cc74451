//! The reconciliation pipeline as an explicit object.
//!
//! Reference indexes, cross-reference tables and corpora are built by the
//! caller and handed in; the pipeline itself does no I/O.

use std::collections::HashMap;

use tracing::info;

use vocab_model::MatchResult;

use crate::cascade::{CascadeController, VocabularySource};
use crate::error::{MatchError, Result};
use crate::score::{IndelRatio, Similarity};
use crate::summary::RunSummary;
use crate::validate::{DomainCorpus, DomainValidator};

/// Results of one run, in input order, with their summary.
#[derive(Debug, Clone)]
pub struct Reconciliation {
    pub results: Vec<MatchResult>,
    pub summary: RunSummary,
}

impl Reconciliation {
    /// Rows no source could match.
    pub fn unmatched(&self) -> Vec<MatchResult> {
        self.results
            .iter()
            .filter(|result| !result.is_matched())
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct ReconciliationPipeline<S = IndelRatio> {
    sources: Vec<VocabularySource>,
    validator: DomainValidator,
    controller: CascadeController<S>,
}

impl ReconciliationPipeline<IndelRatio> {
    /// Fails with [`MatchError::NoSources`] when `sources` is empty.
    pub fn new(sources: Vec<VocabularySource>, validator: DomainValidator) -> Result<Self> {
        Self::with_controller(sources, validator, CascadeController::new())
    }
}

impl<S: Similarity> ReconciliationPipeline<S> {
    pub fn with_controller(
        sources: Vec<VocabularySource>,
        validator: DomainValidator,
        controller: CascadeController<S>,
    ) -> Result<Self> {
        if sources.is_empty() {
            return Err(MatchError::NoSources);
        }
        Ok(Self {
            sources,
            validator,
            controller,
        })
    }

    #[must_use]
    pub fn parallel(mut self, enabled: bool) -> Self {
        self.controller = self.controller.parallel(enabled);
        self
    }

    pub fn sources(&self) -> &[VocabularySource] {
        &self.sources
    }

    pub fn validator(&self) -> &DomainValidator {
        &self.validator
    }

    /// Match, resolve and validate every term. One result per term, in
    /// input order.
    pub fn run<T: AsRef<str>>(&self, terms: &[T]) -> Result<Reconciliation> {
        let outcome = self.controller.resolve_all(terms, &self.sources)?;
        let last_source = self
            .sources
            .last()
            .map(VocabularySource::name)
            .ok_or(MatchError::NoSources)?;

        let mut validations: HashMap<&str, &str> = HashMap::new();
        let results: Vec<MatchResult> = terms
            .iter()
            .zip(outcome.resolutions)
            .map(|(term, resolution)| {
                let term = term.as_ref();
                let validated_in = *validations
                    .entry(term)
                    .or_insert_with(|| self.validator.validate(term));
                match resolution {
                    Some(accepted) => MatchResult::matched(
                        term,
                        self.sources[accepted.source].name(),
                        accepted.entry,
                        accepted.concept,
                        validated_in,
                    ),
                    None => MatchResult::unmatched(term, last_source, validated_in),
                }
            })
            .collect();

        let summary = RunSummary::build(
            &results,
            outcome.unique_terms,
            self.sources.iter().map(VocabularySource::name),
            self.validator.corpora().iter().map(DomainCorpus::name),
            outcome.stages,
        );
        info!(
            rows = summary.total_rows,
            unique = summary.unique_terms,
            matched = summary.matched,
            unmatched = summary.unmatched,
            parallel = self.controller.is_parallel(),
            "reconciliation complete"
        );
        Ok(Reconciliation { results, summary })
    }
}
