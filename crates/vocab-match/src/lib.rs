#![deny(unsafe_code)]

//! Multi-stage terminology matching engine.
//!
//! Free-text terms are normalized, matched against reference vocabularies
//! in priority order (exact lookup, then approximate similarity above a
//! cutoff), mapped to concept identifiers through cross-reference tables,
//! and tagged with the first domain corpus that contains them.

pub mod cascade;
pub mod concept;
pub mod error;
pub mod index;
pub mod matcher;
pub mod normalize;
pub mod pipeline;
pub mod score;
pub mod summary;
pub mod validate;

pub use cascade::{Accepted, CascadeController, CascadeOutcome, StageStats, VocabularySource};
pub use concept::{
    ConceptResolver, CrossReferenceColumns, CrossReferenceTable, FallbackColumns, FallbackTable,
};
pub use error::{MatchError, Result};
pub use index::{
    CodePattern, DEFAULT_SYNONYM_DELIMITER, IndexSpec, TRAILING_LOINC_PATTERN, build_index,
};
pub use matcher::{Cutoff, Hit, MatchStrategy, SimilarityMatcher};
pub use normalize::Normalizer;
pub use pipeline::{Reconciliation, ReconciliationPipeline};
pub use score::{IndelRatio, Similarity, score_percent};
pub use summary::{CorpusCount, RunSummary, SourceCount};
pub use validate::{DomainCorpus, DomainValidator};
