use thiserror::Error;

use vocab_model::ModelError;

#[derive(Debug, Error)]
pub enum MatchError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("cutoff for source '{source_name}' must be within [0, 1], got {value}")]
    InvalidCutoff { source_name: String, value: f64 },

    #[error("invalid code pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("at least one vocabulary source is required")]
    NoSources,
}

pub type Result<T> = std::result::Result<T, MatchError>;
