//! Result table writer.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use csv::WriterBuilder;

use vocab_model::MatchResult;

use crate::error::IngestError;

/// Output columns, in order. Written even when there are no results.
pub const RESULT_COLUMNS: [&str; 9] = [
    "DISPLAY_NAME",
    "MATCHED_TERM",
    "CODE",
    "CONCEPT_ID",
    "CONCEPT_VOCAB",
    "MATCH_SOURCE",
    "MATCH_TYPE",
    "FUZZY_SCORE",
    "VALIDATED_IN",
];

/// Write results as CSV to `path`, replacing any existing file.
pub fn write_results(path: &Path, results: &[MatchResult]) -> Result<(), IngestError> {
    let file = File::create(path).map_err(|source| IngestError::io(path, source))?;
    write_results_to(file, results).map_err(|source| IngestError::write(path, source))
}

/// Write results as CSV to any writer. Missing values are empty cells.
pub fn write_results_to<W: Write>(writer: W, results: &[MatchResult]) -> Result<(), csv::Error> {
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(writer);
    writer.write_record(RESULT_COLUMNS)?;
    for result in results {
        writer.serialize(result)?;
    }
    writer.flush()?;
    Ok(())
}
