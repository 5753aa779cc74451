use std::path::PathBuf;

use vocab_match::RunSummary;

use crate::pipeline::{LoadedTable, OutputPaths};

/// Command-line overrides for a run.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub output_dir: Option<PathBuf>,
    pub parallel: bool,
    pub dry_run: bool,
}

#[derive(Debug)]
pub struct RunReport {
    pub config_path: PathBuf,
    pub output_dir: PathBuf,
    pub summary: RunSummary,
    /// `None` for dry runs.
    pub outputs: Option<OutputPaths>,
}

#[derive(Debug)]
pub struct CheckReport {
    pub config_path: PathBuf,
    pub tables: Vec<LoadedTable>,
    pub terms: usize,
    pub sources: Vec<SourceCheck>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SourceCheck {
    pub name: String,
    pub strategy: String,
    pub cutoff: f64,
    pub entries: usize,
    pub distinct_keys: usize,
    pub missing_codes: usize,
}
