use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, info_span};

use crate::config::RunConfig;
use crate::pipeline::{prepare, write_outputs};
use crate::types::{CheckReport, RunOptions, RunReport, SourceCheck};

pub fn run_reconcile(config_path: &Path, options: &RunOptions) -> Result<RunReport> {
    let span = info_span!("run", config = %config_path.display());
    let _guard = span.enter();

    let config = RunConfig::load(config_path)?;
    let output_dir = config.output_dir(options.output_dir.as_deref());
    let mut prepared = prepare(&config)?;
    if options.parallel {
        prepared.pipeline = prepared.pipeline.parallel(true);
    }

    let reconciliation = prepared
        .pipeline
        .run(&prepared.terms)
        .context("reconcile terms")?;

    let outputs = if options.dry_run {
        info!("dry run, no files written");
        None
    } else {
        Some(write_outputs(&config, &output_dir, &reconciliation)?)
    };

    Ok(RunReport {
        config_path: config_path.to_path_buf(),
        output_dir,
        summary: reconciliation.summary,
        outputs,
    })
}

pub fn run_check(config_path: &Path) -> Result<CheckReport> {
    let span = info_span!("check", config = %config_path.display());
    let _guard = span.enter();

    let config = RunConfig::load(config_path)?;
    let prepared = prepare(&config)?;
    let sources = prepared
        .pipeline
        .sources()
        .iter()
        .map(|source| {
            let stats = source.index().stats();
            SourceCheck {
                name: source.name().to_string(),
                strategy: source.strategy().to_string(),
                cutoff: source.cutoff().value(),
                entries: stats.entries,
                distinct_keys: stats.distinct_keys,
                missing_codes: stats.missing_codes,
            }
        })
        .collect();
    info!(tables = prepared.tables.len(), "configuration is valid");
    Ok(CheckReport {
        config_path: config_path.to_path_buf(),
        tables: prepared.tables,
        terms: prepared.terms.len(),
        sources,
    })
}
