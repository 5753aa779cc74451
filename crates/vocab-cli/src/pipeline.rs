//! Loading configured tables into a reconciliation pipeline, and writing
//! its results.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info, trace, warn};

use vocab_ingest::{read_table, write_results};
use vocab_match::{
    CodePattern, ConceptResolver, CrossReferenceColumns, CrossReferenceTable, DomainCorpus,
    DomainValidator, FallbackColumns, FallbackTable, IndexSpec, Reconciliation,
    ReconciliationPipeline, VocabularySource, build_index,
};
use vocab_model::Table;

use crate::config::{RunConfig, SourceConfig, delimiter_byte};
use crate::logging::redact_value;

/// A table read while preparing a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedTable {
    /// What the table is used for, e.g. "input" or "source LOINC".
    pub role: String,
    pub path: PathBuf,
    pub rows: usize,
}

/// Everything needed to run, with the tables it was built from.
#[derive(Debug)]
pub struct PreparedRun {
    pub terms: Vec<String>,
    pub pipeline: ReconciliationPipeline,
    pub tables: Vec<LoadedTable>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub results: PathBuf,
    pub unmatched: PathBuf,
    pub summary_json: Option<PathBuf>,
}

struct Loader<'a> {
    config: &'a RunConfig,
    tables: Vec<LoadedTable>,
}

impl<'a> Loader<'a> {
    fn new(config: &'a RunConfig) -> Self {
        Self {
            config,
            tables: Vec::new(),
        }
    }

    fn read(
        &mut self,
        role: impl Into<String>,
        path: &Path,
        delimiter: Option<&str>,
    ) -> Result<Table> {
        let role = role.into();
        let path = self.config.resolve(path);
        let table = read_table(&path, delimiter_byte(delimiter))
            .with_context(|| format!("load {role} table {}", path.display()))?;
        if table.is_empty() {
            warn!(role = %role, path = %path.display(), "table has no data rows");
        }
        self.tables.push(LoadedTable {
            role,
            path,
            rows: table.len(),
        });
        Ok(table)
    }
}

/// Read every configured table and build the pipeline. Fails on the first
/// unreadable file or missing column.
pub fn prepare(config: &RunConfig) -> Result<PreparedRun> {
    let mut loader = Loader::new(config);

    let input = loader.read("input", &config.input.path, config.input.delimiter.as_deref())?;
    let terms: Vec<String> = input
        .column_values(&config.input.column)
        .context("read input terms")?
        .into_iter()
        .map(str::to_string)
        .collect();

    let mut sources = Vec::with_capacity(config.sources.len());
    for source in &config.sources {
        let built = build_source(&mut loader, source)
            .with_context(|| format!("build source '{}'", source.name))?;
        sources.push(built);
    }

    let mut corpora = Vec::with_capacity(config.corpora.len());
    for corpus in &config.corpora {
        let name = corpus.display_name();
        let table = loader.read(
            format!("corpus {name}"),
            &corpus.path,
            corpus.delimiter.as_deref(),
        )?;
        corpora.push(DomainCorpus::from_table(name, &table));
    }

    let pipeline = ReconciliationPipeline::new(sources, DomainValidator::new(corpora))?
        .parallel(config.matching.parallel);
    info!(
        terms = terms.len(),
        sources = config.sources.len(),
        corpora = config.corpora.len(),
        tables = loader.tables.len(),
        "run prepared"
    );
    Ok(PreparedRun {
        terms,
        pipeline,
        tables: loader.tables,
    })
}

fn build_source(loader: &mut Loader<'_>, config: &SourceConfig) -> Result<VocabularySource> {
    let table = loader.read(
        format!("source {}", config.name),
        &config.path,
        config.delimiter.as_deref(),
    )?;

    let mut spec = IndexSpec::new(&config.label_column, &config.code_column)
        .with_synonym_delimiter(&config.synonym_delimiter);
    if let Some(column) = &config.synonym_column {
        spec = spec.with_synonyms(column);
    }
    if let Some(pattern) = &config.code_pattern {
        spec = spec.with_code_pattern(CodePattern::new(pattern)?);
    }
    if let Some(column) = &config.concept_column {
        spec = spec.with_concept_column(column);
    }
    let normalizer = config.normalization.normalizer();
    let index = build_index(&config.name, &table, &spec, normalizer)?;
    if config.concept_column.is_some()
        && (config.concepts.primary.is_some() || !config.concepts.fallback.is_empty())
    {
        debug!(
            source = %config.name,
            "rows with a concept id bypass the cross-reference tables"
        );
    }

    let resolver = build_resolver(loader, config)?;
    if resolver.is_empty() && config.concept_column.is_none() {
        warn!(
            source = %config.name,
            "no concept column or cross-reference table, concept ids stay empty"
        );
    }
    let source = VocabularySource::new(&config.name, index, config.cutoff)?
        .with_strategy(config.strategy)
        .with_normalizer(normalizer)
        .with_vocabulary(config.vocabulary_tag())
        .with_resolver(resolver);
    Ok(source)
}

fn build_resolver(loader: &mut Loader<'_>, config: &SourceConfig) -> Result<ConceptResolver> {
    let mut resolver = ConceptResolver::new();
    if let Some(primary) = &config.concepts.primary {
        let table = loader.read(
            format!("concepts {}", primary.vocabulary),
            &primary.path,
            primary.delimiter.as_deref(),
        )?;
        let columns = CrossReferenceColumns {
            code_column: primary.code_column.clone(),
            concept_column: primary.concept_column.clone(),
        };
        let xref = CrossReferenceTable::from_table(&primary.vocabulary, &table, &columns)?;
        debug!(
            vocabulary = xref.vocabulary(),
            codes = xref.len(),
            duplicates = xref.duplicates(),
            "primary cross-reference loaded"
        );
        resolver = resolver.with_primary(xref);
    }
    for fallback in &config.concepts.fallback {
        let table = loader.read(
            format!("concepts {}", fallback.label),
            &fallback.path,
            fallback.delimiter.as_deref(),
        )?;
        let columns = FallbackColumns {
            code_column: fallback.code_column.clone(),
            concept_column: fallback.concept_column.clone(),
            vocabulary_column: fallback.vocabulary_column.clone(),
        };
        let table = FallbackTable::from_table(
            &fallback.label,
            &fallback.allowed_vocabularies,
            &table,
            &columns,
        )?;
        debug!(label = table.label(), rows = table.len(), "fallback cross-reference loaded");
        resolver = resolver.with_fallback(table);
    }
    Ok(resolver)
}

/// Write the full and unmatched result tables, plus the JSON summary when
/// configured.
pub fn write_outputs(
    config: &RunConfig,
    output_dir: &Path,
    reconciliation: &Reconciliation,
) -> Result<OutputPaths> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("create output directory {}", output_dir.display()))?;

    let results = output_dir.join(&config.output.results);
    write_results(&results, &reconciliation.results)
        .with_context(|| format!("write {}", results.display()))?;

    let unmatched_rows = reconciliation.unmatched();
    for row in &unmatched_rows {
        trace!(term = redact_value(&row.input_term), "unmatched");
    }
    let unmatched = output_dir.join(&config.output.unmatched);
    write_results(&unmatched, &unmatched_rows)
        .with_context(|| format!("write {}", unmatched.display()))?;

    let summary_json = match &config.output.summary_json {
        Some(name) => {
            let path = output_dir.join(name);
            let json = serde_json::to_string_pretty(&reconciliation.summary)
                .context("serialize run summary")?;
            fs::write(&path, json).with_context(|| format!("write {}", path.display()))?;
            Some(path)
        }
        None => None,
    };

    info!(
        results = %results.display(),
        unmatched = %unmatched.display(),
        "outputs written"
    );
    Ok(OutputPaths {
        results,
        unmatched,
        summary_json,
    })
}
