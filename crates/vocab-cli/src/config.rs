//! TOML run configuration.
//!
//! One file describes a whole run: the input terms, the vocabulary sources
//! in priority order with their cross-reference tables, the validation
//! corpora and the output files. Relative paths are resolved against the
//! directory containing the configuration file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use vocab_ingest::parse_delimiter;
use vocab_match::{DEFAULT_SYNONYM_DELIMITER, MatchStrategy, Normalizer};

/// Input column read when none is configured.
pub const DEFAULT_INPUT_COLUMN: &str = "DISPLAY_NAME";
pub const DEFAULT_CUTOFF: f64 = 0.75;
pub const DEFAULT_OUTPUT_DIR: &str = "output";
pub const DEFAULT_RESULTS_FILE: &str = "reconciled_terms.csv";
pub const DEFAULT_UNMATCHED_FILE: &str = "unmatched_terms.csv";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read configuration {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse configuration {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration: {message}")]
    Invalid { message: String },
}

impl ConfigError {
    fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    pub input: InputConfig,
    #[serde(rename = "source", default)]
    pub sources: Vec<SourceConfig>,
    #[serde(rename = "corpus", default)]
    pub corpora: Vec<CorpusConfig>,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub matching: MatchingConfig,
    /// Directory relative paths are resolved against.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct InputConfig {
    pub path: PathBuf,
    #[serde(default = "default_input_column")]
    pub column: String,
    #[serde(default)]
    pub delimiter: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SourceConfig {
    pub name: String,
    pub path: PathBuf,
    #[serde(default)]
    pub delimiter: Option<String>,
    pub label_column: String,
    #[serde(default)]
    pub synonym_column: Option<String>,
    #[serde(default = "default_synonym_delimiter")]
    pub synonym_delimiter: String,
    pub code_column: String,
    /// Regex locating the code inside the code column.
    #[serde(default)]
    pub code_pattern: Option<String>,
    /// Column carrying a concept id directly on each vocabulary row.
    #[serde(default)]
    pub concept_column: Option<String>,
    /// Tag for concept ids taken from `concept_column`; defaults to `name`.
    #[serde(default)]
    pub vocabulary: Option<String>,
    #[serde(default = "default_cutoff")]
    pub cutoff: f64,
    #[serde(default)]
    pub strategy: MatchStrategy,
    #[serde(default)]
    pub normalization: NormalizationPolicy,
    #[serde(default)]
    pub concepts: ConceptsConfig,
}

impl SourceConfig {
    pub fn vocabulary_tag(&self) -> &str {
        self.vocabulary.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizationPolicy {
    #[default]
    Minimal,
    Canonical,
}

impl NormalizationPolicy {
    pub const fn normalizer(self) -> Normalizer {
        match self {
            Self::Minimal => Normalizer::MINIMAL,
            Self::Canonical => Normalizer::CANONICAL,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ConceptsConfig {
    #[serde(default)]
    pub primary: Option<PrimaryConceptConfig>,
    #[serde(default)]
    pub fallback: Vec<FallbackConceptConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PrimaryConceptConfig {
    pub path: PathBuf,
    #[serde(default)]
    pub delimiter: Option<String>,
    pub code_column: String,
    pub concept_column: String,
    /// Tag reported with concepts from this table, e.g. "LOINC".
    pub vocabulary: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FallbackConceptConfig {
    pub path: PathBuf,
    #[serde(default)]
    pub delimiter: Option<String>,
    pub code_column: String,
    pub concept_column: String,
    pub vocabulary_column: String,
    pub allowed_vocabularies: Vec<String>,
    /// Tag reported with concepts from this table, e.g. "MEASUREMENT".
    pub label: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CorpusConfig {
    /// Defaults to the file name.
    #[serde(default)]
    pub name: Option<String>,
    pub path: PathBuf,
    #[serde(default)]
    pub delimiter: Option<String>,
}

impl CorpusConfig {
    pub fn display_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| {
            self.path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| self.path.display().to_string())
        })
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_results_file")]
    pub results: String,
    #[serde(default = "default_unmatched_file")]
    pub unmatched: String,
    #[serde(default)]
    pub summary_json: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            results: default_results_file(),
            unmatched: default_unmatched_file(),
            summary_json: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MatchingConfig {
    #[serde(default)]
    pub parallel: bool,
}

fn default_input_column() -> String {
    DEFAULT_INPUT_COLUMN.to_string()
}

fn default_synonym_delimiter() -> String {
    DEFAULT_SYNONYM_DELIMITER.to_string()
}

fn default_cutoff() -> f64 {
    DEFAULT_CUTOFF
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_DIR)
}

fn default_results_file() -> String {
    DEFAULT_RESULTS_FILE.to_string()
}

fn default_unmatched_file() -> String {
    DEFAULT_UNMATCHED_FILE.to_string()
}

impl RunConfig {
    /// Read, parse and validate a configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Self::parse(&contents, base_dir, path)
    }

    /// Parse configuration text; relative paths resolve against `base_dir`.
    pub fn from_toml_str(contents: &str, base_dir: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        Self::parse(contents, base_dir.into(), Path::new("<inline>"))
    }

    fn parse(contents: &str, base_dir: PathBuf, origin: &Path) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(contents).map_err(|source| ConfigError::Toml {
            path: origin.to_path_buf(),
            source,
        })?;
        config.base_dir = base_dir;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.sources.is_empty() {
            return Err(ConfigError::invalid(
                "at least one [[source]] section is required",
            ));
        }
        check_delimiter("input", self.input.delimiter.as_deref())?;
        let mut names: Vec<&str> = Vec::with_capacity(self.sources.len());
        for source in &self.sources {
            if source.name.trim().is_empty() {
                return Err(ConfigError::invalid("source name must not be empty"));
            }
            if names.contains(&source.name.as_str()) {
                return Err(ConfigError::invalid(format!(
                    "duplicate source name '{}'",
                    source.name
                )));
            }
            names.push(&source.name);
            if !(0.0..=1.0).contains(&source.cutoff) {
                return Err(ConfigError::invalid(format!(
                    "cutoff for source '{}' must be within [0, 1], got {}",
                    source.name, source.cutoff
                )));
            }
            check_delimiter(&source.name, source.delimiter.as_deref())?;
            if let Some(primary) = &source.concepts.primary {
                check_delimiter(&source.name, primary.delimiter.as_deref())?;
            }
            for fallback in &source.concepts.fallback {
                check_delimiter(&source.name, fallback.delimiter.as_deref())?;
                if fallback.allowed_vocabularies.is_empty() {
                    return Err(ConfigError::invalid(format!(
                        "fallback concept table {} for source '{}' allows no vocabularies",
                        fallback.path.display(),
                        source.name
                    )));
                }
            }
        }
        for corpus in &self.corpora {
            check_delimiter(&corpus.display_name(), corpus.delimiter.as_deref())?;
        }
        Ok(())
    }

    /// `path` joined onto the configuration directory unless absolute.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    /// Output directory, with an optional command-line override taken as
    /// given.
    pub fn output_dir(&self, override_dir: Option<&Path>) -> PathBuf {
        match override_dir {
            Some(dir) => dir.to_path_buf(),
            None => self.resolve(&self.output.dir),
        }
    }
}

/// Parsed delimiter byte, `None` meaning "infer from the file extension".
pub fn delimiter_byte(raw: Option<&str>) -> Option<u8> {
    raw.and_then(parse_delimiter)
}

fn check_delimiter(owner: &str, raw: Option<&str>) -> Result<(), ConfigError> {
    match raw {
        Some(value) if parse_delimiter(value).is_none() => Err(ConfigError::invalid(format!(
            "delimiter '{value}' for '{owner}' must be a single character or \"tab\""
        ))),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        [input]
        path = "echo_terms.csv"

        [[source]]
        name = "LOINC"
        path = "LOINC_CUI.csv"
        label_column = "Preferred Label"
        code_column = "Class ID"
    "#;

    #[test]
    fn defaults_are_applied() {
        let config = RunConfig::from_toml_str(MINIMAL, "/data/run").unwrap();
        assert_eq!(config.input.column, DEFAULT_INPUT_COLUMN);
        let source = &config.sources[0];
        assert_eq!(source.cutoff, DEFAULT_CUTOFF);
        assert_eq!(source.strategy, MatchStrategy::Cascade);
        assert_eq!(source.normalization, NormalizationPolicy::Minimal);
        assert_eq!(source.synonym_delimiter, "|");
        assert_eq!(source.vocabulary_tag(), "LOINC");
        assert_eq!(config.output.results, DEFAULT_RESULTS_FILE);
        assert!(!config.matching.parallel);
    }

    #[test]
    fn relative_paths_resolve_against_config_dir() {
        let config = RunConfig::from_toml_str(MINIMAL, "/data/run").unwrap();
        assert_eq!(
            config.resolve(&config.input.path),
            PathBuf::from("/data/run/echo_terms.csv")
        );
        assert_eq!(config.output_dir(None), PathBuf::from("/data/run/output"));
        assert_eq!(
            config.output_dir(Some(Path::new("elsewhere"))),
            PathBuf::from("elsewhere")
        );
    }

    #[test]
    fn cutoff_outside_unit_interval_is_rejected() {
        let text = format!("{MINIMAL}cutoff = 75.0\n");
        let err = RunConfig::from_toml_str(&text, ".").unwrap_err();
        assert!(err.to_string().contains("LOINC"));
    }

    #[test]
    fn missing_sources_are_rejected() {
        let err = RunConfig::from_toml_str("[input]\npath = \"terms.csv\"\n", ".").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let text = format!("{MINIMAL}\n[matching]\nthreads = 4\n");
        let err = RunConfig::from_toml_str(&text, ".").unwrap_err();
        assert!(matches!(err, ConfigError::Toml { .. }));
    }

    #[test]
    fn corpus_name_defaults_to_file_name() {
        let corpus = CorpusConfig {
            name: None,
            path: PathBuf::from("corpora/echo_valve.csv"),
            delimiter: None,
        };
        assert_eq!(corpus.display_name(), "echo_valve.csv");
    }
}
