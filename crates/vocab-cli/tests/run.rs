//! End-to-end runs over small on-disk fixtures.

use std::fs;
use std::path::{Path, PathBuf};

use vocab_cli::commands::{run_check, run_reconcile};
use vocab_cli::config::RunConfig;
use vocab_cli::types::RunOptions;
use vocab_model::MatchType;

const CONFIG: &str = r#"
[input]
path = "echo_terms.csv"

[[source]]
name = "LOINC"
path = "vocab/LOINC_CUI.csv"
label_column = "Preferred Label"
synonym_column = "Synonyms"
code_column = "Class ID"
code_pattern = '([0-9\-]+)$'
cutoff = 0.75

[source.concepts]
primary = { path = "vocab/loinc_omop.csv", code_column = "LOINC", concept_column = "CONCEPT_ID", vocabulary = "LOINC" }
fallback = [
    { path = "vocab/CONCEPT.csv", code_column = "CONCEPT_CODE", concept_column = "CONCEPT_ID", vocabulary_column = "VOCABULARY_ID", allowed_vocabularies = ["loinc"], label = "MEASUREMENT" },
]

[[source]]
name = "SNOMED"
path = "vocab/snomed_omop.csv"
label_column = "CONCEPT_NAME"
code_column = "CONCEPT_CODE"
concept_column = "CONCEPT_ID"

[[corpus]]
path = "corpora/echo_misc.tsv"

[output]
summary_json = "summary.json"
"#;

fn write(dir: &Path, name: &str, contents: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create fixture dir");
    }
    fs::write(path, contents).expect("write fixture");
}

fn fixture(config: &str) -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("temp dir");
    let root = dir.path();
    write(
        root,
        "echo_terms.csv",
        "DISPLAY_NAME\nEjection  Fraction\nLVEF\nAortic root diameter\nzzzz\nLVEF\n",
    );
    write(
        root,
        "vocab/LOINC_CUI.csv",
        "Class ID,Preferred Label,Synonyms\n\
         http://purl.bioontology.org/ontology/LNC/10230-1,Ejection fraction,EF\n\
         http://purl.bioontology.org/ontology/LNC/18043-0,Left ventricular Ejection fraction,LVEF|LV EF\n",
    );
    write(root, "vocab/loinc_omop.csv", "LOINC,CONCEPT_ID\n10230-1,3040044\n");
    write(
        root,
        "vocab/CONCEPT.csv",
        "CONCEPT_ID,CONCEPT_CODE,VOCABULARY_ID\n9999,10230-1,LOINC\n3020460,18043-0,LOINC\n",
    );
    write(
        root,
        "vocab/snomed_omop.csv",
        "CONCEPT_ID,CONCEPT_NAME,CONCEPT_CODE\n4164783,Aortic root diameter,251024002\n",
    );
    write(root, "corpora/echo_misc.tsv", "NAME\tNOTE\nzzzz\tplaceholder\n");
    let config_path = root.join("reconcile.toml");
    fs::write(&config_path, config).expect("write config");
    (dir, config_path)
}

#[test]
fn run_writes_results_unmatched_and_summary() {
    let (dir, config_path) = fixture(CONFIG);
    let report = run_reconcile(&config_path, &RunOptions::default()).expect("run");

    let outputs = report.outputs.expect("outputs written");
    assert_eq!(outputs.results, dir.path().join("output/reconciled_terms.csv"));

    let results = fs::read_to_string(&outputs.results).expect("read results");
    insta::assert_snapshot!(results.trim_end(), @r###"
    DISPLAY_NAME,MATCHED_TERM,CODE,CONCEPT_ID,CONCEPT_VOCAB,MATCH_SOURCE,MATCH_TYPE,FUZZY_SCORE,VALIDATED_IN
    Ejection  Fraction,Ejection fraction,10230-1,3040044,LOINC,LOINC,exact,100,Not Found
    LVEF,Left ventricular Ejection fraction,18043-0,3020460,MEASUREMENT,LOINC,exact,100,Not Found
    Aortic root diameter,Aortic root diameter,251024002,4164783,SNOMED,SNOMED,exact,100,Not Found
    zzzz,,,,,SNOMED,unmatched,0,echo_misc.tsv
    LVEF,Left ventricular Ejection fraction,18043-0,3020460,MEASUREMENT,LOINC,exact,100,Not Found
    "###);

    let unmatched = fs::read_to_string(&outputs.unmatched).expect("read unmatched");
    assert_eq!(unmatched.lines().count(), 2);
    assert!(unmatched.lines().nth(1).unwrap().starts_with("zzzz,"));

    let summary_path = outputs.summary_json.expect("summary path");
    let summary: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(summary_path).expect("read summary"))
            .expect("summary json");
    assert_eq!(summary["total_rows"], 5);
    assert_eq!(summary["unique_terms"], 4);
    assert_eq!(summary["matched"], 4);
    assert_eq!(summary["by_match_type"]["exact"], 4);
    assert_eq!(summary["validated"][0]["corpus"], "echo_misc.tsv");
}

#[test]
fn dry_run_writes_nothing() {
    let (dir, config_path) = fixture(CONFIG);
    let options = RunOptions {
        dry_run: true,
        ..RunOptions::default()
    };
    let report = run_reconcile(&config_path, &options).expect("dry run");
    assert!(report.outputs.is_none());
    assert_eq!(report.summary.unmatched, 1);
    assert_eq!(report.summary.match_type_count(MatchType::Unmatched), 1);
    assert!(!dir.path().join("output").exists());
}

#[test]
fn parallel_run_produces_identical_files() {
    let (dir, config_path) = fixture(CONFIG);
    let sequential = run_reconcile(
        &config_path,
        &RunOptions {
            output_dir: Some(dir.path().join("seq")),
            ..RunOptions::default()
        },
    )
    .expect("sequential run");
    let parallel = run_reconcile(
        &config_path,
        &RunOptions {
            output_dir: Some(dir.path().join("par")),
            parallel: true,
            ..RunOptions::default()
        },
    )
    .expect("parallel run");

    let read = |path: &Path| fs::read(path).expect("read output");
    let seq = sequential.outputs.expect("seq outputs");
    let par = parallel.outputs.expect("par outputs");
    assert_eq!(read(&seq.results), read(&par.results));
    assert_eq!(read(&seq.unmatched), read(&par.unmatched));
}

#[test]
fn check_reports_tables_and_sources() {
    let (_dir, config_path) = fixture(CONFIG);
    let report = run_check(&config_path).expect("check");
    assert_eq!(report.terms, 5);
    let roles: Vec<&str> = report.tables.iter().map(|t| t.role.as_str()).collect();
    assert_eq!(
        roles,
        vec![
            "input",
            "source LOINC",
            "concepts LOINC",
            "concepts MEASUREMENT",
            "source SNOMED",
            "corpus echo_misc.tsv",
        ]
    );
    assert_eq!(report.sources.len(), 2);
    assert_eq!(report.sources[0].entries, 5);
    assert_eq!(report.sources[0].strategy, "cascade");
}

#[test]
fn missing_column_fails_with_table_and_column() {
    let config = CONFIG.replace("label_column = \"CONCEPT_NAME\"", "label_column = \"NAME\"");
    let (_dir, config_path) = fixture(&config);
    let err = run_check(&config_path).unwrap_err();
    let message = format!("{err:#}");
    assert!(message.contains("SNOMED"), "{message}");
    assert!(message.contains("snomed_omop.csv"), "{message}");
    assert!(message.contains("'NAME'"), "{message}");
}

#[test]
fn config_paths_resolve_next_to_the_file() {
    let (dir, config_path) = fixture(CONFIG);
    let config = RunConfig::load(&config_path).expect("load config");
    assert_eq!(config.base_dir, dir.path());
    assert_eq!(config.resolve(&config.input.path), dir.path().join("echo_terms.csv"));
    assert_eq!(config.sources.len(), 2);
    assert_eq!(config.corpora[0].display_name(), "echo_misc.tsv");
}
