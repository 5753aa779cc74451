use std::fs;

use vocab_ingest::{IngestError, read_table, write_results, write_results_to};
use vocab_model::{ConceptRef, MatchResult, MatchType, MatchedEntry, NOT_FOUND};

fn sample_results() -> Vec<MatchResult> {
    vec![
        MatchResult::matched(
            "Ejection Fraction",
            "LOINC",
            MatchedEntry {
                label: "Ejection fraction".to_string(),
                code: Some("10230-1".to_string()),
                concept_id: None,
                match_type: MatchType::Exact,
                score: 100,
            },
            Some(ConceptRef {
                concept_id: "3040044".to_string(),
                vocabulary: "LOINC".to_string(),
            }),
            "ejection_fraction.csv",
        ),
        MatchResult::unmatched("Mitral, E/A", "SNOMED", NOT_FOUND),
    ]
}

#[test]
fn reads_tab_separated_file_by_extension() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("valve.tsv");
    fs::write(&path, "concept_id\tconcept_name\n4103295\tMitral valve\n").expect("write file");

    let table = read_table(&path, None).expect("read table");
    assert_eq!(table.name, "valve.tsv");
    assert_eq!(table.headers, vec!["concept_id", "concept_name"]);
    assert_eq!(table.rows, vec![vec!["4103295", "Mitral valve"]]);
}

#[test]
fn missing_file_reports_path() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("absent.csv");
    let err = read_table(&path, None).unwrap_err();
    assert!(matches!(err, IngestError::Io { .. }));
    assert!(err.to_string().contains("absent.csv"));
}

#[test]
fn results_csv_layout() {
    let mut buffer = Vec::new();
    write_results_to(&mut buffer, &sample_results()).expect("write results");
    let text = String::from_utf8(buffer).expect("utf8");
    insta::assert_snapshot!(text.trim_end(), @r###"
    DISPLAY_NAME,MATCHED_TERM,CODE,CONCEPT_ID,CONCEPT_VOCAB,MATCH_SOURCE,MATCH_TYPE,FUZZY_SCORE,VALIDATED_IN
    Ejection Fraction,Ejection fraction,10230-1,3040044,LOINC,LOINC,exact,100,ejection_fraction.csv
    "Mitral, E/A",,,,,SNOMED,unmatched,0,Not Found
    "###);
}

#[test]
fn empty_results_still_have_header() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("unmatched_terms.csv");
    write_results(&path, &[]).expect("write results");
    let text = fs::read_to_string(&path).expect("read back");
    assert_eq!(
        text,
        "DISPLAY_NAME,MATCHED_TERM,CODE,CONCEPT_ID,CONCEPT_VOCAB,MATCH_SOURCE,MATCH_TYPE,FUZZY_SCORE,VALIDATED_IN\n"
    );
}

#[test]
fn written_results_read_back_as_table() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("reconciled_terms.csv");
    write_results(&path, &sample_results()).expect("write results");

    let table = read_table(&path, None).expect("read back");
    assert_eq!(table.len(), 2);
    let types = table.column_values("match_type").expect("MATCH_TYPE column");
    assert_eq!(types, vec!["exact", "unmatched"]);
    let names = table.column_values("DISPLAY_NAME").expect("DISPLAY_NAME column");
    assert_eq!(names, vec!["Ejection Fraction", "Mitral, E/A"]);
}
