//! Delimited-file reader producing [`Table`]s.
//!
//! Headers are trimmed, inner whitespace is collapsed and a leading byte
//! order mark is dropped. Cells are trimmed. Rows whose cells are all empty
//! are skipped. Column lookup on the resulting table is case-insensitive,
//! so callers never depend on the exact header spelling of a file.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::ReaderBuilder;
use tracing::debug;

use vocab_model::Table;

use crate::error::IngestError;

/// Field delimiter to use for `path` when none is configured.
///
/// `.tsv`, `.tab` and `.txt` files are tab-separated, everything else is
/// comma-separated.
pub fn infer_delimiter(path: &Path) -> u8 {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("tsv" | "tab" | "txt") => b'\t',
        _ => b',',
    }
}

/// Parse a configured delimiter such as `","`, `"\t"` or `"tab"`.
pub fn parse_delimiter(raw: &str) -> Option<u8> {
    match raw {
        "\\t" | "\t" => Some(b'\t'),
        other if other.eq_ignore_ascii_case("tab") => Some(b'\t'),
        other if other.len() == 1 => other.bytes().next(),
        _ => None,
    }
}

fn normalize_header(raw: &str) -> String {
    raw.trim()
        .trim_matches('\u{feff}')
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn normalize_cell(raw: &str) -> String {
    raw.trim().trim_matches('\u{feff}').to_string()
}

/// Read a delimited file. The first non-empty row is the header.
pub fn read_table(path: &Path, delimiter: Option<u8>) -> Result<Table, IngestError> {
    let file = File::open(path).map_err(|source| IngestError::io(path, source))?;
    let delimiter = delimiter.unwrap_or_else(|| infer_delimiter(path));
    let name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default()
        .to_string();
    let table = read_table_from(&name, file, delimiter)
        .map_err(|source| IngestError::csv(path, source))?;
    debug!(
        table = %table.name,
        columns = table.headers.len(),
        rows = table.len(),
        "table loaded"
    );
    Ok(table)
}

/// Read a delimited table from any reader; `name` labels the table in errors.
pub fn read_table_from<R: Read>(name: &str, reader: R, delimiter: u8) -> Result<Table, csv::Error> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(reader);

    let mut headers: Option<Vec<String>> = None;
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.iter().all(|value| value.trim().is_empty()) {
            continue;
        }
        match headers {
            None => headers = Some(record.iter().map(normalize_header).collect()),
            Some(_) => rows.push(record.iter().map(normalize_cell).collect()),
        }
    }

    Ok(Table::new(name, headers.unwrap_or_default(), rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infers_tab_for_tsv() {
        assert_eq!(infer_delimiter(Path::new("valve.tsv")), b'\t');
        assert_eq!(infer_delimiter(Path::new("valve.TXT")), b'\t');
        assert_eq!(infer_delimiter(Path::new("loinc_omop.csv")), b',');
    }

    #[test]
    fn parses_configured_delimiters() {
        assert_eq!(parse_delimiter("\\t"), Some(b'\t'));
        assert_eq!(parse_delimiter("TAB"), Some(b'\t'));
        assert_eq!(parse_delimiter(";"), Some(b';'));
        assert_eq!(parse_delimiter("||"), None);
    }

    #[test]
    fn reads_headers_and_skips_blank_rows() {
        let data = "\u{feff}Preferred  Label ,CLASS ID\n\nEjection fraction , LNC/10230-1\n,\nHeart rate\n";
        let table = read_table_from("LOINC_CUI.csv", data.as_bytes(), b',').unwrap();
        assert_eq!(table.headers, vec!["Preferred Label", "CLASS ID"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0], vec!["Ejection fraction", "LNC/10230-1"]);
        assert_eq!(table.rows[1], vec!["Heart rate"]);
        assert_eq!(table.column_index("preferred label").unwrap(), 0);
    }

    #[test]
    fn empty_input_yields_empty_table() {
        let table = read_table_from("empty.csv", "".as_bytes(), b',').unwrap();
        assert!(table.headers.is_empty());
        assert!(table.is_empty());
    }
}
