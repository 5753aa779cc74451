#![deny(unsafe_code)]

use crate::error::{ModelError, Result};
use crate::lookup::ColumnLookup;

/// An in-memory tabular source: one header row plus string cells.
///
/// Rows shorter than the header are treated as having empty trailing cells.
#[derive(Debug, Clone)]
pub struct Table {
    /// Display name used in error messages (usually the file name).
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    lookup: ColumnLookup,
}

impl Table {
    pub fn new(name: impl Into<String>, headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let lookup = ColumnLookup::new(&headers);
        Self {
            name: name.into(),
            headers,
            rows,
            lookup,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a required column.
    pub fn column_index(&self, column: &str) -> Result<usize> {
        if column.trim().is_empty() {
            return Err(ModelError::EmptyColumnName {
                table: self.name.clone(),
            });
        }
        self.lookup
            .get(column)
            .ok_or_else(|| ModelError::MissingColumn {
                table: self.name.clone(),
                column: column.to_string(),
            })
    }

    /// Position of an optional column. A configured name that is absent is
    /// still an error; only an unconfigured column yields `None`.
    pub fn optional_column_index(&self, column: Option<&str>) -> Result<Option<usize>> {
        column.map(|name| self.column_index(name)).transpose()
    }

    /// Cell value at `idx`, or the empty string for short rows.
    pub fn cell<'a>(row: &'a [String], idx: usize) -> &'a str {
        row.get(idx).map(String::as_str).unwrap_or("")
    }

    /// All values of one column in row order.
    pub fn column_values(&self, column: &str) -> Result<Vec<&str>> {
        let idx = self.column_index(column)?;
        Ok(self.rows.iter().map(|row| Self::cell(row, idx)).collect())
    }

    /// Each row joined with single spaces and lowercased.
    pub fn flattened_rows(&self) -> Vec<String> {
        self.rows
            .iter()
            .map(|row| row.join(" ").to_lowercase())
            .collect()
    }
}
