//! Data ingestion: turning CSV, Excel, JSON, remote APIs and database
//! queries into a [`DataFrame`], and turning frames back into JSON records.

mod csv;
mod excel;
mod json;
#[cfg(feature = "remote")]
mod remote;

pub use csv::{read_csv_bytes, read_csv_path};
pub use excel::{read_excel_bytes, read_excel_path};
pub use json::{json_values_to_series, records_to_dataframe};
#[cfg(feature = "remote")]
pub use remote::{API_TIMEOUT, fetch_from_api, load_from_database};

use crate::error::{CleaningError, Result};
use crate::utils::row_to_json;
use polars::prelude::*;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::path::Path;

/// Kind of an uploaded or local file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Csv,
    Excel,
}

impl FileKind {
    /// Detect the file kind from its name (case-insensitive extension).
    pub fn from_filename(name: &str) -> Result<Self> {
        let lower = name.trim().to_lowercase();
        if lower.ends_with(".csv") {
            Ok(Self::Csv)
        } else if lower.ends_with(".xlsx") || lower.ends_with(".xls") {
            Ok(Self::Excel)
        } else {
            Err(CleaningError::UnsupportedFileType(name.to_string()))
        }
    }
}

/// Read an in-memory file of the given kind.
pub fn read_bytes(kind: FileKind, bytes: &[u8]) -> Result<DataFrame> {
    match kind {
        FileKind::Csv => read_csv_bytes(bytes),
        FileKind::Excel => read_excel_bytes(bytes),
    }
}

/// Read a local CSV or Excel file, choosing the reader by extension.
pub fn read_path(path: &Path) -> Result<DataFrame> {
    let name = path.to_string_lossy();
    match FileKind::from_filename(&name)? {
        FileKind::Csv => read_csv_path(path),
        FileKind::Excel => read_excel_path(path),
    }
}

/// Render every row as a JSON object keyed by column name.
pub fn dataframe_to_records(df: &DataFrame) -> Result<Vec<Map<String, Value>>> {
    let mut records = Vec::with_capacity(df.height());
    for row in 0..df.height() {
        records.push(row_to_json(df, row)?);
    }
    Ok(records)
}

/// Build a frame from column-major JSON values, inferring each column's dtype.
pub(crate) fn columns_to_dataframe(
    names: Vec<String>,
    columns: Vec<Vec<Value>>,
) -> Result<DataFrame> {
    let names = unique_header_names(names);
    let columns: Vec<Column> = names
        .iter()
        .zip(columns.iter())
        .map(|(name, values)| Column::from(json_values_to_series(name, values)))
        .collect();

    if columns.is_empty() {
        return Ok(DataFrame::empty());
    }
    Ok(DataFrame::new(columns)?)
}

/// Make header names usable as column names: blanks get a positional name and
/// repeats get a numeric suffix.
pub(crate) fn unique_header_names(names: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut result = Vec::with_capacity(names.len());

    for (i, name) in names.into_iter().enumerate() {
        let base = if name.trim().is_empty() {
            format!("column_{}", i)
        } else {
            name
        };

        let mut candidate = base.clone();
        let mut n = 1;
        while !seen.insert(candidate.clone()) {
            candidate = format!("{}_{}", base, n);
            n += 1;
        }
        result.push(candidate);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_kind_from_filename() {
        assert_eq!(FileKind::from_filename("data.csv").unwrap(), FileKind::Csv);
        assert_eq!(FileKind::from_filename("DATA.XLSX").unwrap(), FileKind::Excel);
        assert_eq!(FileKind::from_filename("old.xls").unwrap(), FileKind::Excel);

        let err = FileKind::from_filename("notes.txt").unwrap_err();
        assert!(matches!(err, CleaningError::UnsupportedFileType(_)));
        assert!(err.is_client_error());
    }

    #[test]
    fn test_unique_header_names() {
        let names = vec![
            "a".to_string(),
            "".to_string(),
            "a".to_string(),
            "a".to_string(),
        ];
        assert_eq!(
            unique_header_names(names),
            vec!["a", "column_1", "a_1", "a_2"]
        );
    }

    #[test]
    fn test_dataframe_to_records() {
        let df = df![
            "name" => [Some("Ann"), None],
            "score" => [Some(1.5), Some(2.0)],
        ]
        .unwrap();

        let records = dataframe_to_records(&df).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["name"], Value::String("Ann".to_string()));
        assert_eq!(records[1]["name"], Value::Null);
        assert_eq!(records[1]["score"], serde_json::json!(2.0));
    }
}
