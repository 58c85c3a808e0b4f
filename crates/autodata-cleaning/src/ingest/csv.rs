//! CSV reading with progressively more forgiving fallbacks.

use crate::error::{CleaningError, Result, ResultExt};
use polars::prelude::*;
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

const SCHEMA_INFERENCE_ROWS: usize = 100;

/// Read a local CSV file.
pub fn read_csv_path(path: &Path) -> Result<DataFrame> {
    let bytes = std::fs::read(path)
        .map_err(CleaningError::from)
        .context(format!("Reading {}", path.display()))?;
    read_csv_bytes(&bytes)
}

/// Parse CSV content held in memory.
///
/// Tries standard parsing first, then parsing without quote handling, then
/// parsing pre-cleaned content. The error of the last attempt is returned if
/// all of them fail.
pub fn read_csv_bytes(bytes: &[u8]) -> Result<DataFrame> {
    // Strategy 1: Standard loading with quote handling
    match CsvReadOptions::default()
        .with_infer_schema_length(Some(SCHEMA_INFERENCE_ROWS))
        .with_has_header(true)
        .with_parse_options(CsvParseOptions::default().with_quote_char(Some(b'"')))
        .into_reader_with_file_handle(Cursor::new(bytes.to_vec()))
        .finish()
    {
        Ok(df) => return Ok(df),
        Err(e) => debug!("Standard CSV parsing failed: {}", e),
    }

    // Strategy 2: Without quote handling
    match CsvReadOptions::default()
        .with_infer_schema_length(Some(SCHEMA_INFERENCE_ROWS))
        .with_has_header(true)
        .with_parse_options(CsvParseOptions::default().with_quote_char(None))
        .into_reader_with_file_handle(Cursor::new(bytes.to_vec()))
        .finish()
    {
        Ok(df) => return Ok(df),
        Err(e) => debug!("CSV parsing without quotes failed: {}", e),
    }

    // Strategy 3: Pre-clean content
    let content = String::from_utf8_lossy(bytes);
    let cleaned = clean_csv_content(&content);
    CsvReadOptions::default()
        .with_infer_schema_length(Some(SCHEMA_INFERENCE_ROWS))
        .with_has_header(true)
        .into_reader_with_file_handle(Cursor::new(cleaned))
        .finish()
        .map_err(|e| CleaningError::InvalidData(format!("could not parse CSV: {}", e)))
}

/// Collapse doubled quotes and drop blank lines.
fn clean_csv_content(content: &str) -> String {
    content
        .replace("\"\"\"", "\"")
        .replace("\"\"", "\"")
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
