//! Excel workbook reading via calamine.

use super::columns_to_dataframe;
use crate::error::{CleaningError, Result, ResultExt};
use calamine::{Data, DataType as _, Range, Reader};
use polars::prelude::*;
use serde_json::Value;
use std::io::Cursor;
use std::path::Path;

/// Read the first worksheet of a local `.xlsx`/`.xls` file.
pub fn read_excel_path(path: &Path) -> Result<DataFrame> {
    let bytes = std::fs::read(path)
        .map_err(CleaningError::from)
        .context(format!("Reading {}", path.display()))?;
    read_excel_bytes(&bytes)
}

/// Read the first worksheet of an in-memory workbook. The first row is the
/// header.
pub fn read_excel_bytes(bytes: &[u8]) -> Result<DataFrame> {
    let cursor = Cursor::new(bytes.to_vec());
    let mut workbook = calamine::open_workbook_auto_from_rs(cursor)?;
    let sheet = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| CleaningError::InvalidData("workbook has no worksheets".to_string()))??;
    sheet_to_dataframe(&sheet)
}

fn sheet_to_dataframe(sheet: &Range<Data>) -> Result<DataFrame> {
    let (height, width) = sheet.get_size();
    if height == 0 || width == 0 {
        return Ok(DataFrame::empty());
    }

    let mut names = Vec::with_capacity(width);
    let mut columns = Vec::with_capacity(width);

    for col in 0..width {
        let header = sheet
            .get((0, col))
            .map(|cell| match cell {
                Data::Empty => String::new(),
                other => other.to_string().trim().to_string(),
            })
            .unwrap_or_default();
        names.push(header);

        let values: Vec<Value> = (1..height)
            .map(|row| sheet.get((row, col)).map(cell_to_json).unwrap_or(Value::Null))
            .collect();
        columns.push(values);
    }

    columns_to_dataframe(names, columns)
}

/// Convert one cell; dates become `YYYY-MM-DD HH:MM:SS` text.
fn cell_to_json(cell: &Data) -> Value {
    match cell {
        Data::Empty | Data::Error(_) => Value::Null,
        Data::Int(i) => Value::from(*i),
        Data::Float(f) => serde_json::Number::from_f64(*f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        Data::Bool(b) => Value::Bool(*b),
        Data::String(s) => Value::String(s.clone()),
        Data::DateTime(_) => cell
            .as_datetime()
            .map(|dt| Value::String(dt.format("%Y-%m-%d %H:%M:%S").to_string()))
            .unwrap_or(Value::Null),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Value::String(s.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_to_json() {
        assert_eq!(cell_to_json(&Data::Empty), Value::Null);
        assert_eq!(cell_to_json(&Data::Int(3)), Value::from(3));
        assert_eq!(cell_to_json(&Data::Float(2.5)), serde_json::json!(2.5));
        assert_eq!(
            cell_to_json(&Data::String("x".to_string())),
            Value::String("x".to_string())
        );
        assert_eq!(cell_to_json(&Data::Bool(true)), Value::Bool(true));
    }

    #[test]
    fn test_sheet_to_dataframe() {
        let mut range: Range<Data> = Range::new((0, 0), (2, 1));
        range.set_value((0, 0), Data::String("Name".to_string()));
        range.set_value((0, 1), Data::String("Score".to_string()));
        range.set_value((1, 0), Data::String("Ann".to_string()));
        range.set_value((1, 1), Data::Float(9.5));
        range.set_value((2, 0), Data::String("Bob".to_string()));

        let df = sheet_to_dataframe(&range).unwrap();
        assert_eq!(df.shape(), (2, 2));
        assert_eq!(df.column("Score").unwrap().dtype(), &DataType::Float64);
        assert_eq!(df.column("Score").unwrap().null_count(), 1);
    }

    #[test]
    fn test_read_excel_bytes_rejects_garbage() {
        let err = read_excel_bytes(b"definitely not a workbook").unwrap_err();
        assert!(err.is_client_error());
    }
}
