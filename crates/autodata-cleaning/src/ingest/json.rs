//! JSON records to DataFrame conversion with per-column dtype inference.

use super::columns_to_dataframe;
use crate::error::{CleaningError, Result};
use polars::prelude::*;
use serde_json::Value;

/// Convert a JSON payload into a frame.
///
/// Accepts an array of objects (columns in order of first appearance, absent
/// keys become null) or an object of equal-length arrays.
pub fn records_to_dataframe(payload: &Value) -> Result<DataFrame> {
    match payload {
        Value::Array(rows) => array_of_objects(rows),
        Value::Object(map) if map.values().all(Value::is_array) => {
            let mut names = Vec::with_capacity(map.len());
            let mut columns = Vec::with_capacity(map.len());
            let mut height = None;

            for (name, values) in map {
                let values = values.as_array().cloned().unwrap_or_default();
                match height {
                    None => height = Some(values.len()),
                    Some(h) if h != values.len() => {
                        return Err(CleaningError::InvalidData(format!(
                            "column '{}' has {} values, expected {}",
                            name,
                            values.len(),
                            h
                        )));
                    }
                    Some(_) => {}
                }
                names.push(name.clone());
                columns.push(values);
            }

            columns_to_dataframe(names, columns)
        }
        Value::Object(_) => Err(CleaningError::InvalidData(
            "expected a list of records or an object of columns".to_string(),
        )),
        other => Err(CleaningError::InvalidData(format!(
            "expected a list of records, got {}",
            json_kind(other)
        ))),
    }
}

fn array_of_objects(rows: &[Value]) -> Result<DataFrame> {
    let mut names: Vec<String> = Vec::new();
    for (i, row) in rows.iter().enumerate() {
        let obj = row.as_object().ok_or_else(|| {
            CleaningError::InvalidData(format!(
                "record {} is {}, expected an object",
                i,
                json_kind(row)
            ))
        })?;
        for key in obj.keys() {
            if !names.iter().any(|n| n == key) {
                names.push(key.clone());
            }
        }
    }

    let columns = names
        .iter()
        .map(|name| {
            rows.iter()
                .map(|row| row.get(name).cloned().unwrap_or(Value::Null))
                .collect()
        })
        .collect();

    columns_to_dataframe(names, columns)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Build a Series from JSON values, choosing the narrowest dtype that holds
/// every non-null value.
///
/// All-integer columns become Int64, numeric columns Float64, all-boolean
/// columns Boolean. Anything else (strings, nested values, booleans mixed with
/// numbers) becomes a String column; nested values keep their JSON text.
pub fn json_values_to_series(name: &str, values: &[Value]) -> Series {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Target {
        String,
        Boolean,
        Float64,
        Int64,
    }

    let mut has_bool = false;
    let mut has_number = false;
    let mut has_float = false;
    let mut has_other = false;

    for v in values {
        match v {
            Value::Null => {}
            Value::Bool(_) => has_bool = true,
            Value::Number(n) => {
                has_number = true;
                if n.as_i64().is_none() {
                    has_float = true;
                }
            }
            _ => {
                has_other = true;
                break;
            }
        }
    }

    let target = if has_other || (has_bool && has_number) {
        Target::String
    } else if has_number {
        if has_float { Target::Float64 } else { Target::Int64 }
    } else if has_bool {
        Target::Boolean
    } else {
        Target::String
    };

    match target {
        Target::Int64 => {
            let vals: Vec<Option<i64>> = values.iter().map(Value::as_i64).collect();
            Series::new(name.into(), vals)
        }
        Target::Float64 => {
            let vals: Vec<Option<f64>> = values.iter().map(Value::as_f64).collect();
            Series::new(name.into(), vals)
        }
        Target::Boolean => {
            let vals: Vec<Option<bool>> = values.iter().map(Value::as_bool).collect();
            Series::new(name.into(), vals)
        }
        Target::String => {
            let vals: Vec<Option<String>> = values
                .iter()
                .map(|v| match v {
                    Value::Null => None,
                    Value::String(s) => Some(s.clone()),
                    other => Some(other.to_string()),
                })
                .collect();
            Series::new(name.into(), vals)
        }
    }
}
