//! Type conversion functions for data cleaning.
//!
//! Conversions are coercing: a value that cannot be represented in the target
//! type becomes null instead of failing the whole column.

use crate::types::ColumnType;
use crate::utils::{is_numeric_dtype, parse_boolean_string, parse_numeric_string};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use polars::prelude::*;

/// Date-time layouts accepted when parsing text, tried in order.
const DATETIME_FORMATS: [&str; 6] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
];

/// Date-only layouts accepted when parsing text, tried in order.
const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d/%m/%Y"];

/// Convert a column to the requested type.
pub(crate) fn convert_series(series: &Series, target: ColumnType) -> PolarsResult<Series> {
    let dtype = series.dtype().clone();
    match target {
        ColumnType::Int => {
            if is_numeric_dtype(&dtype) || dtype == DataType::Boolean {
                series.cast(&DataType::Int64)
            } else {
                let vals: Vec<Option<i64>> = string_values(series)?
                    .into_iter()
                    .map(|v| v.and_then(|s| parse_numeric_string(&s)).and_then(float_to_i64))
                    .collect();
                Ok(Series::new(series.name().clone(), vals))
            }
        }
        ColumnType::Float => {
            if is_numeric_dtype(&dtype) || dtype == DataType::Boolean {
                series.cast(&DataType::Float64)
            } else {
                let vals: Vec<Option<f64>> = string_values(series)?
                    .into_iter()
                    .map(|v| v.and_then(|s| parse_numeric_string(&s)))
                    .collect();
                Ok(Series::new(series.name().clone(), vals))
            }
        }
        ColumnType::String => series.cast(&DataType::String),
        ColumnType::Boolean => {
            if dtype == DataType::Boolean {
                Ok(series.clone())
            } else if is_numeric_dtype(&dtype) {
                let floats = series.cast(&DataType::Float64)?;
                let vals: Vec<Option<bool>> =
                    floats.f64()?.into_iter().map(|v| v.map(|x| x != 0.0)).collect();
                Ok(Series::new(series.name().clone(), vals))
            } else {
                let vals: Vec<Option<bool>> = string_values(series)?
                    .into_iter()
                    .map(|v| v.and_then(|s| parse_boolean_string(&s)))
                    .collect();
                Ok(Series::new(series.name().clone(), vals))
            }
        }
        ColumnType::Datetime => {
            let target_dtype = ColumnType::Datetime.dtype();
            if matches!(dtype, DataType::Datetime(_, _) | DataType::Date) {
                return series.cast(&target_dtype);
            }

            let millis: Vec<Option<i64>> = if is_numeric_dtype(&dtype) {
                // Numbers are read as Unix timestamps in milliseconds
                let floats = series.cast(&DataType::Float64)?;
                floats
                    .f64()?
                    .into_iter()
                    .map(|v| v.filter(|x| x.is_finite()).map(|x| x as i64))
                    .collect()
            } else {
                string_values(series)?
                    .into_iter()
                    .map(|v| {
                        v.and_then(|s| parse_datetime_str(&s))
                            .map(|dt| dt.and_utc().timestamp_millis())
                    })
                    .collect()
            };

            Series::new(series.name().clone(), millis).cast(&target_dtype)
        }
    }
}

/// Truncate toward zero; values outside the `i64` range have no integer form.
fn float_to_i64(f: f64) -> Option<i64> {
    // i64::MAX as f64 rounds up to 2^63, so the upper bound is exclusive
    (f.is_finite() && f >= i64::MIN as f64 && f < i64::MAX as f64).then_some(f as i64)
}

/// Text of every value, with nulls preserved.
fn string_values(series: &Series) -> PolarsResult<Vec<Option<String>>> {
    let as_str = series.cast(&DataType::String)?;
    Ok(as_str
        .str()?
        .into_iter()
        .map(|v| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()))
        .collect())
}

/// Parse a date or date-time string in one of the common layouts.
pub(crate) fn parse_datetime_str(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }

    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }

    None
}
