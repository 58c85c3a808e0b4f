//! Missing value handling for single columns.

use crate::config::MissingValueStrategy;
use crate::utils::{is_integer_dtype, is_numeric_dtype};
use polars::prelude::*;
use std::cmp::Ordering;

/// Apply a strategy to one column, returning a description of what was done.
///
/// `Drop` filters rows of the whole frame; the other strategies replace the
/// column. Columns without nulls are left untouched and yield `None`.
pub(crate) fn handle_column(
    df: &mut DataFrame,
    column: &str,
    strategy: MissingValueStrategy,
) -> PolarsResult<Option<String>> {
    let series = df.column(column)?.as_materialized_series().clone();
    let null_count = series.null_count();
    if null_count == 0 {
        return Ok(None);
    }

    let numeric = is_numeric_dtype(series.dtype());
    let message = match strategy {
        MissingValueStrategy::Mean | MissingValueStrategy::Median if numeric => {
            let stat = if strategy == MissingValueStrategy::Mean {
                series.mean()
            } else {
                series.median()
            };
            let Some(value) = stat else {
                return Ok(None);
            };
            df.replace(column, fill_numeric_nulls(&series, value)?)?;
            format!(
                "Filled {} missing values in '{}' with {} ({:.4})",
                null_count,
                column,
                strategy.as_str(),
                value
            )
        }
        MissingValueStrategy::Mean | MissingValueStrategy::Median => {
            let filled = series.fill_null(FillNullStrategy::Forward(None))?;
            df.replace(column, filled)?;
            format!(
                "Column '{}' is not numeric; forward-filled {} missing values instead of {}",
                column,
                null_count,
                strategy.as_str()
            )
        }
        MissingValueStrategy::Mode => {
            let Some(filled) = fill_with_mode(&series)? else {
                return Ok(None);
            };
            df.replace(column, filled)?;
            format!(
                "Filled {} missing values in '{}' with the most frequent value",
                null_count, column
            )
        }
        MissingValueStrategy::Drop => {
            let before = df.height();
            let mask = series.is_not_null();
            *df = df.filter(&mask)?;
            format!(
                "Dropped {} rows with missing '{}'",
                before - df.height(),
                column
            )
        }
        MissingValueStrategy::ForwardFill => {
            let filled = series.fill_null(FillNullStrategy::Forward(None))?;
            let remaining = filled.null_count();
            df.replace(column, filled)?;
            format!(
                "Forward-filled {} missing values in '{}'",
                null_count - remaining,
                column
            )
        }
        MissingValueStrategy::BackwardFill => {
            let filled = series.fill_null(FillNullStrategy::Backward(None))?;
            let remaining = filled.null_count();
            df.replace(column, filled)?;
            format!(
                "Backward-filled {} missing values in '{}'",
                null_count - remaining,
                column
            )
        }
    };

    Ok(Some(message))
}

/// Fill null values in a numeric Series with a specific value.
fn fill_numeric_nulls(series: &Series, fill_value: f64) -> PolarsResult<Series> {
    let floats = series.cast(&DataType::Float64)?;
    let filled: Vec<Option<f64>> = floats
        .f64()?
        .into_iter()
        .map(|v| Some(v.unwrap_or(fill_value)))
        .collect();
    Ok(Series::new(series.name().clone(), filled))
}

/// Fill nulls with the most frequent value; ties go to the smallest value.
fn fill_with_mode(series: &Series) -> PolarsResult<Option<Series>> {
    let dtype = series.dtype().clone();

    if is_numeric_dtype(&dtype) {
        let floats = series.cast(&DataType::Float64)?;
        let mut values: Vec<f64> = floats.f64()?.into_iter().flatten().collect();
        values.sort_by(|a, b| a.total_cmp(b));
        let Some(mode) = most_frequent(&values, |a, b| a.total_cmp(b)) else {
            return Ok(None);
        };
        let filled = fill_numeric_nulls(series, mode)?;
        return if is_integer_dtype(&dtype) {
            filled.cast(&dtype).map(Some)
        } else {
            Ok(Some(filled))
        };
    }

    if dtype == DataType::Boolean {
        let ca = series.bool()?;
        let trues = ca.into_iter().filter(|v| *v == Some(true)).count();
        let falses = ca.into_iter().filter(|v| *v == Some(false)).count();
        if trues + falses == 0 {
            return Ok(None);
        }
        let mode = trues > falses;
        let filled: Vec<Option<bool>> = ca.into_iter().map(|v| Some(v.unwrap_or(mode))).collect();
        return Ok(Some(Series::new(series.name().clone(), filled)));
    }

    // Dates and times: mode of the physical integers, then back to the logical type
    if dtype.is_temporal() {
        let physical = series.to_physical_repr().cast(&DataType::Int64)?;
        let ca = physical.i64()?;
        let mut values: Vec<i64> = ca.into_iter().flatten().collect();
        values.sort_unstable();
        let Some(mode) = most_frequent(&values, |a, b| a.cmp(b)) else {
            return Ok(None);
        };
        let filled: Vec<Option<i64>> = ca.into_iter().map(|v| Some(v.unwrap_or(mode))).collect();
        return Series::new(series.name().clone(), filled)
            .cast(&dtype.to_physical())?
            .cast(&dtype)
            .map(Some);
    }

    // Strings and everything else go through their text form
    let as_str = series.cast(&DataType::String)?;
    let ca = as_str.str()?;
    let mut values: Vec<&str> = ca.into_iter().flatten().collect();
    values.sort_unstable();
    let Some(mode) = most_frequent(&values, |a, b| a.cmp(b)) else {
        return Ok(None);
    };
    let mode = mode.to_string();
    let filled: Vec<Option<String>> = ca
        .into_iter()
        .map(|v| Some(v.map(str::to_string).unwrap_or_else(|| mode.clone())))
        .collect();
    let filled = Series::new(series.name().clone(), filled);

    if dtype == DataType::String {
        Ok(Some(filled))
    } else {
        filled.cast(&dtype).map(Some)
    }
}

/// Most frequent value of a sorted slice. The first run wins ties, so the
/// result is the smallest of the most frequent values.
fn most_frequent<T: Copy>(sorted: &[T], cmp: impl Fn(&T, &T) -> Ordering) -> Option<T> {
    let mut best: Option<(T, usize)> = None;
    let mut i = 0;
    while i < sorted.len() {
        let mut j = i + 1;
        while j < sorted.len() && cmp(&sorted[i], &sorted[j]) == Ordering::Equal {
            j += 1;
        }
        let run = j - i;
        if best.is_none_or(|(_, count)| run > count) {
            best = Some((sorted[i], run));
        }
        i = j;
    }
    best.map(|(value, _)| value)
}
