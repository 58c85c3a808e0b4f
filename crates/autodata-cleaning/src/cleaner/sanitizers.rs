//! Data sanitization functions for cleaning values.

use crate::utils::{column_names, is_missing_marker};
use polars::prelude::*;
use tracing::debug;

/// Turn textual missing markers in string columns into nulls and trim the
/// remaining values. Returns the number of cells turned into nulls.
pub(crate) fn normalize_missing_markers(df: &mut DataFrame) -> PolarsResult<usize> {
    let mut replaced = 0;

    for col_name in column_names(df) {
        let series = df.column(&col_name)?.as_materialized_series().clone();
        if series.dtype() != &DataType::String {
            continue;
        }

        let str_series = series.str()?;
        let mut column_replaced = 0;
        let cleaned: Vec<Option<String>> = str_series
            .into_iter()
            .map(|opt_val| match opt_val {
                Some(val) if is_missing_marker(val) => {
                    column_replaced += 1;
                    None
                }
                Some(val) => Some(val.trim().to_string()),
                None => None,
            })
            .collect();

        if column_replaced > 0 {
            debug!(
                "Replaced {} missing markers in column '{}'",
                column_replaced, col_name
            );
        }
        replaced += column_replaced;

        let cleaned_series = Series::new(col_name.as_str().into(), cleaned);
        df.replace(&col_name, cleaned_series)?;
    }

    Ok(replaced)
}
