//! Dataset statistics used by reports, AI prompts and the CLI dry run.

use crate::error::Result;
use crate::types::DatasetStats;
use crate::utils::{column_names, is_numeric_dtype, row_keys};
use polars::prelude::*;
use std::collections::HashSet;

impl DatasetStats {
    /// Compute summary statistics for `df`.
    pub fn compute(df: &DataFrame) -> Result<Self> {
        let keys = row_keys(df)?;
        let mut seen = HashSet::with_capacity(keys.len());
        let duplicate_rows = keys.into_iter().filter(|k| !seen.insert(k.clone())).count();

        let missing_values = df.get_columns().iter().map(|c| c.null_count()).sum();

        let column_types = df
            .get_columns()
            .iter()
            .map(|c| (c.name().to_string(), c.dtype().to_string()))
            .collect();

        Ok(Self {
            total_rows: df.height(),
            total_columns: df.width(),
            missing_values,
            duplicate_rows,
            column_names: column_names(df),
            column_types,
        })
    }

    /// Total number of cells.
    pub fn total_cells(&self) -> usize {
        self.total_rows * self.total_columns
    }
}

/// Share of non-null cells, between 0.0 and 1.0. An empty frame scores 1.0.
pub fn data_quality_score(df: &DataFrame) -> f64 {
    let total = df.height() * df.width();
    if total == 0 {
        return 1.0;
    }
    let nulls: usize = df.get_columns().iter().map(|c| c.null_count()).sum();
    1.0 - nulls as f64 / total as f64
}

/// Names of the numeric columns of `df`, in column order.
pub fn numeric_columns(df: &DataFrame) -> Vec<String> {
    df.get_columns()
        .iter()
        .filter(|c| is_numeric_dtype(c.dtype()))
        .map(|c| c.name().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> DataFrame {
        df![
            "id" => [1i64, 2, 2, 3],
            "name" => [Some("a"), Some("b"), Some("b"), None],
            "score" => [Some(1.0), None, None, Some(4.0)],
        ]
        .unwrap()
    }

    #[test]
    fn test_compute_stats() {
        let stats = DatasetStats::compute(&sample()).unwrap();
        assert_eq!(stats.total_rows, 4);
        assert_eq!(stats.total_columns, 3);
        assert_eq!(stats.missing_values, 3);
        assert_eq!(stats.duplicate_rows, 1);
        assert_eq!(stats.column_names, vec!["id", "name", "score"]);
        assert_eq!(stats.column_types[0].0, "id");
        assert_eq!(stats.total_cells(), 12);
    }

    #[test]
    fn test_data_quality_score() {
        assert!((data_quality_score(&sample()) - 0.75).abs() < 1e-9);
        assert_eq!(data_quality_score(&DataFrame::empty()), 1.0);
    }

    #[test]
    fn test_numeric_columns() {
        assert_eq!(numeric_columns(&sample()), vec!["id", "score"]);
    }
}
