//! Rule-based data cleaning.
//!
//! This module provides functionality for:
//! - Removing duplicate rows
//! - Handling missing values (mean, median, mode, drop, forward/backward fill)
//! - Coercing column types
//! - Standardizing column names
//! - Normalizing textual missing markers
//! - Removing or capping outliers
//!
//! Every operation appends a human-readable entry to the cleaner's step log.

mod converters;
mod missing;
mod names;
mod outliers;
mod sanitizers;

pub(crate) use names::clean_column_name;

use crate::config::{MissingValueStrategy, OutlierAction, OutlierMethod};
use crate::error::{CleaningError, Result, ResultExt};
use crate::types::ColumnType;
use crate::utils::{column_names, is_numeric_dtype, row_keys};
use polars::prelude::*;
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info, warn};

/// Data cleaner holding a working copy of a dataset.
///
/// # Example
///
/// ```rust,ignore
/// use autodata_cleaning::DataCleaner;
///
/// let mut cleaner = DataCleaner::new(df);
/// cleaner.clean_data()?;
/// let cleaned = cleaner.into_inner();
/// ```
#[derive(Debug, Clone)]
pub struct DataCleaner {
    df: DataFrame,
    cleaning_actions: Vec<String>,
}

impl DataCleaner {
    /// Create a cleaner over a copy of `df`.
    pub fn new(df: DataFrame) -> Self {
        Self {
            df,
            cleaning_actions: Vec::new(),
        }
    }

    /// The current state of the data.
    pub fn get_clean_data(&self) -> &DataFrame {
        &self.df
    }

    /// Consume the cleaner and return the cleaned data.
    pub fn into_inner(self) -> DataFrame {
        self.df
    }

    /// Consume the cleaner and return the data and the step log.
    pub fn into_parts(self) -> (DataFrame, Vec<String>) {
        (self.df, self.cleaning_actions)
    }

    /// Log of cleaning actions performed so far.
    pub fn steps(&self) -> &[String] {
        &self.cleaning_actions
    }

    fn record(&mut self, action: String) {
        debug!("{}", action);
        self.cleaning_actions.push(action);
    }

    /// Run the default cleaning sequence: remove duplicates, clean column
    /// names, then forward-fill missing values.
    pub fn clean_data(&mut self) -> Result<()> {
        info!("Performing default data cleaning...");
        self.remove_duplicates()?;
        self.clean_column_names()?;
        self.handle_missing_values(MissingValueStrategy::ForwardFill, None)?;
        Ok(())
    }

    /// Handle missing values with `strategy` in `columns` (all columns when
    /// `None`). Only columns that contain nulls are touched. Unknown columns
    /// are skipped with a warning.
    pub fn handle_missing_values(
        &mut self,
        strategy: MissingValueStrategy,
        columns: Option<&[String]>,
    ) -> Result<()> {
        let targets = match columns {
            Some(cols) => self.existing_columns(cols, "missing value handling"),
            None => column_names(&self.df),
        };

        let mut touched = 0;
        for column in &targets {
            if let Some(message) = missing::handle_column(&mut self.df, column, strategy)
                .context(format!("Handling missing values in '{}'", column))?
            {
                touched += 1;
                self.record(message);
            }
        }

        if touched == 0 {
            self.record("No missing values to handle".to_string());
        }
        Ok(())
    }

    /// Remove exact duplicate rows, keeping the first occurrence and the
    /// original row order. Returns the number of rows removed.
    pub fn remove_duplicates(&mut self) -> Result<usize> {
        let before = self.df.height();
        let keys = row_keys(&self.df)?;

        let mut seen = HashSet::with_capacity(keys.len());
        let mask: Vec<bool> = keys.into_iter().map(|key| seen.insert(key)).collect();
        let removed = mask.iter().filter(|keep| !**keep).count();

        if removed > 0 {
            self.df = self
                .df
                .filter(&BooleanChunked::from_slice("mask".into(), &mask))?;
            let pct = (removed as f64 / before as f64) * 100.0;
            self.record(format!("Removed {} duplicate rows ({:.1}%)", removed, pct));
        } else {
            self.record("No duplicate rows found".to_string());
        }

        Ok(removed)
    }

    /// Convert columns to the requested types.
    ///
    /// Conversion is coercing: values that cannot be converted become null and
    /// the count is logged. A column that cannot be converted at all is logged
    /// and left unchanged.
    pub fn fix_data_types(&mut self, column_types: &BTreeMap<String, ColumnType>) -> Result<()> {
        for (column, target) in column_types {
            let Ok(col) = self.df.column(column) else {
                warn!("Column '{}' not found, skipping type conversion", column);
                self.record(format!(
                    "Skipped type conversion for missing column '{}'",
                    column
                ));
                continue;
            };
            let series = col.as_materialized_series().clone();
            let nulls_before = series.null_count();

            match converters::convert_series(&series, *target) {
                Ok(converted) => {
                    let coerced = converted.null_count().saturating_sub(nulls_before);
                    self.df.replace(column, converted)?;
                    if coerced > 0 {
                        warn!(
                            "{} values in '{}' could not be converted to {} and became null",
                            coerced, column, target
                        );
                        self.record(format!(
                            "Converted '{}' to {} ({} values could not be converted)",
                            column, target, coerced
                        ));
                    } else {
                        self.record(format!("Converted '{}' to {}", column, target));
                    }
                }
                Err(e) => {
                    let err = CleaningError::TypeConversionFailed {
                        column: column.clone(),
                        target_type: target.to_string(),
                        reason: e.to_string(),
                    };
                    warn!("{}", err);
                    self.record(format!("Failed to convert '{}' to {}: {}", column, target, e));
                }
            }
        }
        Ok(())
    }

    /// Standardize column names: trimmed, lowercase, spaces as underscores,
    /// non-word characters removed. Empty names become `column_<i>` and
    /// collisions get a numeric suffix.
    pub fn clean_column_names(&mut self) -> Result<()> {
        let old_names = column_names(&self.df);
        let new_names = names::standardize_names(&old_names);

        let renamed = old_names
            .iter()
            .zip(&new_names)
            .filter(|(old, new)| old != new)
            .count();
        if renamed == 0 {
            self.record("Column names already clean".to_string());
            return Ok(());
        }

        let columns: Vec<Column> = self
            .df
            .get_columns()
            .iter()
            .zip(&new_names)
            .map(|(col, name)| {
                Column::from(
                    col.as_materialized_series()
                        .clone()
                        .with_name(name.as_str().into()),
                )
            })
            .collect();
        self.df = DataFrame::new(columns)?;

        self.record(format!("Standardized {} column names", renamed));
        Ok(())
    }

    /// Replace textual missing markers ("N/A", "null", "unknown", blanks, ...)
    /// in string columns with nulls. Returns the number of cells replaced.
    pub fn normalize_missing_markers(&mut self) -> Result<usize> {
        let replaced = sanitizers::normalize_missing_markers(&mut self.df)?;
        if replaced > 0 {
            self.record(format!(
                "Converted {} missing-value markers to nulls",
                replaced
            ));
        }
        Ok(replaced)
    }

    /// Remove rows holding outliers. `columns` defaults to every numeric
    /// column. Returns the number of rows removed.
    pub fn remove_outliers(
        &mut self,
        columns: Option<&[String]>,
        method: OutlierMethod,
        threshold: f64,
    ) -> Result<usize> {
        self.handle_outliers(columns, method, threshold, OutlierAction::Remove)
    }

    /// Clamp outliers to the detection bounds. `columns` defaults to every
    /// numeric column. Returns the number of values capped.
    pub fn cap_outliers(
        &mut self,
        columns: Option<&[String]>,
        method: OutlierMethod,
        threshold: f64,
    ) -> Result<usize> {
        self.handle_outliers(columns, method, threshold, OutlierAction::Cap)
    }

    fn handle_outliers(
        &mut self,
        columns: Option<&[String]>,
        method: OutlierMethod,
        threshold: f64,
        action: OutlierAction,
    ) -> Result<usize> {
        if !threshold.is_finite() || threshold <= 0.0 {
            return Err(CleaningError::InvalidConfig(format!(
                "outlier threshold must be positive, got {}",
                threshold
            )));
        }

        let candidates = match columns {
            Some(cols) => self.existing_columns(cols, "outlier handling"),
            None => column_names(&self.df),
        };
        let numeric: Vec<String> = candidates
            .into_iter()
            .filter(|name| {
                let is_numeric = self
                    .df
                    .column(name)
                    .map(|c| is_numeric_dtype(c.dtype()))
                    .unwrap_or(false);
                if !is_numeric && columns.is_some() {
                    warn!("Column '{}' is not numeric, skipping outlier handling", name);
                }
                is_numeric
            })
            .collect();

        if numeric.is_empty() {
            self.record("No numeric columns for outlier handling".to_string());
            return Ok(0);
        }

        let count = match action {
            OutlierAction::Remove => {
                outliers::remove_outliers(&mut self.df, &numeric, method, threshold)?
            }
            OutlierAction::Cap => outliers::cap_outliers(&mut self.df, &numeric, method, threshold)?,
        };

        let method_name = match method {
            OutlierMethod::Iqr => "IQR",
            OutlierMethod::ZScore => "z-score",
        };
        let unit = match action {
            OutlierAction::Remove => "rows",
            OutlierAction::Cap => "values",
        };
        self.record(format!(
            "Outliers ({} method, threshold {}): {} {} {} across {} columns",
            method_name,
            threshold,
            outliers::action_verb(action),
            count,
            unit,
            numeric.len()
        ));
        Ok(count)
    }

    fn existing_columns(&self, requested: &[String], purpose: &str) -> Vec<String> {
        requested
            .iter()
            .filter(|name| {
                let exists = self.df.column(name).is_ok();
                if !exists {
                    warn!("Column '{}' not found, skipping {}", name, purpose);
                }
                exists
            })
            .cloned()
            .collect()
    }
}
