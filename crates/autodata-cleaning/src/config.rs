//! Configuration types for the cleaning pipeline.
//!
//! This module provides configuration options using the builder pattern
//! for flexible and ergonomic pipeline setup.

use crate::types::ColumnType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Strategy for handling missing values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MissingValueStrategy {
    /// Fill numeric columns with the mean of non-null values
    Mean,
    /// Fill numeric columns with the median of non-null values
    Median,
    /// Fill with the most frequent value
    Mode,
    /// Drop rows with missing values in the column
    Drop,
    /// Propagate the last valid value forward
    #[default]
    ForwardFill,
    /// Propagate the next valid value backward
    BackwardFill,
}

impl MissingValueStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mean => "mean",
            Self::Median => "median",
            Self::Mode => "mode",
            Self::Drop => "drop",
            Self::ForwardFill => "ffill",
            Self::BackwardFill => "bfill",
        }
    }
}

/// Method used to detect outliers in numeric columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OutlierMethod {
    /// Interquartile range: outside [Q1 - k*IQR, Q3 + k*IQR]
    #[default]
    Iqr,
    /// Standard score: |z| >= threshold
    ZScore,
}

impl OutlierMethod {
    /// Threshold used when none is configured.
    pub fn default_threshold(&self) -> f64 {
        match self {
            Self::Iqr => 1.5,
            Self::ZScore => 3.0,
        }
    }
}

/// What to do with detected outliers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OutlierAction {
    /// Remove rows containing outliers
    #[default]
    Remove,
    /// Clamp outlying values to the detection bounds
    Cap,
}

/// Configuration for the cleaning pipeline.
///
/// Use [`CleaningConfig::builder()`] to create a new configuration
/// with fluent API.
///
/// # Example
///
/// ```rust,ignore
/// use autodata_cleaning::config::{CleaningConfig, MissingValueStrategy};
///
/// let config = CleaningConfig::builder()
///     .missing_strategy(MissingValueStrategy::Median)
///     .detect_outliers(true)
///     .batch_size(50)
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CleaningConfig {
    /// Strategy for handling missing values.
    /// Default: ForwardFill
    pub missing_strategy: MissingValueStrategy,

    /// Columns to apply missing-value handling to. `None` means all columns.
    /// Names refer to the columns after name standardization.
    pub missing_columns: Option<Vec<String>>,

    /// Whether to remove exact duplicate rows.
    /// Default: true
    pub remove_duplicates: bool,

    /// Whether to standardize column names (lowercase, underscores).
    /// Default: true
    pub clean_column_names: bool,

    /// Whether to turn textual missing markers ("N/A", "null", ...) into nulls.
    /// Default: true
    pub normalize_missing_markers: bool,

    /// Explicit column type conversions, keyed by column name.
    pub column_types: BTreeMap<String, ColumnType>,

    /// Whether to run outlier handling.
    /// Default: false
    pub detect_outliers: bool,

    /// Outlier detection method.
    /// Default: Iqr
    pub outlier_method: OutlierMethod,

    /// Outlier threshold. `None` uses the method's default.
    pub outlier_threshold: Option<f64>,

    /// What to do with detected outliers.
    /// Default: Remove
    pub outlier_action: OutlierAction,

    /// Columns to check for outliers. `None` means all numeric columns.
    pub outlier_columns: Option<Vec<String>>,

    /// Whether to run the AI quality assessment (requires an AI provider).
    /// Default: true
    pub use_ai: bool,

    /// Number of rows sent to the AI provider per request.
    /// Default: 20
    pub batch_size: usize,

    /// Output directory for reports and cleaned data.
    /// Default: "output"
    pub output_dir: PathBuf,
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self {
            missing_strategy: MissingValueStrategy::default(),
            missing_columns: None,
            remove_duplicates: true,
            clean_column_names: true,
            normalize_missing_markers: true,
            column_types: BTreeMap::new(),
            detect_outliers: false,
            outlier_method: OutlierMethod::default(),
            outlier_threshold: None,
            outlier_action: OutlierAction::default(),
            outlier_columns: None,
            use_ai: true,
            batch_size: 20,
            output_dir: PathBuf::from("output"),
        }
    }
}

impl CleaningConfig {
    /// Create a new configuration builder.
    pub fn builder() -> CleaningConfigBuilder {
        CleaningConfigBuilder::default()
    }

    /// The outlier threshold in effect.
    pub fn effective_outlier_threshold(&self) -> f64 {
        self.outlier_threshold
            .unwrap_or_else(|| self.outlier_method.default_threshold())
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.batch_size == 0 {
            return Err(ConfigValidationError::InvalidBatchSize(self.batch_size));
        }

        if let Some(threshold) = self.outlier_threshold
            && (!threshold.is_finite() || threshold <= 0.0)
        {
            return Err(ConfigValidationError::InvalidOutlierThreshold(threshold));
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid batch size: {0} (must be at least 1)")]
    InvalidBatchSize(usize),

    #[error("Invalid outlier threshold: {0} (must be a positive number)")]
    InvalidOutlierThreshold(f64),
}

/// Builder for [`CleaningConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct CleaningConfigBuilder {
    missing_strategy: Option<MissingValueStrategy>,
    missing_columns: Option<Vec<String>>,
    remove_duplicates: Option<bool>,
    clean_column_names: Option<bool>,
    normalize_missing_markers: Option<bool>,
    column_types: BTreeMap<String, ColumnType>,
    detect_outliers: Option<bool>,
    outlier_method: Option<OutlierMethod>,
    outlier_threshold: Option<f64>,
    outlier_action: Option<OutlierAction>,
    outlier_columns: Option<Vec<String>>,
    use_ai: Option<bool>,
    batch_size: Option<usize>,
    output_dir: Option<PathBuf>,
}

impl CleaningConfigBuilder {
    /// Set the missing value strategy.
    pub fn missing_strategy(mut self, strategy: MissingValueStrategy) -> Self {
        self.missing_strategy = Some(strategy);
        self
    }

    /// Restrict missing value handling to the given columns.
    pub fn missing_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.missing_columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Enable or disable duplicate row removal.
    pub fn remove_duplicates(mut self, remove: bool) -> Self {
        self.remove_duplicates = Some(remove);
        self
    }

    /// Enable or disable column name standardization.
    pub fn clean_column_names(mut self, clean: bool) -> Self {
        self.clean_column_names = Some(clean);
        self
    }

    /// Enable or disable missing marker normalization.
    pub fn normalize_missing_markers(mut self, normalize: bool) -> Self {
        self.normalize_missing_markers = Some(normalize);
        self
    }

    /// Request a type conversion for a column. Can be called repeatedly.
    pub fn column_type(mut self, column: impl Into<String>, column_type: ColumnType) -> Self {
        self.column_types.insert(column.into(), column_type);
        self
    }

    /// Enable or disable outlier handling.
    pub fn detect_outliers(mut self, detect: bool) -> Self {
        self.detect_outliers = Some(detect);
        self
    }

    /// Set the outlier detection method.
    pub fn outlier_method(mut self, method: OutlierMethod) -> Self {
        self.outlier_method = Some(method);
        self
    }

    /// Set the outlier threshold (IQR multiplier or z-score cutoff).
    pub fn outlier_threshold(mut self, threshold: f64) -> Self {
        self.outlier_threshold = Some(threshold);
        self
    }

    /// Set what happens to detected outliers.
    pub fn outlier_action(mut self, action: OutlierAction) -> Self {
        self.outlier_action = Some(action);
        self
    }

    /// Restrict outlier handling to the given columns.
    pub fn outlier_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.outlier_columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Enable or disable the AI quality assessment.
    pub fn use_ai(mut self, use_ai: bool) -> Self {
        self.use_ai = Some(use_ai);
        self
    }

    /// Set the number of rows per AI batch.
    pub fn batch_size(mut self, size: usize) -> Self {
        self.batch_size = Some(size);
        self
    }

    /// Set the output directory for reports and cleaned data.
    pub fn output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(path.into());
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `CleaningConfig` or an error if validation fails.
    pub fn build(self) -> Result<CleaningConfig, ConfigValidationError> {
        let config = CleaningConfig {
            missing_strategy: self.missing_strategy.unwrap_or_default(),
            missing_columns: self.missing_columns,
            remove_duplicates: self.remove_duplicates.unwrap_or(true),
            clean_column_names: self.clean_column_names.unwrap_or(true),
            normalize_missing_markers: self.normalize_missing_markers.unwrap_or(true),
            column_types: self.column_types,
            detect_outliers: self.detect_outliers.unwrap_or(false),
            outlier_method: self.outlier_method.unwrap_or_default(),
            outlier_threshold: self.outlier_threshold,
            outlier_action: self.outlier_action.unwrap_or_default(),
            outlier_columns: self.outlier_columns,
            use_ai: self.use_ai.unwrap_or(true),
            batch_size: self.batch_size.unwrap_or(20),
            output_dir: self.output_dir.unwrap_or_else(|| PathBuf::from("output")),
        };

        config.validate()?;
        Ok(config)
    }
}
