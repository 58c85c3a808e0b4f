use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Target type for a column conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Int,
    Float,
    String,
    Boolean,
    Datetime,
}

impl ColumnType {
    /// The polars dtype this column ends up with after conversion.
    pub fn dtype(&self) -> DataType {
        match self {
            Self::Int => DataType::Int64,
            Self::Float => DataType::Float64,
            Self::String => DataType::String,
            Self::Boolean => DataType::Boolean,
            Self::Datetime => DataType::Datetime(TimeUnit::Milliseconds, None),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Float => "float",
            Self::String => "string",
            Self::Boolean => "boolean",
            Self::Datetime => "datetime",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColumnType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "int" | "integer" | "int64" | "int32" => Ok(Self::Int),
            "float" | "float64" | "float32" | "double" => Ok(Self::Float),
            "str" | "string" | "object" | "text" => Ok(Self::String),
            "bool" | "boolean" => Ok(Self::Boolean),
            "datetime" | "date" | "datetime64[ns]" | "timestamp" => Ok(Self::Datetime),
            other => Err(format!("unknown column type '{}'", other)),
        }
    }
}

/// Summary statistics of a dataset, used for reports and AI prompts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetStats {
    pub total_rows: usize,
    pub total_columns: usize,
    /// Total number of null cells.
    pub missing_values: usize,
    /// Rows that repeat an earlier row exactly.
    pub duplicate_rows: usize,
    pub column_names: Vec<String>,
    /// Column name and dtype, in column order.
    pub column_types: Vec<(String, String)>,
}

/// AI analysis of one batch of rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchAnalysis {
    /// 1-based batch number.
    pub batch_number: usize,
    pub rows_processed: usize,
    pub analysis: String,
}

/// One entry of the `ai_analysis` list returned to clients.
///
/// Either a per-batch analysis or an error object explaining why no
/// analysis is available.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AiAnalysisEntry {
    Batch(BatchAnalysis),
    Error { error: String },
}

impl AiAnalysisEntry {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            error: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}

/// State flowing through the AI agent: a prompt in, a structured response out.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AiState {
    pub input_text: String,
    #[serde(default)]
    pub structured_response: String,
}

impl AiState {
    pub fn new(input_text: impl Into<String>) -> Self {
        Self {
            input_text: input_text.into(),
            structured_response: String::new(),
        }
    }
}

/// Result of running the cleaning pipeline over one dataset.
#[derive(Debug, Clone)]
pub struct CleaningOutcome {
    pub cleaned: DataFrame,
    pub original_shape: (usize, usize),
    pub cleaned_shape: (usize, usize),
    /// Human-readable log of cleaning actions, in execution order.
    pub steps: Vec<String>,
    pub ai_analysis: Vec<AiAnalysisEntry>,
    pub duration_ms: u64,
}
