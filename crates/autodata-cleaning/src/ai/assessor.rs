//! The AI quality assessor.
//!
//! The assessor is a single-node agent: an [`AiState`] holding a prompt goes
//! in, the same state with the model's response comes out. A failed provider
//! call is absorbed into the state as [`AGENT_ERROR_RESPONSE`] so one bad
//! request never aborts a cleaning job.

use super::AIProvider;
use crate::batch::{RowBatch, RowBatches, render_batch_text};
use crate::error::{CleaningError, Result};
use crate::types::{AiState, BatchAnalysis, DatasetStats};
use crate::utils::{collect_sample_values, row_to_json};
use polars::prelude::*;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Response stored in the agent state when the provider call fails.
pub const AGENT_ERROR_RESPONSE: &str = "Error processing request";

/// Number of non-null values sampled by [`AiAssessor::analyze_column`].
const COLUMN_SAMPLE_SIZE: usize = 10;

/// Number of rows included in the data report prompt.
const REPORT_SAMPLE_ROWS: usize = 3;

/// LLM-backed data quality assessor.
#[derive(Clone)]
pub struct AiAssessor {
    provider: Arc<dyn AIProvider>,
}

impl AiAssessor {
    pub fn new(provider: Arc<dyn AIProvider>) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &dyn AIProvider {
        self.provider.as_ref()
    }

    /// Run the agent over one state.
    pub fn run(&self, state: AiState) -> AiState {
        let structured_response = match self.provider.generate(&state.input_text) {
            Ok(text) => text,
            Err(e) => {
                warn!("Error in {} agent call: {}", self.provider.name(), e);
                AGENT_ERROR_RESPONSE.to_string()
            }
        };
        AiState {
            input_text: state.input_text,
            structured_response,
        }
    }

    /// Analyze `df` in batches of `batch_size` rows.
    ///
    /// `on_batch(number, total)` is called before each batch; returning an
    /// error from it stops processing and propagates the error. A batch that
    /// cannot be rendered gets an `"Error: ..."` analysis instead.
    pub fn process_data<F>(
        &self,
        df: &DataFrame,
        batch_size: usize,
        mut on_batch: F,
    ) -> Result<Vec<BatchAnalysis>>
    where
        F: FnMut(usize, usize) -> Result<()>,
    {
        let batches = RowBatches::new(df, batch_size);
        let total = batches.total();
        let mut analyses = Vec::with_capacity(total);

        for batch in batches {
            on_batch(batch.number, total)?;
            let analysis = self.analyze_batch(&batch);
            info!("Processed batch {}/{}", batch.number, total);
            analyses.push(analysis);
        }

        Ok(analyses)
    }

    /// Analyze a single batch of rows.
    pub fn analyze_batch(&self, batch: &RowBatch) -> BatchAnalysis {
        let analysis = match render_batch_text(batch) {
            Ok(text) => self.run(AiState::new(batch_prompt(&text))).structured_response,
            Err(e) => {
                warn!("Error processing batch {}: {}", batch.number, e);
                format!("Error: {}", e)
            }
        };

        BatchAnalysis {
            batch_number: batch.number,
            rows_processed: batch.len(),
            analysis,
        }
    }

    /// Send free text to the agent and return its response.
    pub fn analyze_single_text(&self, text: &str) -> String {
        self.run(AiState::new(text)).structured_response
    }

    /// Ask for cleaning recommendations for one column, based on up to ten
    /// non-null sample values.
    pub fn analyze_column(&self, df: &DataFrame, column: &str) -> Result<String> {
        let col = df
            .column(column)
            .map_err(|_| CleaningError::ColumnNotFound(column.to_string()))?;
        let samples = collect_sample_values(col.as_materialized_series(), COLUMN_SAMPLE_SIZE);
        debug!("Analyzing column '{}' with {} samples", column, samples.len());

        let prompt = format!(
            "Analyze this column data and suggest cleaning operations:\n\
             Column: {}\n\
             Sample values: {:?}\n\n\
             Provide specific cleaning recommendations:\n\
             1. Data type conversion needed\n\
             2. Pattern standardization\n\
             3. Invalid value handling\n\
             4. Missing value strategy\n",
            column, samples
        );
        Ok(self.analyze_single_text(&prompt))
    }

    /// Generate a narrative data quality report for the whole dataset.
    pub fn generate_data_report(&self, df: &DataFrame) -> Result<String> {
        let stats = DatasetStats::compute(df)?;

        let mut sample_rows = Vec::new();
        for i in 0..df.height().min(REPORT_SAMPLE_ROWS) {
            sample_rows.push(Value::Object(row_to_json(df, i)?));
        }

        let column_types: Vec<String> = stats
            .column_types
            .iter()
            .map(|(name, dtype)| format!("{}: {}", name, dtype))
            .collect();

        let prompt = format!(
            "Generate a comprehensive data quality report for this dataset:\n\n\
             Dataset Statistics:\n\
             - Total Rows: {}\n\
             - Total Columns: {}\n\
             - Missing Values: {}\n\
             - Duplicate Rows: {}\n\
             - Column Data Types: {}\n\n\
             Column Names: {:?}\n\n\
             Sample Data (first {} rows):\n{}\n\n\
             Provide:\n\
             1. Executive Summary\n\
             2. Data Quality Score (1-10)\n\
             3. Critical Issues Found\n\
             4. Recommended Actions\n\
             5. Priority Cleaning Steps\n",
            stats.total_rows,
            stats.total_columns,
            stats.missing_values,
            stats.duplicate_rows,
            column_types.join(", "),
            stats.column_names,
            REPORT_SAMPLE_ROWS,
            Value::Array(sample_rows),
        );
        Ok(self.analyze_single_text(&prompt))
    }
}

/// Prompt asking for a quality assessment of a rendered batch.
pub fn batch_prompt(batch_text: &str) -> String {
    format!(
        "You are an AI Data Cleaning Agent. Analyze the dataset:\n\
         {}\n\n\
         Please provide:\n\
         1. Data quality assessment\n\
         2. Missing value analysis\n\
         3. Outlier detection\n\
         4. Recommended cleaning steps\n\
         5. Data type corrections needed\n\n\
         Format your response as structured text with clear sections.\n",
        batch_text
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::sync::Mutex;

    /// Provider that records prompts and echoes a canned answer.
    struct RecordingProvider {
        prompts: Mutex<Vec<String>>,
        fail: bool,
    }

    impl RecordingProvider {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                prompts: Mutex::new(Vec::new()),
                fail,
            })
        }
    }

    impl AIProvider for RecordingProvider {
        fn generate(&self, prompt: &str) -> anyhow::Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            if self.fail {
                Err(anyhow!("service unavailable"))
            } else {
                Ok("analysis".to_string())
            }
        }

        fn name(&self) -> &str {
            "Recording"
        }
    }

    fn frame() -> DataFrame {
        df![
            "name" => [Some("Ann"), None, Some("Cy"), Some("Di"), Some("Ed")],
            "age" => [Some(30i64), Some(41), None, Some(25), Some(52)],
        ]
        .unwrap()
    }

    #[test]
    fn test_process_data_batches() {
        let provider = RecordingProvider::new(false);
        let assessor = AiAssessor::new(provider.clone());

        let mut seen = Vec::new();
        let analyses = assessor
            .process_data(&frame(), 2, |n, total| {
                seen.push((n, total));
                Ok(())
            })
            .unwrap();

        assert_eq!(analyses.len(), 3);
        assert_eq!(analyses[2].batch_number, 3);
        assert_eq!(analyses[2].rows_processed, 1);
        assert_eq!(analyses[0].analysis, "analysis");
        assert_eq!(seen, vec![(1, 3), (2, 3), (3, 3)]);

        let prompts = provider.prompts.lock().unwrap();
        assert!(prompts[1].contains("Row 2:"));
        assert!(prompts[1].contains("Outlier detection"));
    }

    #[test]
    fn test_provider_failure_degrades_gracefully() {
        let assessor = AiAssessor::new(RecordingProvider::new(true));
        let analyses = assessor.process_data(&frame(), 10, |_, _| Ok(())).unwrap();
        assert_eq!(analyses.len(), 1);
        assert_eq!(analyses[0].analysis, AGENT_ERROR_RESPONSE);
    }

    #[test]
    fn test_callback_error_stops_processing() {
        let provider = RecordingProvider::new(false);
        let assessor = AiAssessor::new(provider.clone());
        let result = assessor.process_data(&frame(), 2, |n, _| {
            if n == 2 {
                Err(CleaningError::Cancelled)
            } else {
                Ok(())
            }
        });
        assert!(result.unwrap_err().is_cancelled());
        assert_eq!(provider.prompts.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_analyze_column() {
        let provider = RecordingProvider::new(false);
        let assessor = AiAssessor::new(provider.clone());
        assert_eq!(assessor.analyze_column(&frame(), "name").unwrap(), "analysis");

        let prompts = provider.prompts.lock().unwrap();
        assert!(prompts[0].contains("Column: name"));
        assert!(prompts[0].contains(r#"["Ann", "Cy", "Di", "Ed"]"#));
    }

    #[test]
    fn test_analyze_unknown_column() {
        let assessor = AiAssessor::new(RecordingProvider::new(false));
        let err = assessor.analyze_column(&frame(), "salary").unwrap_err();
        assert!(matches!(err, CleaningError::ColumnNotFound(ref c) if c == "salary"));
    }

    #[test]
    fn test_generate_data_report_prompt() {
        let provider = RecordingProvider::new(false);
        let assessor = AiAssessor::new(provider.clone());
        assessor.generate_data_report(&frame()).unwrap();

        let prompts = provider.prompts.lock().unwrap();
        assert!(prompts[0].contains("Total Rows: 5"));
        assert!(prompts[0].contains("Missing Values: 2"));
        assert!(prompts[0].contains("Data Quality Score (1-10)"));
        assert!(prompts[0].contains(r#""name":"Cy""#));
        assert!(!prompts[0].contains(r#""name":"Ed""#));
    }

    #[test]
    fn test_run_keeps_input() {
        let assessor = AiAssessor::new(RecordingProvider::new(false));
        let state = assessor.run(AiState::new("prompt"));
        assert_eq!(state.input_text, "prompt");
        assert_eq!(state.structured_response, "analysis");
    }
}
