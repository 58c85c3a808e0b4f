use crate::error::Result;
use crate::profiler::data_quality_score;
use crate::types::{AiAnalysisEntry, CleaningOutcome, DatasetStats};
use chrono::Local;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Full record of one cleaning run.
///
/// Used both for machine-readable CLI output (`--json`) and for the report
/// file written next to the cleaned dataset (`--emit-report`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleaningReport {
    /// Timestamp when the report was generated
    pub generated_at: String,
    /// Where the data came from (file path, API URL, or database)
    pub source: String,
    /// Path of the cleaned CSV, if one was written
    pub output_file: Option<String>,

    pub processing_summary: ProcessingSummary,

    /// Statistics of the raw input
    pub stats_before: DatasetStats,
    /// Statistics of the cleaned output
    pub stats_after: DatasetStats,

    /// Cleaning actions, in execution order
    pub cleaning_steps: Vec<String>,

    pub ai_analysis: Vec<AiAnalysisEntry>,

    /// Narrative report from the AI assessor, when requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_data_report: Option<String>,
}

/// Row, column and quality deltas of a cleaning run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingSummary {
    pub duration_ms: u64,
    pub rows_before: usize,
    pub rows_after: usize,
    pub rows_removed: usize,
    pub rows_removed_percent: f64,
    pub columns_before: usize,
    pub columns_after: usize,
    /// Share of non-null cells before cleaning (0.0-1.0)
    pub data_quality_before: f64,
    /// Share of non-null cells after cleaning (0.0-1.0)
    pub data_quality_after: f64,
    /// Change in data quality, in percentage points
    pub quality_improvement: f64,
}

impl CleaningReport {
    /// Build a report for `outcome`, given the data it was computed from.
    pub fn build(
        source: impl Into<String>,
        output_file: Option<&str>,
        original: &DataFrame,
        outcome: &CleaningOutcome,
    ) -> Result<Self> {
        let stats_before = DatasetStats::compute(original)?;
        let stats_after = DatasetStats::compute(&outcome.cleaned)?;

        let (rows_before, columns_before) = outcome.original_shape;
        let (rows_after, columns_after) = outcome.cleaned_shape;
        let rows_removed = rows_before.saturating_sub(rows_after);
        let rows_removed_percent = if rows_before > 0 {
            rows_removed as f64 / rows_before as f64 * 100.0
        } else {
            0.0
        };

        let data_quality_before = data_quality_score(original);
        let data_quality_after = data_quality_score(&outcome.cleaned);

        Ok(Self {
            generated_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            source: source.into(),
            output_file: output_file.map(String::from),
            processing_summary: ProcessingSummary {
                duration_ms: outcome.duration_ms,
                rows_before,
                rows_after,
                rows_removed,
                rows_removed_percent,
                columns_before,
                columns_after,
                data_quality_before,
                data_quality_after,
                quality_improvement: (data_quality_after - data_quality_before) * 100.0,
            },
            stats_before,
            stats_after,
            cleaning_steps: outcome.steps.clone(),
            ai_analysis: outcome.ai_analysis.clone(),
            ai_data_report: None,
        })
    }

    pub fn with_ai_data_report(mut self, report: impl Into<String>) -> Self {
        self.ai_data_report = Some(report.into());
        self
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn outcome() -> (DataFrame, CleaningOutcome) {
        let original = df![
            "a" => [Some(1i64), Some(1), None, Some(4)],
        ]
        .unwrap();
        let cleaned = df!["a" => [1i64, 4]].unwrap();
        let outcome = CleaningOutcome {
            original_shape: original.shape(),
            cleaned_shape: cleaned.shape(),
            cleaned,
            steps: vec!["Removed 1 duplicate rows (25.0%)".to_string()],
            ai_analysis: vec![AiAnalysisEntry::error("AI agent not available")],
            duration_ms: 12,
        };
        (original, outcome)
    }

    #[test]
    fn test_build_summary() {
        let (original, outcome) = outcome();
        let report = CleaningReport::build("data.csv", None, &original, &outcome).unwrap();

        assert_eq!(
            report.processing_summary,
            ProcessingSummary {
                duration_ms: 12,
                rows_before: 4,
                rows_after: 2,
                rows_removed: 2,
                rows_removed_percent: 50.0,
                columns_before: 1,
                columns_after: 1,
                data_quality_before: 0.75,
                data_quality_after: 1.0,
                quality_improvement: 25.0,
            }
        );
        assert_eq!(report.stats_before.duplicate_rows, 1);
        assert_eq!(report.stats_after.missing_values, 0);
        assert_eq!(report.source, "data.csv");
    }

    #[test]
    fn test_json_shape() {
        let (original, outcome) = outcome();
        let report = CleaningReport::build("api", Some("out/api_cleaned.csv"), &original, &outcome)
            .unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&report.to_json_pretty().unwrap()).unwrap();

        assert_eq!(json["output_file"], "out/api_cleaned.csv");
        assert_eq!(json["ai_analysis"][0]["error"], "AI agent not available");
        assert!(json.get("ai_data_report").is_none());

        let with_ai = report.with_ai_data_report("Score: 8/10");
        let json = serde_json::to_value(&with_ai).unwrap();
        assert_eq!(json["ai_data_report"], "Score: 8/10");
    }
}
