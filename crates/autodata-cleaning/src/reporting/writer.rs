use super::CleaningReport;
use crate::error::{Result, ResultExt};
use polars::prelude::*;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// Writes cleaned datasets and reports into an output directory.
#[derive(Debug, Clone)]
pub struct ReportWriter {
    output_dir: PathBuf,
}

impl Default for ReportWriter {
    fn default() -> Self {
        Self::new("output")
    }
}

impl ReportWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Path of the cleaned CSV for `base_name`: `<dir>/<base_name>_cleaned.csv`.
    pub fn cleaned_path(&self, base_name: &str) -> PathBuf {
        self.output_dir.join(format!("{}_cleaned.csv", base_name))
    }

    /// Path of the JSON report for `base_name`: `<dir>/<base_name>_report.json`.
    pub fn report_path(&self, base_name: &str) -> PathBuf {
        self.output_dir.join(format!("{}_report.json", base_name))
    }

    /// Write `df` as CSV with a header row.
    pub fn write_cleaned_csv(&self, df: &mut DataFrame, base_name: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;

        let output_path = self.cleaned_path(base_name);
        let mut file = File::create(&output_path)?;
        CsvWriter::new(&mut file)
            .include_header(true)
            .with_separator(b',')
            .with_quote_char(b'"')
            .finish(df)
            .context(format!("Writing {}", output_path.display()))?;

        info!("Dataset saved: {}", output_path.display());
        Ok(output_path)
    }

    /// Write `report` as pretty-printed JSON.
    pub fn write_report(&self, report: &CleaningReport, base_name: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;

        let report_path = self.report_path(base_name);
        let mut file = File::create(&report_path)?;
        file.write_all(report.to_json_pretty()?.as_bytes())?;

        info!("Report saved: {}", report_path.display());
        Ok(report_path)
    }
}

/// Base name for output files derived from a source path (`data/sales.csv`
/// → `sales`). Falls back to `dataset` when the path has no usable stem.
pub fn output_base_name(source: &Path) -> String {
    source
        .file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty())
        .unwrap_or("dataset")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CleaningOutcome;

    #[test]
    fn test_output_base_name() {
        assert_eq!(output_base_name(Path::new("data/sales.csv")), "sales");
        assert_eq!(output_base_name(Path::new("book.xlsx")), "book");
        assert_eq!(output_base_name(Path::new("")), "dataset");
    }

    #[test]
    fn test_write_cleaned_csv_and_report() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ReportWriter::new(dir.path().join("nested"));

        let mut df = df![
            "name" => ["Ann", "Bob"],
            "age" => [30i64, 41],
        ]
        .unwrap();
        let csv_path = writer.write_cleaned_csv(&mut df, "people").unwrap();
        assert!(csv_path.ends_with("people_cleaned.csv"));
        let content = fs::read_to_string(&csv_path).unwrap();
        assert_eq!(content, "name,age\nAnn,30\nBob,41\n");

        let outcome = CleaningOutcome {
            original_shape: df.shape(),
            cleaned_shape: df.shape(),
            cleaned: df.clone(),
            steps: Vec::new(),
            ai_analysis: Vec::new(),
            duration_ms: 0,
        };
        let report = CleaningReport::build("people.csv", None, &df, &outcome).unwrap();
        let report_path = writer.write_report(&report, "people").unwrap();
        assert!(report_path.ends_with("people_report.json"));

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(report_path).unwrap()).unwrap();
        assert_eq!(json["processing_summary"]["rows_after"], 2);
    }
}
