//! Integration tests for the cleaning pipeline.
//!
//! These tests verify end-to-end behavior of ingestion, cleaning, AI batching
//! and reporting using the CSV fixtures.

use autodata_cleaning::ai::{AIProvider, AiAssessor};
use autodata_cleaning::ingest::{self, FileKind};
use autodata_cleaning::{
    AiAnalysisEntry, CancellationToken, CleaningConfig, CleaningError, CleaningPipeline,
    CleaningReport, CleaningStage, ColumnType, MissingValueStrategy, OutlierAction, OutlierMethod,
    ProgressUpdate, ReportWriter,
};
use chrono::NaiveDate;
use polars::prelude::*;
use pretty_assertions::assert_eq;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// ============================================================================
// Helper Functions
// ============================================================================

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn load_fixture(filename: &str) -> DataFrame {
    ingest::read_path(&fixtures_path().join(filename)).expect("Failed to read fixture")
}

fn customers_config() -> CleaningConfig {
    CleaningConfig::builder()
        .column_type("Age", ColumnType::Int)
        .column_type("Balance", ColumnType::Float)
        .column_type("Signup Date", ColumnType::Datetime)
        .column_type("Active", ColumnType::Boolean)
        .use_ai(false)
        .build()
        .unwrap()
}

fn run(config: CleaningConfig, df: DataFrame) -> autodata_cleaning::CleaningOutcome {
    CleaningPipeline::builder()
        .config(config)
        .build()
        .unwrap()
        .process(df)
        .expect("Pipeline should complete successfully")
}

/// Provider that answers every prompt with the number of rows it saw.
struct CountingProvider {
    calls: AtomicUsize,
}

impl AIProvider for CountingProvider {
    fn generate(&self, prompt: &str) -> anyhow::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let rows = prompt.lines().filter(|l| l.starts_with("Row ")).count();
        Ok(format!("{} rows look fine", rows))
    }

    fn name(&self) -> &str {
        "Counting"
    }
}

// ============================================================================
// Full Pipeline Tests
// ============================================================================

#[test]
fn test_customers_fixture_is_cleaned() {
    let df = load_fixture("customers.csv");
    assert_eq!(df.shape(), (6, 6));

    let outcome = run(customers_config(), df);
    let cleaned = &outcome.cleaned;

    assert_eq!(outcome.original_shape, (6, 6));
    assert_eq!(outcome.cleaned_shape, (5, 6));
    assert_eq!(
        autodata_cleaning::utils::column_names(cleaned),
        vec!["customer_id", "full_name", "age", "signup_date", "balance", "active"]
    );

    let nulls: usize = cleaned.get_columns().iter().map(|c| c.null_count()).sum();
    assert_eq!(nulls, 0, "forward fill should leave no nulls");

    let ages: Vec<Option<i64>> = cleaned.column("age").unwrap().i64().unwrap().into_iter().collect();
    assert_eq!(ages, vec![Some(34), Some(34), Some(29), Some(29), Some(41)]);

    let balances: Vec<Option<f64>> = cleaned
        .column("balance")
        .unwrap()
        .f64()
        .unwrap()
        .into_iter()
        .collect();
    assert_eq!(
        balances,
        vec![Some(1200.5), Some(300.0), Some(75.25), Some(75.25), Some(980.0)]
    );

    let active: Vec<Option<bool>> = cleaned
        .column("active")
        .unwrap()
        .bool()
        .unwrap()
        .into_iter()
        .collect();
    assert_eq!(active, vec![Some(true), Some(false), Some(true), Some(false), Some(true)]);

    let names: Vec<Option<&str>> = cleaned
        .column("full_name")
        .unwrap()
        .str()
        .unwrap()
        .into_iter()
        .collect();
    assert_eq!(names[4], Some("Ed Moss"));

    let signup = cleaned.column("signup_date").unwrap();
    assert!(matches!(signup.dtype(), DataType::Datetime(_, _)));
    let millis = signup.cast(&DataType::Int64).unwrap();
    let expected = NaiveDate::from_ymd_opt(2023, 3, 15)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        .and_utc()
        .timestamp_millis();
    assert_eq!(millis.i64().unwrap().get(2), Some(expected));
}

#[test]
fn test_steps_are_logged_in_order() {
    let outcome = run(customers_config(), load_fixture("customers.csv"));
    let steps = &outcome.steps;

    let position = |needle: &str| {
        steps
            .iter()
            .position(|s| s.contains(needle))
            .unwrap_or_else(|| panic!("missing step '{}' in {:?}", needle, steps))
    };

    let dedup = position("Removed 1 duplicate rows");
    let names = position("Standardized 6 column names");
    let markers = position("missing-value markers to nulls");
    let age = position("Converted 'age' to int");
    assert!(dedup < names && names < markers && markers < age);
}

#[test]
fn test_mean_strategy_on_selected_columns() {
    let config = CleaningConfig::builder()
        .missing_strategy(MissingValueStrategy::Mean)
        .missing_columns(["Balance"])
        .column_type("Balance", ColumnType::Float)
        .use_ai(false)
        .build()
        .unwrap();
    let outcome = run(config, load_fixture("customers.csv"));

    let balance = outcome.cleaned.column("balance").unwrap();
    assert_eq!(balance.null_count(), 0);
    let mean = (1200.5 + 300.0 + 75.25 + 980.0) / 4.0;
    assert_eq!(balance.f64().unwrap().get(3), Some(mean));

    // Age was not selected, so its nulls stay.
    assert_eq!(outcome.cleaned.column("age").unwrap().null_count(), 2);
}

#[test]
fn test_outliers_capped() {
    let config = CleaningConfig::builder()
        .detect_outliers(true)
        .outlier_method(OutlierMethod::Iqr)
        .outlier_action(OutlierAction::Cap)
        .use_ai(false)
        .build()
        .unwrap();
    let outcome = run(config, load_fixture("sensors.csv"));

    assert_eq!(outcome.cleaned_shape, (8, 2));
    let max = outcome
        .cleaned
        .column("reading")
        .unwrap()
        .as_materialized_series()
        .max::<f64>()
        .unwrap()
        .unwrap();
    assert!((max - 13.425).abs() < 1e-9, "max was {}", max);
    assert!(outcome.steps.iter().any(|s| s.contains("capped 1 values")));
}

#[test]
fn test_outliers_removed() {
    let config = CleaningConfig::builder()
        .detect_outliers(true)
        .use_ai(false)
        .build()
        .unwrap();
    let outcome = run(config, load_fixture("sensors.csv"));
    assert_eq!(outcome.cleaned_shape, (7, 2));
}

#[test]
fn test_all_null_column_survives() {
    let df = df![
        "id" => [1i64, 2, 3],
        "empty" => [None::<f64>, None, None],
    ]
    .unwrap();
    let config = CleaningConfig::builder()
        .missing_strategy(MissingValueStrategy::Median)
        .use_ai(false)
        .build()
        .unwrap();
    let outcome = run(config, df);
    assert_eq!(outcome.cleaned_shape, (3, 2));
}

#[test]
fn test_empty_dataset() {
    let df = df!["a" => Vec::<i64>::new()].unwrap();
    let pipeline = CleaningPipeline::builder()
        .ai_provider(Arc::new(CountingProvider {
            calls: AtomicUsize::new(0),
        }))
        .build()
        .unwrap();
    let outcome = pipeline.process(df).unwrap();
    assert_eq!(outcome.cleaned_shape, (0, 1));
    assert!(outcome.ai_analysis.is_empty());
}

// ============================================================================
// AI Assessment Tests
// ============================================================================

#[test]
fn test_ai_batches_cover_all_rows() {
    let provider = Arc::new(CountingProvider {
        calls: AtomicUsize::new(0),
    });
    let config = CleaningConfig::builder().batch_size(2).build().unwrap();
    let outcome = CleaningPipeline::builder()
        .config(config)
        .ai_provider(provider.clone())
        .build()
        .unwrap()
        .process(load_fixture("customers.csv"))
        .unwrap();

    assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
    let analyses: Vec<String> = outcome
        .ai_analysis
        .iter()
        .map(|entry| match entry {
            AiAnalysisEntry::Batch(batch) => batch.analysis.clone(),
            AiAnalysisEntry::Error { error } => panic!("unexpected error entry: {}", error),
        })
        .collect();
    assert_eq!(
        analyses,
        vec!["2 rows look fine", "2 rows look fine", "1 rows look fine"]
    );
}

#[test]
fn test_ai_unavailable_entry_serializes_as_error_object() {
    let outcome = run(customers_config(), load_fixture("customers.csv"));
    let json = serde_json::to_value(&outcome.ai_analysis).unwrap();
    assert_eq!(json, serde_json::json!([{ "error": "AI agent not available" }]));
}

#[test]
fn test_assessor_column_analysis_on_cleaned_data() {
    let outcome = run(customers_config(), load_fixture("customers.csv"));
    let assessor = AiAssessor::new(Arc::new(CountingProvider {
        calls: AtomicUsize::new(0),
    }));

    assert!(assessor.analyze_column(&outcome.cleaned, "age").is_ok());
    let err = assessor.analyze_column(&outcome.cleaned, "Age").unwrap_err();
    assert!(matches!(err, CleaningError::ColumnNotFound(_)));
}

// ============================================================================
// Progress and Cancellation Tests
// ============================================================================

#[test]
fn test_pipeline_cancellation_before_start() {
    let token = CancellationToken::new();
    token.cancel();

    let result = CleaningPipeline::builder()
        .cancellation_token(token)
        .build()
        .unwrap()
        .process(load_fixture("customers.csv"));

    assert!(matches!(result, Err(CleaningError::Cancelled)));
}

#[test]
fn test_pipeline_progress_stages_reported() {
    let stages = Arc::new(Mutex::new(Vec::new()));
    let stages_clone = stages.clone();

    let config = CleaningConfig::builder()
        .detect_outliers(true)
        .build()
        .unwrap();
    CleaningPipeline::builder()
        .config(config)
        .ai_provider(Arc::new(CountingProvider {
            calls: AtomicUsize::new(0),
        }))
        .on_progress(move |update: ProgressUpdate| {
            let mut stages = stages_clone.lock().unwrap();
            if stages.last() != Some(&update.stage) {
                stages.push(update.stage);
            }
        })
        .build()
        .unwrap()
        .process(load_fixture("sensors.csv"))
        .unwrap();

    let stages = stages.lock().unwrap();
    assert_eq!(
        *stages,
        vec![
            CleaningStage::Initializing,
            CleaningStage::Deduplication,
            CleaningStage::ColumnNames,
            CleaningStage::MissingMarkers,
            CleaningStage::MissingValues,
            CleaningStage::OutlierHandling,
            CleaningStage::AiAssessment,
            CleaningStage::Complete,
        ]
    );
}

// ============================================================================
// Ingestion and Reporting Tests
// ============================================================================

#[test]
fn test_file_kind_detection() {
    assert_eq!(FileKind::from_filename("data.CSV").unwrap(), FileKind::Csv);
    assert_eq!(FileKind::from_filename("book.xlsx").unwrap(), FileKind::Excel);
    assert!(matches!(
        FileKind::from_filename("notes.txt"),
        Err(CleaningError::UnsupportedFileType(_))
    ));
}

#[test]
fn test_excel_fixture_is_cleaned() {
    let df = load_fixture("inventory.xlsx");
    assert_eq!(df.shape(), (4, 3));
    assert_eq!(df.column("Qty").unwrap().null_count(), 1);

    let outcome = run(
        CleaningConfig::builder().use_ai(false).build().unwrap(),
        df,
    );

    assert_eq!(outcome.cleaned_shape, (3, 3));
    let cleaned = &outcome.cleaned;
    assert_eq!(
        autodata_cleaning::utils::column_names(cleaned),
        vec!["item", "qty", "unit_price"]
    );
    let qty = cleaned.column("qty").unwrap().cast(&DataType::Float64).unwrap();
    // Nut has no quantity and takes the previous row's
    assert_eq!(qty.f64().unwrap().get(1), Some(10.0));
}

#[test]
fn test_json_records_pipeline() {
    let payload = serde_json::json!([
        { "id": 1, "city": "Paris", "temp": 21.5 },
        { "id": 2, "city": "null", "temp": 19.0 },
        { "id": 2, "city": "null", "temp": 19.0 },
        { "id": 3, "city": "Oslo" },
    ]);
    let df = ingest::records_to_dataframe(&payload).unwrap();
    let outcome = run(
        CleaningConfig::builder().use_ai(false).build().unwrap(),
        df,
    );

    assert_eq!(outcome.cleaned_shape, (3, 3));
    let records = ingest::dataframe_to_records(&outcome.cleaned).unwrap();
    assert_eq!(
        serde_json::Value::Object(records[1].clone()),
        serde_json::json!({ "id": 2, "city": "Paris", "temp": 19.0 })
    );
    assert_eq!(records[2]["temp"], serde_json::json!(19.0));
}

#[test]
fn test_report_written_next_to_cleaned_csv() {
    let dir = tempfile::tempdir().unwrap();
    let original = load_fixture("customers.csv");
    let outcome = run(customers_config(), original.clone());

    let writer = ReportWriter::new(dir.path());
    let mut cleaned = outcome.cleaned.clone();
    let csv_path = writer.write_cleaned_csv(&mut cleaned, "customers").unwrap();

    let report =
        CleaningReport::build("customers.csv", csv_path.to_str(), &original, &outcome).unwrap();
    let report_path = writer.write_report(&report, "customers").unwrap();

    let reloaded = ingest::read_path(&csv_path).unwrap();
    assert_eq!(reloaded.shape(), (5, 6));

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(report_path).unwrap()).unwrap();
    assert_eq!(json["processing_summary"]["rows_removed"], 1);
    assert_eq!(json["stats_before"]["duplicate_rows"], 1);
    assert_eq!(json["stats_after"]["missing_values"], 0);
    assert_eq!(json["processing_summary"]["data_quality_after"], 1.0);
}
