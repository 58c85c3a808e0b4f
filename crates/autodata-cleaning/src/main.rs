//! CLI entry point for the autodata cleaning pipeline.

use anyhow::{Result, anyhow, bail};
#[cfg(feature = "remote")]
use anyhow::Context;
use autodata_cleaning::ai::{AIProvider, AiAssessor};
use autodata_cleaning::reporting::output_base_name;
use autodata_cleaning::{
    CleaningConfig, CleaningPipeline, CleaningReport, ColumnType, DatasetStats,
    MissingValueStrategy, OutlierAction, OutlierMethod, ReportWriter, ingest, resolve_column,
};
use clap::{ArgGroup, Parser, ValueEnum};
use dotenv::dotenv;
use polars::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

/// CLI-compatible missing value strategy enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliMissingStrategy {
    /// Fill numeric columns with the column mean
    Mean,
    /// Fill numeric columns with the column median
    Median,
    /// Fill with the most frequent value
    Mode,
    /// Drop rows with missing values
    Drop,
    /// Propagate the previous value forward
    Ffill,
    /// Propagate the next value backward
    Bfill,
}

impl From<CliMissingStrategy> for MissingValueStrategy {
    fn from(cli: CliMissingStrategy) -> Self {
        match cli {
            CliMissingStrategy::Mean => MissingValueStrategy::Mean,
            CliMissingStrategy::Median => MissingValueStrategy::Median,
            CliMissingStrategy::Mode => MissingValueStrategy::Mode,
            CliMissingStrategy::Drop => MissingValueStrategy::Drop,
            CliMissingStrategy::Ffill => MissingValueStrategy::ForwardFill,
            CliMissingStrategy::Bfill => MissingValueStrategy::BackwardFill,
        }
    }
}

/// CLI-compatible outlier detection method enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliOutlierMethod {
    /// Interquartile range fences (default multiplier 1.5)
    Iqr,
    /// Standard score (default threshold 3.0)
    Zscore,
}

impl From<CliOutlierMethod> for OutlierMethod {
    fn from(cli: CliOutlierMethod) -> Self {
        match cli {
            CliOutlierMethod::Iqr => OutlierMethod::Iqr,
            CliOutlierMethod::Zscore => OutlierMethod::ZScore,
        }
    }
}

/// CLI-compatible outlier action enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliOutlierAction {
    /// Remove rows containing outliers
    Remove,
    /// Clamp outliers to the detection bounds
    Cap,
}

impl From<CliOutlierAction> for OutlierAction {
    fn from(cli: CliOutlierAction) -> Self {
        match cli {
            CliOutlierAction::Remove => OutlierAction::Remove,
            CliOutlierAction::Cap => OutlierAction::Cap,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Automated data cleaning with AI quality assessment",
    long_about = "Cleans CSV/Excel files, REST API payloads, or PostgreSQL query results \
                  and optionally asks an LLM to assess the cleaned data.\n\n\
                  ENVIRONMENT VARIABLES:\n  \
                  GEMINI_API_KEY    API key for Google Gemini (required for AI analysis)\n  \
                  GEMINI_MODEL      Override the Gemini model\n\n\
                  EXAMPLES:\n  \
                  # Clean a CSV file\n  \
                  autodata -i sales.csv\n\n  \
                  # Convert types and cap outliers\n  \
                  autodata -i sales.csv --type price=float --type sold_at=datetime \\\n    \
                  --detect-outliers --outlier-action cap\n\n  \
                  # Preview statistics only\n  \
                  autodata -i sales.csv --dry-run\n\n  \
                  # Clean a query result without AI\n  \
                  autodata --db-url postgres://localhost/shop --query 'SELECT * FROM orders' --no-ai",
    group(ArgGroup::new("source").required(true).args(["input", "api_url", "db_url"]))
)]
struct Args {
    /// Path to the CSV or Excel file to clean
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// URL of a REST endpoint returning JSON records
    #[arg(long)]
    api_url: Option<String>,

    /// PostgreSQL connection URL (requires --query)
    #[arg(long, requires = "query")]
    db_url: Option<String>,

    /// SQL query to run against --db-url
    #[arg(long, requires = "db_url")]
    query: Option<String>,

    /// Output directory for results
    #[arg(short, long, default_value = "output")]
    output: PathBuf,

    /// Strategy for missing values
    #[arg(long, value_enum, default_value = "ffill")]
    missing_strategy: CliMissingStrategy,

    /// Restrict missing value handling to these columns (comma separated)
    #[arg(long, value_delimiter = ',')]
    missing_columns: Vec<String>,

    /// Convert a column, as `column=type` (int, float, string, boolean, datetime)
    #[arg(long = "type", value_name = "COLUMN=TYPE", value_parser = parse_type_mapping)]
    types: Vec<(String, ColumnType)>,

    /// Keep duplicate rows
    #[arg(long)]
    keep_duplicates: bool,

    /// Keep the original column names
    #[arg(long)]
    keep_column_names: bool,

    /// Treat "N/A", "null", "unknown" and similar strings as regular values
    #[arg(long)]
    keep_missing_markers: bool,

    /// Detect and handle outliers in numeric columns
    #[arg(long)]
    detect_outliers: bool,

    /// Outlier detection method
    #[arg(long, value_enum, default_value = "iqr")]
    outlier_method: CliOutlierMethod,

    /// Outlier threshold (IQR multiplier or z-score); defaults per method
    #[arg(long)]
    outlier_threshold: Option<f64>,

    /// What to do with detected outliers
    #[arg(long, value_enum, default_value = "remove")]
    outlier_action: CliOutlierAction,

    /// Columns checked for outliers (comma separated, default all numeric)
    #[arg(long, value_delimiter = ',')]
    outlier_columns: Vec<String>,

    /// Disable AI analysis (rule-based cleaning only)
    #[arg(long)]
    no_ai: bool,

    /// Rows per AI request
    #[arg(long, default_value = "20")]
    batch_size: usize,

    /// Ask the AI for cleaning recommendations for one column
    #[arg(long, value_name = "COLUMN")]
    analyze_column: Option<String>,

    /// Ask the AI for a narrative data quality report
    #[arg(long)]
    ai_report: bool,

    /// Show dataset statistics without cleaning anything
    #[arg(long)]
    dry_run: bool,

    /// Output JSON to stdout instead of a human-readable summary
    ///
    /// Disables all logs; only the final JSON report is printed.
    #[arg(long)]
    json: bool,

    /// Write a detailed JSON report to the output directory
    ///
    /// The report will be saved as <name>_report.json
    #[arg(short = 'r', long)]
    emit_report: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show warnings, errors and final result)
    #[arg(short, long)]
    quiet: bool,
}

/// Parse a `column=type` mapping.
fn parse_type_mapping(s: &str) -> std::result::Result<(String, ColumnType), String> {
    let (column, ty) = s
        .split_once('=')
        .ok_or_else(|| format!("expected COLUMN=TYPE, got '{}'", s))?;
    let column = column.trim();
    if column.is_empty() {
        return Err(format!("missing column name in '{}'", s));
    }
    Ok((column.to_string(), ty.parse()?))
}

/// Where the data comes from.
enum Source {
    File(PathBuf),
    Api(String),
    Database { url: String, query: String },
}

impl Source {
    fn from_args(args: &Args) -> Result<Self> {
        match (&args.input, &args.api_url, &args.db_url, &args.query) {
            (Some(path), None, None, _) => Ok(Self::File(path.clone())),
            (None, Some(url), None, _) => Ok(Self::Api(url.clone())),
            (None, None, Some(url), Some(query)) => Ok(Self::Database {
                url: url.clone(),
                query: query.clone(),
            }),
            _ => bail!("Specify exactly one of --input, --api-url, or --db-url with --query"),
        }
    }

    /// Label used in reports. Database URLs may carry credentials, so only
    /// the query is shown.
    fn label(&self) -> String {
        match self {
            Self::File(path) => path.display().to_string(),
            Self::Api(url) => url.clone(),
            Self::Database { query, .. } => format!("database query: {}", query),
        }
    }

    fn base_name(&self) -> String {
        match self {
            Self::File(path) => output_base_name(path),
            Self::Api(_) => "api_data".to_string(),
            Self::Database { .. } => "db_data".to_string(),
        }
    }

    fn load(&self) -> Result<DataFrame> {
        match self {
            Self::File(path) => {
                if !path.exists() {
                    bail!("Input file not found: {}", path.display());
                }
                Ok(ingest::read_path(path)?)
            }
            Self::Api(url) => load_api(url),
            Self::Database { url, query } => load_database(url, query),
        }
    }
}

/// Run `future` to completion on a short-lived runtime.
///
/// The runtime is dropped before cleaning starts, so the blocking AI client
/// never runs inside it.
#[cfg(feature = "remote")]
fn block_on<T>(
    future: impl std::future::Future<Output = autodata_cleaning::CleaningResult<T>>,
) -> Result<T> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    Ok(runtime.block_on(future)?)
}

#[cfg(feature = "remote")]
fn load_api(url: &str) -> Result<DataFrame> {
    block_on(ingest::fetch_from_api(url))
}

#[cfg(feature = "remote")]
fn load_database(url: &str, query: &str) -> Result<DataFrame> {
    block_on(ingest::load_from_database(url, query))
}

#[cfg(not(feature = "remote"))]
fn load_api(_url: &str) -> Result<DataFrame> {
    bail!("Remote sources are not compiled in. Rebuild with --features remote.")
}

#[cfg(not(feature = "remote"))]
fn load_database(_url: &str, _query: &str) -> Result<DataFrame> {
    bail!("Remote sources are not compiled in. Rebuild with --features remote.")
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is disabled so stdout only carries
/// the JSON report.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    dotenv().ok();

    let args = Args::parse();

    init_logging(&args.log_level, args.quiet, args.json);

    let source = Source::from_args(&args)?;

    info!("Loading dataset from: {}", source.label());
    let data = source.load()?;
    info!("Dataset loaded successfully: {:?}", data.shape());

    if args.dry_run {
        return run_dry_run(&args, &source, &data);
    }

    let config = build_config(&args)?;
    let provider = if args.no_ai {
        info!("Running in rule-based mode (AI disabled)");
        None
    } else {
        autodata_cleaning::ai::provider_from_env()
    };

    let mut builder = CleaningPipeline::builder()
        .config(config)
        .maybe_ai_provider(provider.clone());
    if !args.quiet && !args.json {
        builder = builder.on_progress(|update| {
            info!(
                "[{:.0}%] {}: {}",
                update.progress * 100.0,
                update.stage.display_name(),
                update.message
            );
        });
    }
    let pipeline = builder.build()?;

    run_pipeline(&pipeline, provider, &args, &source, data)
}

fn build_config(args: &Args) -> Result<CleaningConfig> {
    let mut builder = CleaningConfig::builder()
        .missing_strategy(args.missing_strategy.into())
        .remove_duplicates(!args.keep_duplicates)
        .clean_column_names(!args.keep_column_names)
        .normalize_missing_markers(!args.keep_missing_markers)
        .detect_outliers(args.detect_outliers)
        .outlier_method(args.outlier_method.into())
        .outlier_action(args.outlier_action.into())
        .use_ai(!args.no_ai)
        .batch_size(args.batch_size)
        .output_dir(&args.output);

    if !args.missing_columns.is_empty() {
        builder = builder.missing_columns(args.missing_columns.iter().cloned());
    }
    if !args.outlier_columns.is_empty() {
        builder = builder.outlier_columns(args.outlier_columns.iter().cloned());
    }
    if let Some(threshold) = args.outlier_threshold {
        builder = builder.outlier_threshold(threshold);
    }
    for (column, ty) in &args.types {
        builder = builder.column_type(column.clone(), *ty);
    }

    Ok(builder.build()?)
}

/// Show what the data looks like without cleaning it.
///
/// Uses `println!` on purpose: this output is the point of `--dry-run` and
/// must not depend on the log level.
fn run_dry_run(args: &Args, source: &Source, data: &DataFrame) -> Result<()> {
    let stats = DatasetStats::compute(data)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("\n{}", "=".repeat(80));
    println!("DRY RUN - Dataset statistics");
    println!("{}\n", "=".repeat(80));

    println!("DATASET OVERVIEW");
    println!("{}", "-".repeat(40));
    println!("  Source: {}", source.label());
    println!("  Rows: {}", stats.total_rows);
    println!("  Columns: {}", stats.total_columns);
    println!("  Missing values: {}", stats.missing_values);
    println!("  Duplicate rows: {}", stats.duplicate_rows);
    println!(
        "  Data quality: {:.1}% non-null",
        autodata_cleaning::data_quality_score(data) * 100.0
    );
    println!();

    println!("COLUMNS");
    println!("{}", "-".repeat(40));
    println!("{:<30} {:<16} {:<10}", "Column", "Type", "Missing");
    println!("{}", "-".repeat(58));
    for (name, dtype) in &stats.column_types {
        let missing = data.column(name).map(|c| c.null_count()).unwrap_or(0);
        println!("{:<30} {:<16} {:<10}", truncate_str(name, 29), dtype, missing);
    }
    println!();

    println!("OUTPUT FILES (will be created)");
    println!("{}", "-".repeat(40));
    let writer = ReportWriter::new(&args.output);
    println!("  - {}", writer.cleaned_path(&source.base_name()).display());
    if args.emit_report {
        println!("  - {}", writer.report_path(&source.base_name()).display());
    }
    println!();

    println!("{}", "=".repeat(80));
    println!("To clean the data, run without --dry-run");
    println!("{}", "=".repeat(80));

    Ok(())
}

/// Truncate a string to `max_len` characters with an ellipsis.
fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

fn run_pipeline(
    pipeline: &CleaningPipeline,
    provider: Option<Arc<dyn AIProvider>>,
    args: &Args,
    source: &Source,
    data: DataFrame,
) -> Result<()> {
    info!("{}", "=".repeat(80));
    info!("Starting data cleaning pipeline...");
    info!("{}", "=".repeat(80));

    let original_df = data.clone();
    let mut outcome = pipeline.process(data).map_err(|e| {
        error!("Pipeline failed: {}", e);
        anyhow!("Pipeline failed: {}", e)
    })?;

    let base_name = source.base_name();
    let writer = ReportWriter::new(&args.output);
    let output_path = writer.write_cleaned_csv(&mut outcome.cleaned, &base_name)?;

    let mut report = CleaningReport::build(
        source.label(),
        output_path.to_str(),
        &original_df,
        &outcome,
    )?;

    let assessor = provider.filter(|_| !args.no_ai).map(AiAssessor::new);
    if args.ai_report {
        match &assessor {
            Some(assessor) => {
                report = report.with_ai_data_report(assessor.generate_data_report(&outcome.cleaned)?)
            }
            None => warn!("--ai-report requested but no AI provider is available"),
        }
    }

    let column_analysis = match (&args.analyze_column, &assessor) {
        (Some(column), Some(assessor)) => {
            match analyze_requested_column(assessor, &outcome.cleaned, column) {
                Ok(analysis) => Some(analysis),
                Err(e) => {
                    warn!("Column analysis skipped: {}", e);
                    None
                }
            }
        }
        (Some(_), None) => {
            warn!("--analyze-column requested but no AI provider is available");
            None
        }
        _ => None,
    };

    if args.emit_report {
        let report_path = writer.write_report(&report, &base_name)?;
        info!("Report written to: {}", report_path.display());
    }

    if args.json {
        let mut json = serde_json::to_value(&report)?;
        if let Some((column, analysis)) = column_analysis {
            json["column_analysis"] = serde_json::json!({ "column": column, "analysis": analysis });
        }
        println!("{}", serde_json::to_string_pretty(&json)?);
        return Ok(());
    }

    print_human_readable_summary(&report, column_analysis.as_ref(), &output_path);
    Ok(())
}

/// Analyze a column of the cleaned frame, accepting its original header too.
fn analyze_requested_column(
    assessor: &AiAssessor,
    cleaned: &DataFrame,
    column: &str,
) -> autodata_cleaning::CleaningResult<(String, String)> {
    let resolved = resolve_column(cleaned, column);
    let analysis = assessor.analyze_column(cleaned, &resolved)?;
    Ok((resolved, analysis))
}

/// Print a human-readable summary of the cleaning results.
fn print_human_readable_summary(
    report: &CleaningReport,
    column_analysis: Option<&(String, String)>,
    output_path: &Path,
) {
    let summary = &report.processing_summary;

    println!();
    println!("{}", "=".repeat(80));
    println!("CLEANING COMPLETE");
    println!("{}", "=".repeat(80));
    println!();

    println!(
        "Input:  {} ({} rows x {} columns)",
        report.source, summary.rows_before, summary.columns_before
    );
    println!(
        "Output: {} ({} rows x {} columns)",
        output_path.display(),
        summary.rows_after,
        summary.columns_after
    );
    println!();

    println!("Processing Summary:");
    println!("  Duration: {}ms", summary.duration_ms);
    println!(
        "  Rows: {} -> {} ({} removed)",
        summary.rows_before, summary.rows_after, summary.rows_removed
    );
    println!(
        "  Data Quality: {:.1}% -> {:.1}%",
        summary.data_quality_before * 100.0,
        summary.data_quality_after * 100.0
    );
    println!();

    if !report.cleaning_steps.is_empty() {
        println!("Cleaning Steps:");
        for step in &report.cleaning_steps {
            println!("  - {}", step);
        }
        println!();
    }

    println!("AI Analysis:");
    for entry in &report.ai_analysis {
        match entry {
            autodata_cleaning::AiAnalysisEntry::Batch(batch) => {
                println!(
                    "  --- Batch {} ({} rows) ---",
                    batch.batch_number, batch.rows_processed
                );
                for line in batch.analysis.lines() {
                    println!("  {}", line);
                }
            }
            autodata_cleaning::AiAnalysisEntry::Error { error } => println!("  ! {}", error),
        }
    }
    println!();

    if let Some((column, analysis)) = column_analysis {
        println!("Column Analysis ({}):", column);
        for line in analysis.lines() {
            println!("  {}", line);
        }
        println!();
    }

    if let Some(ai_report) = &report.ai_data_report {
        println!("AI Data Quality Report:");
        for line in ai_report.lines() {
            println!("  {}", line);
        }
        println!();
    }

    println!("Use --json for machine-readable output");
    println!("Use --emit-report to save detailed JSON report");
    println!("{}", "=".repeat(80));
}
