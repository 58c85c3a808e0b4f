//! AutoData Cleaning Library
//!
//! Rule-based data cleaning with optional AI quality assessment, built on
//! Polars.
//!
//! # Overview
//!
//! Data flows through a fixed pipeline:
//!
//! ```text
//! Ingestion (CSV / Excel / DB / API) -> Rule-Based Cleaner -> Batcher
//!     -> AI Quality Assessor (LLM) -> Output
//! ```
//!
//! - **Ingestion**: CSV and Excel files, JSON records from a REST API, and
//!   PostgreSQL queries (see [`ingest`])
//! - **Cleaning**: duplicate removal, column name standardization, missing
//!   markers, type coercion, missing value strategies, outliers
//!   (see [`DataCleaner`])
//! - **AI Assessment**: cleaned rows are sent to an LLM in fixed-size batches;
//!   when no provider is available the pipeline still returns cleaned data
//! - **Progress Reporting**: stage and batch updates with cancellation support
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use autodata_cleaning::{CleaningConfig, CleaningPipeline, ColumnType, ingest};
//! use std::path::Path;
//!
//! let df = ingest::read_path(Path::new("data.csv"))?;
//!
//! let config = CleaningConfig::builder()
//!     .column_type("price", ColumnType::Float)
//!     .detect_outliers(true)
//!     .build()?;
//!
//! let outcome = CleaningPipeline::builder()
//!     .config(config)
//!     .maybe_ai_provider(autodata_cleaning::ai::provider_from_env())
//!     .build()?
//!     .process(df)?;
//!
//! for step in &outcome.steps {
//!     println!("- {}", step);
//! }
//! ```
//!
//! # AI Providers
//!
//! The assessor talks to models through the [`ai::AIProvider`] trait. The
//! built-in [`ai::GeminiProvider`] (feature `ai`) reads its key from
//! `GEMINI_API_KEY`.

pub mod ai;
pub mod batch;
pub mod cleaner;
pub mod config;
pub mod error;
pub mod ingest;
pub mod pipeline;
pub mod profiler;
pub mod reporting;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use batch::{RowBatch, RowBatches, render_batch_text};
pub use cleaner::DataCleaner;
pub use config::{
    CleaningConfig, CleaningConfigBuilder, ConfigValidationError, MissingValueStrategy,
    OutlierAction, OutlierMethod,
};
pub use error::{CleaningError, Result as CleaningResult, ResultExt};
pub use ingest::FileKind;
pub use pipeline::{
    AI_UNAVAILABLE_MESSAGE, CancellationToken, ClosureProgressReporter, CleaningPipeline,
    CleaningPipelineBuilder, CleaningStage, ProgressReporter, ProgressUpdate, resolve_column,
};
pub use profiler::{data_quality_score, numeric_columns};
pub use reporting::{CleaningReport, ProcessingSummary, ReportWriter};
pub use types::{
    AiAnalysisEntry, AiState, BatchAnalysis, CleaningOutcome, ColumnType, DatasetStats,
};
pub use utils::{clean_numeric_string, is_missing_marker, parse_boolean_string, parse_numeric_string};
