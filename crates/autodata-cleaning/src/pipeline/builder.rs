//! The cleaning pipeline and its builder.
//!
//! A pipeline runs the rule-based cleaner over a dataset and then, when an AI
//! provider is available, sends the cleaned rows to the assessor in batches.

use crate::ai::{AIProvider, AiAssessor};
use crate::cleaner::{DataCleaner, clean_column_name};
use crate::config::{CleaningConfig, ConfigValidationError, OutlierAction};
use crate::error::{CleaningError, Result};
use crate::pipeline::progress::{
    CancellationToken, ClosureProgressReporter, CleaningStage, ProgressReporter, ProgressUpdate,
};
use crate::types::{AiAnalysisEntry, CleaningOutcome, ColumnType};
use polars::prelude::*;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Error entry returned when AI assessment is disabled or no provider is set.
pub const AI_UNAVAILABLE_MESSAGE: &str = "AI agent not available";

/// The cleaning pipeline.
///
/// Use [`CleaningPipeline::builder()`] to create a pipeline with custom
/// configuration.
///
/// # Example
///
/// ```rust,ignore
/// use autodata_cleaning::{CleaningConfig, CleaningPipeline};
/// use autodata_cleaning::ai::GeminiProvider;
/// use std::sync::Arc;
///
/// let provider = Arc::new(GeminiProvider::new(api_key)?);
///
/// let outcome = CleaningPipeline::builder()
///     .ai_provider(provider)
///     .on_progress(|update| {
///         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
///     })
///     .config(CleaningConfig::builder().batch_size(50).build()?)
///     .build()?
///     .process(dataframe)?;
/// ```
pub struct CleaningPipeline {
    config: CleaningConfig,
    ai_provider: Option<Arc<dyn AIProvider>>,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
    cancellation_token: CancellationToken,
}

// Moved onto the blocking pool by the server
static_assertions::assert_impl_all!(CleaningPipeline: Send);

impl CleaningPipeline {
    /// Create a new pipeline builder.
    pub fn builder() -> CleaningPipelineBuilder {
        CleaningPipelineBuilder::default()
    }

    pub fn config(&self) -> &CleaningConfig {
        &self.config
    }

    /// Whether this pipeline will call an AI provider.
    pub fn ai_enabled(&self) -> bool {
        self.config.use_ai && self.ai_provider.is_some()
    }

    /// Clean `df` and assess the result.
    ///
    /// # Errors
    ///
    /// Returns `Err(CleaningError::Cancelled)` if the cancellation token was
    /// triggered. AI failures never fail the pipeline; they are reported in
    /// [`CleaningOutcome::ai_analysis`].
    pub fn process(&self, df: DataFrame) -> Result<CleaningOutcome> {
        match self.process_internal(df) {
            Ok(outcome) => {
                self.report_progress(ProgressUpdate::complete("Cleaning completed successfully"));
                Ok(outcome)
            }
            Err(e) => {
                if e.is_cancelled() {
                    self.report_progress(ProgressUpdate::cancelled());
                } else {
                    self.report_progress(ProgressUpdate::failed(e.to_string()));
                }
                error!("Pipeline error: {}", e);
                Err(e)
            }
        }
    }

    fn check_cancelled(&self) -> Result<()> {
        if self.cancellation_token.is_cancelled() {
            return Err(CleaningError::Cancelled);
        }
        Ok(())
    }

    fn report_progress(&self, update: ProgressUpdate) {
        if let Some(reporter) = &self.progress_reporter {
            reporter.report(update);
        }
    }

    /// Report the start of `stage` and check for cancellation.
    fn enter_stage(&self, stage: CleaningStage) -> Result<()> {
        self.check_cancelled()?;
        debug!("Stage: {}", stage.display_name());
        self.report_progress(ProgressUpdate::new(
            stage,
            0.0,
            format!("{}...", stage.display_name()),
        ));
        Ok(())
    }

    fn process_internal(&self, df: DataFrame) -> Result<CleaningOutcome> {
        let start_time = Instant::now();
        let config = &self.config;

        info!("Starting cleaning pipeline...");
        self.report_progress(ProgressUpdate::new(
            CleaningStage::Initializing,
            0.0,
            "Starting cleaning pipeline...",
        ));

        let original_shape = df.shape();
        info!(
            "Input dataset: {} rows x {} columns",
            original_shape.0, original_shape.1
        );
        let mut cleaner = DataCleaner::new(df);

        if config.remove_duplicates {
            self.enter_stage(CleaningStage::Deduplication)?;
            cleaner.remove_duplicates()?;
        }

        if config.clean_column_names {
            self.enter_stage(CleaningStage::ColumnNames)?;
            cleaner.clean_column_names()?;
        }

        if config.normalize_missing_markers {
            self.enter_stage(CleaningStage::MissingMarkers)?;
            cleaner.normalize_missing_markers()?;
        }

        if !config.column_types.is_empty() {
            self.enter_stage(CleaningStage::TypeConversion)?;
            let column_types = self.resolve_type_map(cleaner.get_clean_data());
            cleaner.fix_data_types(&column_types)?;
        }

        self.enter_stage(CleaningStage::MissingValues)?;
        let missing_columns = config
            .missing_columns
            .as_deref()
            .map(|cols| self.resolve_columns(cleaner.get_clean_data(), cols));
        cleaner.handle_missing_values(config.missing_strategy, missing_columns.as_deref())?;

        if config.detect_outliers {
            self.enter_stage(CleaningStage::OutlierHandling)?;
            let columns = config
                .outlier_columns
                .as_deref()
                .map(|cols| self.resolve_columns(cleaner.get_clean_data(), cols));
            let threshold = config.effective_outlier_threshold();
            match config.outlier_action {
                OutlierAction::Remove => {
                    cleaner.remove_outliers(columns.as_deref(), config.outlier_method, threshold)?
                }
                OutlierAction::Cap => {
                    cleaner.cap_outliers(columns.as_deref(), config.outlier_method, threshold)?
                }
            };
        }

        self.check_cancelled()?;
        let (cleaned, steps) = cleaner.into_parts();
        let cleaned_shape = cleaned.shape();
        info!(
            "Rule-based cleaning complete: {} rows x {} columns ({} steps)",
            cleaned_shape.0,
            cleaned_shape.1,
            steps.len()
        );

        let ai_analysis = self.assess(&cleaned)?;

        let duration_ms = start_time.elapsed().as_millis() as u64;
        info!("Cleaning pipeline completed in {} ms", duration_ms);

        Ok(CleaningOutcome {
            cleaned,
            original_shape,
            cleaned_shape,
            steps,
            ai_analysis,
            duration_ms,
        })
    }

    /// Run the AI assessor over `df` in batches.
    ///
    /// Only cancellation is propagated; every other failure becomes an error
    /// entry in the returned analysis.
    fn assess(&self, df: &DataFrame) -> Result<Vec<AiAnalysisEntry>> {
        let provider = match &self.ai_provider {
            Some(provider) if self.config.use_ai => provider.clone(),
            _ => {
                info!("AI assessment skipped: {}", AI_UNAVAILABLE_MESSAGE);
                return Ok(vec![AiAnalysisEntry::error(AI_UNAVAILABLE_MESSAGE)]);
            }
        };

        self.enter_stage(CleaningStage::AiAssessment)?;
        info!(
            "Running AI assessment with {} (batch size {})",
            provider.name(),
            self.config.batch_size
        );

        let assessor = AiAssessor::new(provider);
        let result = assessor.process_data(df, self.config.batch_size, |number, total| {
            self.report_progress(ProgressUpdate::with_items(
                CleaningStage::AiAssessment,
                format!("Batch {}/{}", number, total),
                number - 1,
                total,
                format!("Analyzing batch {} of {}", number, total),
            ));
            self.check_cancelled()
        });

        match result {
            Ok(analyses) => Ok(analyses.into_iter().map(AiAnalysisEntry::Batch).collect()),
            Err(e) if e.is_cancelled() => Err(e),
            Err(e) => {
                warn!("AI processing failed: {}", e);
                Ok(vec![AiAnalysisEntry::error(format!(
                    "AI processing failed: {}",
                    e
                ))])
            }
        }
    }

    /// Map configured column names onto the frame.
    ///
    /// Names are used as given when present; otherwise their standardized form
    /// is tried, so configs written against the raw headers keep working after
    /// column names were cleaned.
    fn resolve_columns(&self, df: &DataFrame, columns: &[String]) -> Vec<String> {
        columns
            .iter()
            .map(|name| resolve_column(df, name))
            .collect()
    }

    fn resolve_type_map(&self, df: &DataFrame) -> BTreeMap<String, ColumnType> {
        self.config
            .column_types
            .iter()
            .map(|(name, ty)| (resolve_column(df, name), *ty))
            .collect()
    }
}

/// Name of `name` in `df`: as given when present, else its standardized form
/// when that exists, else unchanged.
pub fn resolve_column(df: &DataFrame, name: &str) -> String {
    if df.column(name).is_ok() {
        return name.to_string();
    }
    let cleaned = clean_column_name(name);
    if df.column(&cleaned).is_ok() {
        cleaned
    } else {
        name.to_string()
    }
}

/// Builder for [`CleaningPipeline`].
#[derive(Default)]
pub struct CleaningPipelineBuilder {
    config: Option<CleaningConfig>,
    ai_provider: Option<Arc<dyn AIProvider>>,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
    cancellation_token: Option<CancellationToken>,
}

static_assertions::assert_impl_all!(CleaningPipelineBuilder: Send);

impl CleaningPipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: CleaningConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the AI provider used for quality assessment.
    ///
    /// Providers are shared through `Arc`, so one client can serve many
    /// pipeline runs. Without a provider the outcome's AI analysis holds a
    /// single "AI agent not available" entry.
    pub fn ai_provider(mut self, provider: Arc<dyn AIProvider>) -> Self {
        self.ai_provider = Some(provider);
        self
    }

    /// Set the AI provider if one is available.
    pub fn maybe_ai_provider(mut self, provider: Option<Arc<dyn AIProvider>>) -> Self {
        self.ai_provider = provider;
        self
    }

    /// Set a progress reporter for receiving updates during processing.
    pub fn progress_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress_reporter = Some(reporter);
        self
    }

    /// Set a progress callback closure.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let pipeline = CleaningPipeline::builder()
    ///     .on_progress(|update| {
    ///         println!("[{:.0}%] {:?}: {}",
    ///             update.progress * 100.0,
    ///             update.stage,
    ///             update.message
    ///         );
    ///     })
    ///     .build()?;
    /// ```
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress_reporter = Some(Arc::new(ClosureProgressReporter::new(callback)));
        self
    }

    /// Set a cancellation token for stopping the pipeline.
    pub fn cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = Some(token);
        self
    }

    /// Build the pipeline.
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> std::result::Result<CleaningPipeline, ConfigValidationError> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        Ok(CleaningPipeline {
            config,
            ai_provider: self.ai_provider,
            progress_reporter: self.progress_reporter,
            cancellation_token: self.cancellation_token.unwrap_or_default(),
        })
    }
}
