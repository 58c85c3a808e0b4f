//! Cleaning endpoints: file upload, database query and remote JSON API.

use autodata_cleaning::{
    AiAnalysisEntry, CleaningError, CleaningOutcome, CleaningPipeline, FileKind, ingest,
};
use axum::{
    Json,
    extract::{Multipart, State, rejection::JsonRejection},
};
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::info;

use super::error::{ApiError, ApiResult};
use crate::AppState;

/// Body returned by every cleaning endpoint.
#[derive(Debug, Serialize)]
pub struct CleanResponse {
    pub cleaned_data: Vec<Map<String, Value>>,
    pub ai_analysis: Vec<AiAnalysisEntry>,
    pub original_shape: (usize, usize),
    pub cleaned_shape: (usize, usize),
}

impl CleanResponse {
    fn from_outcome(outcome: CleaningOutcome) -> Result<Self, CleaningError> {
        Ok(Self {
            cleaned_data: ingest::dataframe_to_records(&outcome.cleaned)?,
            ai_analysis: outcome.ai_analysis,
            original_shape: outcome.original_shape,
            cleaned_shape: outcome.cleaned_shape,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct CleanDbRequest {
    pub query: String,
    pub db_url: String,
}

#[derive(Debug, Deserialize)]
pub struct CleanApiRequest {
    pub api_url: String,
}

/// POST /clean_data/
///
/// Multipart upload with a `file` field holding a CSV or Excel workbook.
pub async fn clean_data(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<CleanResponse>> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let kind = FileKind::from_filename(&filename)?;
        let bytes = field.bytes().await?;
        info!("Received upload '{}' ({} bytes)", filename, bytes.len());

        let response = run_blocking(state, move || ingest::read_bytes(kind, &bytes)).await?;
        return Ok(Json(response));
    }

    Err(ApiError::BadRequest(
        "No file uploaded. Send a multipart field named 'file'.".to_string(),
    ))
}

/// POST /clean_db/
pub async fn clean_db(
    State(state): State<AppState>,
    body: Result<Json<CleanDbRequest>, JsonRejection>,
) -> ApiResult<Json<CleanResponse>> {
    let Json(request) = body?;
    if request.query.trim().is_empty() || request.db_url.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "Both 'query' and 'db_url' are required".to_string(),
        ));
    }

    info!("Cleaning database query result");
    let df = ingest::load_from_database(&request.db_url, &request.query).await?;
    let response = run_blocking(state, move || Ok(df)).await?;
    Ok(Json(response))
}

/// POST /clean_api/
pub async fn clean_api(
    State(state): State<AppState>,
    body: Result<Json<CleanApiRequest>, JsonRejection>,
) -> ApiResult<Json<CleanResponse>> {
    let Json(request) = body?;
    if request.api_url.trim().is_empty() {
        return Err(ApiError::BadRequest("'api_url' is required".to_string()));
    }

    let df = ingest::fetch_from_api(request.api_url.trim()).await?;
    let response = run_blocking(state, move || Ok(df)).await?;
    Ok(Json(response))
}

/// Load the frame and run the pipeline on the blocking pool.
///
/// The AI provider issues blocking HTTP calls, so neither step may run on a
/// reactor thread.
async fn run_blocking<F>(state: AppState, load: F) -> ApiResult<CleanResponse>
where
    F: FnOnce() -> Result<DataFrame, CleaningError> + Send + 'static,
{
    let task = tokio::task::spawn_blocking(move || -> Result<CleanResponse, CleaningError> {
        let df = load()?;
        info!("Original data shape: {:?}", df.shape());

        let pipeline = CleaningPipeline::builder()
            .config(state.config.as_ref().clone())
            .maybe_ai_provider(state.ai_provider.clone())
            .cancellation_token(state.shutdown.clone())
            .build()
            .map_err(|e| CleaningError::InvalidConfig(e.to_string()))?;

        let outcome = pipeline.process(df)?;
        info!(
            "Cleaned data shape: {:?} in {} ms",
            outcome.cleaned_shape, outcome.duration_ms
        );
        CleanResponse::from_outcome(outcome)
    });

    match task.await {
        Ok(result) => Ok(result?),
        Err(e) => Err(ApiError::Internal(format!("Cleaning task failed: {}", e))),
    }
}
