//! autodata-server library
//!
//! Axum backend exposing the cleaning pipeline over HTTP: file uploads,
//! database queries and remote JSON APIs all return cleaned records plus the
//! AI quality assessment.

use autodata_cleaning::{CancellationToken, CleaningConfig};
use autodata_cleaning::ai::AIProvider;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod config;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Cleaning configuration applied to every request
    pub config: Arc<CleaningConfig>,
    /// Provider for the AI quality assessment, if one could be created
    pub ai_provider: Option<Arc<dyn AIProvider>>,
    /// Upload size limit in bytes
    pub max_upload_bytes: usize,
    /// Cancelled on shutdown; in-flight pipelines stop at their next check
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(config: CleaningConfig, ai_provider: Option<Arc<dyn AIProvider>>) -> Self {
        Self {
            config: Arc::new(config),
            ai_provider,
            max_upload_bytes: crate::config::DEFAULT_MAX_UPLOAD_MB * 1024 * 1024,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn with_max_upload_bytes(mut self, bytes: usize) -> Self {
        self.max_upload_bytes = bytes;
        self
    }

    /// Whether requests will receive a real AI assessment.
    pub fn ai_available(&self) -> bool {
        self.ai_provider.is_some() && self.config.use_ai
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::post;

    let body_limit = DefaultBodyLimit::max(state.max_upload_bytes);

    Router::new()
        .route("/clean_data/", post(api::clean_data))
        .route("/clean_db/", post(api::clean_db))
        .route("/clean_api/", post(api::clean_api))
        .merge(api::health_routes())
        .layer(body_limit)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
