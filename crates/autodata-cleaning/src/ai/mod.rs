//! AI module for LLM-powered data quality assessment.
//!
//! This module provides a trait-based abstraction for AI providers and the
//! [`AiAssessor`] agent that turns row batches into quality reports.
//!
//! # Feature Flag
//!
//! The concrete [`GeminiProvider`] requires the `ai` feature flag. The
//! [`AIProvider`] trait and the assessor are always available, so custom
//! providers work without it.
//!
//! ```toml
//! # Enable AI support (default)
//! autodata-cleaning = { version = "0.1", features = ["ai"] }
//!
//! # Rule-based cleaning only
//! autodata-cleaning = { version = "0.1", default-features = false }
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use autodata_cleaning::ai::{AiAssessor, GeminiProvider};
//! use std::sync::Arc;
//!
//! let provider = Arc::new(GeminiProvider::new("your-api-key")?);
//! let assessor = AiAssessor::new(provider);
//! let report = assessor.generate_data_report(&df)?;
//! ```

mod assessor;
mod provider;

pub use assessor::{AGENT_ERROR_RESPONSE, AiAssessor, batch_prompt};
pub use provider::AIProvider;

#[cfg(feature = "ai")]
mod gemini;

#[cfg(feature = "ai")]
pub use gemini::{DEFAULT_MODEL, GeminiConfig, GeminiConfigBuilder, GeminiProvider};

use std::sync::Arc;
use tracing::warn;

/// Environment variable holding the Gemini API key.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Environment variable overriding the Gemini model.
pub const MODEL_ENV: &str = "GEMINI_MODEL";

/// Build the default provider from the environment.
///
/// Returns `None` (with a warning) when no API key is configured or the client
/// cannot be created, so callers fall back to rule-based cleaning only.
#[cfg(feature = "ai")]
pub fn provider_from_env() -> Option<Arc<dyn AIProvider>> {
    let api_key = match std::env::var(API_KEY_ENV) {
        Ok(key) if !key.trim().is_empty() => key,
        _ => {
            warn!("{} is not set; AI analysis is disabled", API_KEY_ENV);
            return None;
        }
    };

    let mut config = GeminiConfig::builder();
    if let Ok(model) = std::env::var(MODEL_ENV)
        && !model.trim().is_empty()
    {
        config = config.model(model.trim());
    }

    match GeminiProvider::with_config(api_key, config.build()) {
        Ok(provider) => Some(Arc::new(provider)),
        Err(e) => {
            warn!("Failed to initialize Gemini provider: {}", e);
            None
        }
    }
}

/// Without the `ai` feature there is no built-in provider.
#[cfg(not(feature = "ai"))]
pub fn provider_from_env() -> Option<Arc<dyn AIProvider>> {
    warn!("Built without the `ai` feature; AI analysis is disabled");
    None
}
