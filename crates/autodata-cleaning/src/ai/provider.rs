//! AI provider trait for abstracting LLM interactions.
//!
//! This module defines the [`AIProvider`] trait that lets the quality
//! assessor talk to any text-generation backend without changing the
//! pipeline logic.
//!
//! # Implementing a New Provider
//!
//! 1. Create a new file in `src/ai/` (e.g., `openai.rs`)
//! 2. Implement the [`AIProvider`] trait for your provider struct
//! 3. Export the provider in `src/ai/mod.rs`

use anyhow::Result;

/// Trait for AI providers that turn a prompt into generated text.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` so a single provider can be shared
/// (behind an `Arc`) by concurrent cleaning jobs.
///
/// # Error Handling
///
/// Implementations should return meaningful errors via `anyhow::Result`.
/// The assessor turns a failed call into a placeholder response instead of
/// failing the whole pipeline.
pub trait AIProvider: Send + Sync {
    /// Send `prompt` to the model and return its text response.
    fn generate(&self, prompt: &str) -> Result<String>;

    /// Get the provider name for logging and debugging.
    fn name(&self) -> &str;

    /// Get the model being used by this provider.
    ///
    /// Returns `None` if the provider doesn't expose model information.
    fn model(&self) -> Option<&str> {
        None
    }
}
