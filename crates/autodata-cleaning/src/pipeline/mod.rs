//! Pipeline module.
//!
//! This module provides the cleaning pipeline together with progress
//! reporting and cancellation support.

mod builder;
pub mod progress;

pub use builder::{
    AI_UNAVAILABLE_MESSAGE, CleaningPipeline, CleaningPipelineBuilder, resolve_column,
};
pub use progress::{
    CancellationToken, ClosureProgressReporter, CleaningStage, ProgressReporter, ProgressUpdate,
};
