//! HTTP API handlers

pub mod clean;
pub mod error;
pub mod health;

pub use clean::{CleanApiRequest, CleanDbRequest, CleanResponse, clean_api, clean_data, clean_db};
pub use error::{ApiError, ApiResult};
pub use health::{HealthResponse, health_check, health_routes};
