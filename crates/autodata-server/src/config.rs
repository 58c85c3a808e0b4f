//! Server configuration: command-line flags with environment fallbacks.

use autodata_cleaning::{CleaningConfig, ConfigValidationError};
use clap::Parser;
use std::net::SocketAddr;

/// Default upload limit for `POST /clean_data/`, in mebibytes.
pub const DEFAULT_MAX_UPLOAD_MB: usize = 50;

#[derive(Parser, Debug, Clone)]
#[command(name = "autodata-server")]
#[command(version)]
#[command(about = "HTTP backend for the AutoData cleaning pipeline", long_about = None)]
pub struct ServerArgs {
    /// Address to bind
    #[arg(long, env = "AUTODATA_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "AUTODATA_PORT", default_value_t = 8000)]
    pub port: u16,

    /// Rows per AI assessment request
    #[arg(long, env = "AUTODATA_BATCH_SIZE", default_value_t = 20)]
    pub batch_size: usize,

    /// Maximum upload size in MiB
    #[arg(long, env = "AUTODATA_MAX_UPLOAD_MB", default_value_t = DEFAULT_MAX_UPLOAD_MB)]
    pub max_upload_mb: usize,

    /// Disable the AI quality assessment even if GEMINI_API_KEY is set
    #[arg(long, env = "AUTODATA_NO_AI")]
    pub no_ai: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    pub log_level: String,
}

impl ServerArgs {
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        let addr = format!("{}:{}", self.host, self.port);
        addr.parse()
            .map_err(|e| anyhow::anyhow!("Invalid listen address '{}': {}", addr, e))
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }

    /// Cleaning configuration applied to every request.
    pub fn cleaning_config(&self) -> Result<CleaningConfig, ConfigValidationError> {
        CleaningConfig::builder()
            .batch_size(self.batch_size)
            .use_ai(!self.no_ai)
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = ServerArgs::try_parse_from(["autodata-server"]).unwrap();
        assert_eq!(args.port, 8000);
        assert_eq!(args.max_upload_bytes(), 50 * 1024 * 1024);
        assert_eq!(args.socket_addr().unwrap().to_string(), "127.0.0.1:8000");

        let config = args.cleaning_config().unwrap();
        assert_eq!(config.batch_size, 20);
        assert!(config.use_ai);
    }

    #[test]
    fn test_flags() {
        let args = ServerArgs::try_parse_from([
            "autodata-server",
            "--host",
            "0.0.0.0",
            "--port",
            "9000",
            "--batch-size",
            "5",
            "--no-ai",
        ])
        .unwrap();
        assert_eq!(args.socket_addr().unwrap().port(), 9000);

        let config = args.cleaning_config().unwrap();
        assert_eq!(config.batch_size, 5);
        assert!(!config.use_ai);
    }

    #[test]
    fn test_invalid_host() {
        let args = ServerArgs::try_parse_from(["autodata-server", "--host", "not a host"]).unwrap();
        assert!(args.socket_addr().is_err());
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let args = ServerArgs::try_parse_from(["autodata-server", "--batch-size", "0"]).unwrap();
        assert!(args.cleaning_config().is_err());
    }
}
