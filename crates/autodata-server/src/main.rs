//! autodata-server - HTTP backend for the AutoData cleaning pipeline

use anyhow::{Context, Result};
use autodata_cleaning::ai;
use autodata_server::config::ServerArgs;
use autodata_server::{AppState, build_router};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let args = ServerArgs::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},tower_http=debug", args.log_level)));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting autodata-server v{}", env!("CARGO_PKG_VERSION"));

    let config = args
        .cleaning_config()
        .context("Invalid cleaning configuration")?;

    // The Gemini client is blocking: create it (and drop it) outside the runtime.
    let ai_provider = if args.no_ai {
        info!("AI analysis disabled by configuration");
        None
    } else {
        ai::provider_from_env()
    };
    match &ai_provider {
        Some(provider) => info!("AI agent available: {}", provider.name()),
        None => warn!("AI agent not available; responses will carry rule-based cleaning only"),
    }

    let addr = args.socket_addr()?;
    let state = AppState::new(config, ai_provider.clone())
        .with_max_upload_bytes(args.max_upload_bytes());
    let shutdown = state.shutdown.clone();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    runtime.block_on(async move {
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {}", addr))?;
        info!("autodata-server listening on http://{}", addr);
        info!("Health check: http://{}/health", addr);

        axum::serve(listener, build_router(state))
            .with_graceful_shutdown(async move {
                shutdown_signal().await;
                shutdown.cancel();
            })
            .await
            .context("Server error")
    })?;

    drop(runtime);
    drop(ai_provider);
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
