use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use pdfsift_core::config_file;
use pdfsift_pdf::Pipeline;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod handlers;
mod models;
mod state;
mod upload;

use state::AppState;

const DEFAULT_ADDR: &str = "0.0.0.0:5002";

/// Headroom on top of the input limit for multipart framing, so an oversized
/// PDF reaches the guard and gets a JSON 413 instead of a bare rejection.
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

pub fn app(state: Arc<AppState>) -> Router {
    let body_limit = state.pipeline.config().limits.max_input_bytes + MULTIPART_OVERHEAD;

    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/extract", post(handlers::extract::extract))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = config_file::load_config()
        .with_env_overrides()
        .into_pipeline_config()?;
    tracing::info!(
        max_input_bytes = config.limits.max_input_bytes,
        page_cap = config.extract.page_cap,
        strategy_timeout = ?config.strategy_timeout,
        "pipeline configured"
    );

    let state = Arc::new(AppState {
        pipeline: Pipeline::new(config),
    });

    let addr: SocketAddr = std::env::var("PDFSIFT_ADDR")
        .unwrap_or_else(|_| DEFAULT_ADDR.to_string())
        .parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "listening");

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
