//! Survey Dash API server implementation
//!
//! HTTP JSON API using Axum. One dashboard session per server process; every
//! handler goes through the same mutex, so user events are applied one at a
//! time.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use super::handlers;
use crate::core::Dashboard;

/// API Server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

impl ApiConfig {
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }
}

/// Shared application state
pub struct AppState {
    pub version: String,
    pub dashboard: Mutex<Dashboard>,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            dashboard: Mutex::new(Dashboard::new()),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the router with all routes and middleware
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health and info endpoints
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/version", get(handlers::version))
        // Dashboard endpoints
        .route("/api/v1/upload", post(handlers::upload))
        .route("/api/v1/dashboard", get(handlers::dashboard))
        .route("/api/v1/axes", post(handlers::set_axes))
        .route("/api/v1/filters", post(handlers::set_filter))
        .route("/api/v1/filters/clear", post(handlers::clear_filters))
        .route("/api/v1/chart-kind", post(handlers::set_chart_kind))
        .route("/api/v1/chart", get(handlers::chart))
        .route("/api/v1/metrics", get(handlers::metrics))
        .route("/api/v1/insight/request", post(handlers::insight_request))
        .route("/api/v1/insight/reply", post(handlers::insight_reply))
        // State and middleware
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Run the API server
pub async fn run_api_server(config: ApiConfig) -> anyhow::Result<()> {
    crate::telemetry::init_tracing("survey_dash=info,survey_server=info,tower_http=info");

    let app = router(Arc::new(AppState::new()));

    let addr = config.socket_addr()?;
    info!("Survey Dash API server starting on http://{}", addr);
    info!("   Upload: POST /api/v1/upload, State: GET /api/v1/dashboard");
    info!("   Health: /health, Version: /version");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Survey Dash API server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, stopping server...");
}
