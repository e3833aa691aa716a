//! HTTP surface: two upload routes behind an IP allow-list, plus a health probe.

pub mod allow_list;
pub mod config;
pub mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::DefaultBodyLimit;
use axum::http::header::CONTENT_TYPE;
use axum::http::Method;
use axum::routing::{get, post};
use axum::{middleware, Router};
use tower_http::cors::{Any, CorsLayer};

use crate::application::ReportService;

pub use allow_list::AllowList;
pub use config::{Environment, ServerConfig};

/// Shared per-server state handed to every handler. Holds no request data.
#[derive(Clone)]
pub struct AppState {
    pub service: ReportService,
    pub allow_list: Arc<AllowList>,
}

impl AppState {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            service: ReportService::new(config.aggregate.clone()),
            allow_list: Arc::new(AllowList::from_config(config)),
        }
    }
}

/// Build the application router. Browsers on any origin may call it; the
/// allow-list still decides who gets through to the upload routes.
pub fn router(config: &ServerConfig) -> Router {
    let state = AppState::from_config(config);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE]);

    let uploads = Router::new()
        .route("/process", post(handlers::process_upload))
        .route("/api/process", post(handlers::process_upload))
        .route("/poule-viewer", post(handlers::poule_viewer))
        .route("/api/poule-viewer", post(handlers::poule_viewer))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            allow_list::enforce_allow_list,
        ))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes));

    Router::new()
        .route("/health", get(handlers::health))
        .merge(uploads)
        .with_state(state)
        .layer(cors)
}

/// Bind and serve until Ctrl+C.
pub async fn serve(config: ServerConfig) -> Result<()> {
    tracing::info!(environment = %config.environment, "starting omzet");
    match config.environment {
        Environment::Development => {
            tracing::warn!("development environment: IP allow-list disabled")
        }
        Environment::Production if config.allowed_ips.is_empty() => {
            tracing::warn!("no allowed IPs configured; every upload will be rejected")
        }
        Environment::Production => {
            tracing::info!("allowed IPs: {:?}", config.allowed_ips)
        }
    }

    let app = router(&config);
    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;

    tracing::info!("HTTP server listening on {}", config.bind_addr);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("HTTP server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
