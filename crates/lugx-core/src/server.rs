// Server bootstrap shared by all services

use anyhow::{Context, Result};
use axum::http::{header, Method};
use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use std::net::SocketAddr;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::CorsConfig;

/// Static facts reported by `GET /health`
#[derive(Debug, Clone)]
pub struct HealthInfo {
    pub service: &'static str,
    pub version: &'static str,
    /// Backend status, when the service tracks one
    pub backend: Option<&'static str>,
}

impl HealthInfo {
    pub fn new(service: &'static str, version: &'static str) -> Self {
        Self {
            service,
            version,
            backend: None,
        }
    }

    pub fn with_backend(mut self, backend: &'static str) -> Self {
        self.backend = Some(backend);
        self
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
    version: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    backend: Option<&'static str>,
}

async fn health(State(info): State<HealthInfo>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: info.service,
        version: info.version,
        backend: info.backend,
    })
}

/// `GET /health` route
pub fn health_routes(info: HealthInfo) -> Router {
    Router::new().route("/health", get(health)).with_state(info)
}

/// CORS layer for browser-facing services.
///
/// With no configured origins every origin is allowed, without credentials.
pub fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origin = if config.allows_any() {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(config.allowed_origins.clone())
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::ORIGIN])
}

/// Bind `addr` and serve `app` with request tracing until the process stops.
pub async fn serve(app: Router, addr: SocketAddr) -> Result<()> {
    let app = app.layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
