// LUGX analytics service
// Decision: Dev mode swaps ClickHouse for an in-memory event log

use analytics_service::{open_event_store, router, AnalyticsMetrics, AppState, DEFAULT_PORT};
use anyhow::{Context, Result};
use lugx_core::config::{dev_mode, load_dotenv};
use lugx_core::{init_tracing, serve, ClickHouseConfig, CorsConfig, MetricsRegistry, ServerConfig};

#[tokio::main]
async fn main() -> Result<()> {
    load_dotenv();
    init_tracing("analytics_service=debug,lugx_storage=debug,lugx_core=info,tower_http=debug");

    tracing::info!("analytics-service starting...");

    let server = ServerConfig::from_env(DEFAULT_PORT).context("Invalid listener configuration")?;

    let store = open_event_store(dev_mode(), ClickHouseConfig::from_env()).await;
    match &store {
        Some(store) => tracing::info!(backend = store.kind(), "Event store ready"),
        None => tracing::warn!("Event store unavailable, POST /track will answer 500"),
    }

    let registry = MetricsRegistry::new();
    let metrics = AnalyticsMetrics::register(&registry).context("Failed to register metrics")?;

    let cors = CorsConfig::from_env();
    if cors.allows_any() {
        tracing::info!(origins = "*", "CORS open to any origin");
    } else {
        tracing::info!(origins = ?cors.allowed_origins, "CORS origins configured");
    }

    let app = router(AppState::new(store, metrics), registry, &cors);
    serve(app, server.bind_addr).await
}
