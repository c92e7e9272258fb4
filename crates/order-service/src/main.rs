// LUGX order service
// Decision: Missing Supabase credentials are fatal outside dev mode

use anyhow::{Context, Result};
use lugx_core::config::{dev_mode, load_dotenv};
use lugx_core::{init_tracing, serve, MetricsRegistry, ServerConfig, SupabaseConfig};
use order_service::{open_table_store, router, AppState, OrderMetrics, DEFAULT_PORT};

#[tokio::main]
async fn main() -> Result<()> {
    load_dotenv();
    init_tracing("order_service=debug,lugx_storage=debug,lugx_core=info,tower_http=debug");

    tracing::info!("order-service starting...");

    let server = ServerConfig::from_env(DEFAULT_PORT).context("Invalid listener configuration")?;

    let store = open_table_store(dev_mode(), SupabaseConfig::from_env())?;
    tracing::info!(backend = store.kind(), "Table store ready");

    let registry = MetricsRegistry::new();
    let metrics = OrderMetrics::register(&registry).context("Failed to register metrics")?;

    let app = router(AppState::new(store, metrics), registry);
    serve(app, server.bind_addr).await
}
