// Order service
//
// POST /place-order - insert one order into the Supabase `orders` table
// GET  /orders      - every row of `orders`
// GET  /metrics     - Prometheus counters
// GET  /health      - liveness

use anyhow::Context;
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use lugx_core::{
    health_routes, metrics_routes, parse_object, take_required, ApiError, ConfigError,
    ErrorResponse, HealthInfo, MetricsRegistry, RecordCreated, SupabaseConfig,
};
use lugx_storage::{NewOrder, TableStore, ORDERS_TABLE};
use prometheus::IntCounter;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use utoipa::{OpenApi, ToSchema};

pub const SERVICE_NAME: &str = "order-service";
pub const DEFAULT_PORT: u16 = 5001;

/// Counters exported by this service
pub struct OrderMetrics {
    pub place_order_requests: IntCounter,
    pub get_orders_requests: IntCounter,
}

impl OrderMetrics {
    pub fn register(registry: &MetricsRegistry) -> Result<Self, prometheus::Error> {
        Ok(Self {
            place_order_requests: registry.counter(
                "order_requests_total",
                "Total number of /place-order POST requests",
            )?,
            get_orders_requests: registry
                .counter("get_orders_total", "Total number of /orders GET requests")?,
        })
    }
}

/// App state for order routes
#[derive(Clone)]
pub struct AppState {
    store: TableStore,
    metrics: Arc<OrderMetrics>,
}

impl AppState {
    pub fn new(store: TableStore, metrics: OrderMetrics) -> Self {
        Self {
            store,
            metrics: Arc::new(metrics),
        }
    }
}

/// Order body accepted by `POST /place-order`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PlaceOrderRequest {
    #[schema(example = "Ruzaik")]
    pub customer: String,
    /// Any JSON value, stored with its structure intact. The storefront sends game names.
    #[schema(value_type = Vec<String>, example = json!(["Call of Duty 2", "FIFA 25"]))]
    pub items: Value,
    #[schema(example = 120.98)]
    pub total: f64,
}

/// Pick the table store for this process.
///
/// Dev mode uses in-memory tables. Otherwise Supabase settings are required and
/// any problem with them is returned as a startup error.
pub fn open_table_store(
    dev_mode: bool,
    config: Result<SupabaseConfig, ConfigError>,
) -> anyhow::Result<TableStore> {
    if dev_mode {
        tracing::warn!("LUGX_DEV_MODE enabled, orders are kept in memory only");
        return Ok(TableStore::in_memory());
    }

    let config = config.context("Supabase is not configured")?;
    TableStore::supabase(config.settings()).context("Failed to create Supabase client")
}

#[derive(OpenApi)]
#[openapi(
    paths(place_order, list_orders),
    components(schemas(PlaceOrderRequest, RecordCreated, ErrorResponse)),
    tags((name = "orders", description = "Order placement")),
    info(title = "LUGX Order API", description = "Orders backed by Supabase")
)]
pub struct ApiDoc;

/// Build the full service router
pub fn router(state: AppState, registry: MetricsRegistry) -> Router {
    Router::new()
        .route("/place-order", post(place_order))
        .route("/orders", get(list_orders))
        .with_state(state)
        .route("/api-doc/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .merge(metrics_routes(registry))
        .merge(health_routes(HealthInfo::new(
            SERVICE_NAME,
            env!("CARGO_PKG_VERSION"),
        )))
}

/// POST /place-order - Record an order stamped with the current UTC time
#[utoipa::path(
    post,
    path = "/place-order",
    request_body = PlaceOrderRequest,
    responses(
        (status = 201, description = "Order placed", body = RecordCreated),
        (status = 500, description = "Body is not a JSON object, a field is missing, or Supabase rejected the insert", body = ErrorResponse)
    ),
    tag = "orders"
)]
pub async fn place_order(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<RecordCreated>), ApiError> {
    state.metrics.place_order_requests.inc();

    let mut payload = parse_object(&body)?;
    let [customer, items, total] = take_required(&mut payload, ["customer", "items", "total"])?;

    let order = NewOrder {
        customer,
        items,
        total,
        order_date: Utc::now(),
    };
    let rows = state.store.insert(ORDERS_TABLE, &order).await?;

    tracing::debug!(rows = rows.len(), order_date = %order.order_date, "Order placed");
    Ok((StatusCode::CREATED, Json(RecordCreated::new("Order placed", rows))))
}

/// GET /orders - List every order
#[utoipa::path(
    get,
    path = "/orders",
    responses(
        (status = 200, description = "All rows of the orders table as a JSON array"),
        (status = 500, description = "Supabase query failed", body = ErrorResponse)
    ),
    tag = "orders"
)]
pub async fn list_orders(State(state): State<AppState>) -> Result<Json<Vec<Value>>, ApiError> {
    state.metrics.get_orders_requests.inc();

    let rows = state.store.select_all(ORDERS_TABLE).await?;
    Ok(Json(rows))
}
