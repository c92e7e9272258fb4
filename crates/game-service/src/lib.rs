// Game catalog service
//
// POST /add-game - insert one game into the Supabase `games` table
// GET  /games    - every row of `games`
// GET  /metrics  - Prometheus counters
// GET  /health   - liveness

use anyhow::Context;
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use lugx_core::{
    health_routes, metrics_routes, parse_object, take_required, ApiError, ConfigError,
    ErrorResponse, HealthInfo, MetricsRegistry, RecordCreated, SupabaseConfig,
};
use lugx_storage::{NewGame, TableStore, GAMES_TABLE};
use prometheus::IntCounter;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use utoipa::{OpenApi, ToSchema};

pub const SERVICE_NAME: &str = "game-service";
pub const DEFAULT_PORT: u16 = 5000;

/// Counters exported by this service
pub struct CatalogMetrics {
    pub add_game_requests: IntCounter,
    pub get_games_requests: IntCounter,
}

impl CatalogMetrics {
    pub fn register(registry: &MetricsRegistry) -> Result<Self, prometheus::Error> {
        Ok(Self {
            add_game_requests: registry.counter(
                "add_game_requests_total",
                "Total number of /add-game POST requests",
            )?,
            get_games_requests: registry.counter(
                "get_games_requests_total",
                "Total number of /games GET requests",
            )?,
        })
    }
}

/// App state for catalog routes
#[derive(Clone)]
pub struct AppState {
    store: TableStore,
    metrics: Arc<CatalogMetrics>,
}

impl AppState {
    pub fn new(store: TableStore, metrics: CatalogMetrics) -> Self {
        Self {
            store,
            metrics: Arc::new(metrics),
        }
    }
}

/// Game body accepted by `POST /add-game`. Values are forwarded untouched.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AddGameRequest {
    #[schema(example = "Call of Duty 13")]
    pub name: String,
    #[schema(example = "Action")]
    pub category: String,
    #[schema(example = "2022-11-13")]
    pub release_date: String,
    #[schema(example = 69.99)]
    pub price: f64,
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
        tracing::warn!("LUGX_DEV_MODE enabled, games are kept in memory only");
        return Ok(TableStore::in_memory());
    }

    let config = config.context("Supabase is not configured")?;
    TableStore::supabase(config.settings()).context("Failed to create Supabase client")
}

#[derive(OpenApi)]
#[openapi(
    paths(add_game, list_games),
    components(schemas(AddGameRequest, RecordCreated, ErrorResponse)),
    tags((name = "games", description = "Game catalog")),
    info(title = "LUGX Game API", description = "Game catalog backed by Supabase")
)]
pub struct ApiDoc;

/// Build the full service router
pub fn router(state: AppState, registry: MetricsRegistry) -> Router {
    Router::new()
        .route("/add-game", post(add_game))
        .route("/games", get(list_games))
        .with_state(state)
        .route("/api-doc/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .merge(metrics_routes(registry))
        .merge(health_routes(HealthInfo::new(
            SERVICE_NAME,
            env!("CARGO_PKG_VERSION"),
        )))
}

/// POST /add-game - Add a game to the catalog
#[utoipa::path(
    post,
    path = "/add-game",
    request_body = AddGameRequest,
    responses(
        (status = 201, description = "Game added", body = RecordCreated),
        (status = 500, description = "Body is not a JSON object, a field is missing, or Supabase rejected the insert", body = ErrorResponse)
    ),
    tag = "games"
)]
pub async fn add_game(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<RecordCreated>), ApiError> {
    state.metrics.add_game_requests.inc();

    let mut payload = parse_object(&body)?;
    let [name, category, release_date, price] =
        take_required(&mut payload, ["name", "category", "release_date", "price"])?;

    let game = NewGame {
        name,
        category,
        release_date,
        price,
    };
    let rows = state.store.insert(GAMES_TABLE, &game).await?;

    tracing::debug!(rows = rows.len(), "Game added");
    Ok((StatusCode::CREATED, Json(RecordCreated::new("Game added!", rows))))
}

/// GET /games - List every game
#[utoipa::path(
    get,
    path = "/games",
    responses(
        (status = 200, description = "All rows of the games table as a JSON array"),
        (status = 500, description = "Supabase query failed", body = ErrorResponse)
    ),
    tag = "games"
)]
pub async fn list_games(State(state): State<AppState>) -> Result<Json<Vec<Value>>, ApiError> {
    state.metrics.get_games_requests.inc();

    let rows = state.store.select_all(GAMES_TABLE).await?;
    Ok(Json(rows))
}
