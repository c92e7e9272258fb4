// Analytics ingest service
//
// POST /track   - record one page event in ClickHouse
// GET  /metrics - Prometheus counters
// GET  /health  - liveness plus backend status
//
// The ClickHouse handle is optional: when it could not be established at
// startup the service still runs and every /track answers 500.

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use lugx_core::{
    cors_layer, health_routes, metrics_routes, non_empty_str, parse_object, ApiError,
    ClickHouseConfig, ConfigError, CorsConfig, ErrorResponse, HealthInfo, MessageResponse,
    MetricsRegistry,
};
use lugx_storage::{ClickHouseSettings, EventStore, NewAnalyticsEvent};
use prometheus::IntCounter;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{OpenApi, ToSchema};

pub const SERVICE_NAME: &str = "analytics-service";
pub const DEFAULT_PORT: u16 = 5002;

/// Error text returned while ClickHouse is unavailable; clients match on it
pub const BACKEND_UNAVAILABLE: &str = "ClickHouse client not available";
pub const MISSING_FIELDS: &str = "Missing fields";
const UNKNOWN_USER_AGENT: &str = "Unknown";

/// Counters exported by this service
pub struct AnalyticsMetrics {
    pub track_requests: IntCounter,
}

impl AnalyticsMetrics {
    pub fn register(registry: &MetricsRegistry) -> Result<Self, prometheus::Error> {
        Ok(Self {
            track_requests: registry.counter(
                "track_requests_total",
                "Total number of /track POST requests",
            )?,
        })
    }
}

/// App state for analytics routes
#[derive(Clone)]
pub struct AppState {
    store: Option<EventStore>,
    metrics: Arc<AnalyticsMetrics>,
}

impl AppState {
    pub fn new(store: Option<EventStore>, metrics: AnalyticsMetrics) -> Self {
        Self {
            store,
            metrics: Arc::new(metrics),
        }
    }

    pub fn backend_available(&self) -> bool {
        self.store.is_some()
    }
}

/// Connect to ClickHouse and prepare the table.
///
/// Failures are logged and yield `None`, which keeps the service up with /track disabled.
pub async fn connect_event_store(settings: ClickHouseSettings) -> Option<EventStore> {
    match EventStore::clickhouse(settings).await {
        Ok(store) => Some(store),
        Err(e) => {
            tracing::error!("ClickHouse connection failed: {}", e);
            None
        }
    }
}

/// Pick the event store for this process.
///
/// Dev mode uses the in-memory log. Otherwise missing configuration or a failed
/// connection is logged and the service runs with /track disabled.
pub async fn open_event_store(
    dev_mode: bool,
    config: Result<ClickHouseConfig, ConfigError>,
) -> Option<EventStore> {
    if dev_mode {
        tracing::warn!("LUGX_DEV_MODE enabled, events are kept in memory only");
        return Some(EventStore::in_memory());
    }

    match config {
        Ok(config) => connect_event_store(config.settings()).await,
        Err(e) => {
            tracing::error!("ClickHouse connection failed: {}", e);
            None
        }
    }
}

/// Event body accepted by `POST /track`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TrackEventRequest {
    /// Kind of interaction, e.g. "page_view", "scroll", "click".
    #[schema(example = "page_view")]
    pub event_type: String,
    /// Path of the page the event happened on.
    #[schema(example = "/index.html")]
    pub page_url: String,
}

#[derive(OpenApi)]
#[openapi(
    paths(track_event),
    components(schemas(TrackEventRequest, MessageResponse, ErrorResponse)),
    tags((name = "analytics", description = "Web analytics ingestion")),
    info(title = "LUGX Analytics API", description = "Page event ingestion into ClickHouse")
)]
pub struct ApiDoc;

/// Build the full service router
pub fn router(state: AppState, registry: MetricsRegistry, cors: &CorsConfig) -> Router {
    let backend = if state.backend_available() {
        "connected"
    } else {
        "unavailable"
    };

    Router::new()
        .route("/track", post(track_event))
        .with_state(state)
        .route("/api-doc/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .merge(metrics_routes(registry))
        .merge(health_routes(
            HealthInfo::new(SERVICE_NAME, env!("CARGO_PKG_VERSION")).with_backend(backend),
        ))
        .layer(cors_layer(cors))
}

/// POST /track - Record a page event
#[utoipa::path(
    post,
    path = "/track",
    request_body = TrackEventRequest,
    responses(
        (status = 201, description = "Event recorded", body = MessageResponse),
        (status = 400, description = "event_type or page_url missing or empty", body = ErrorResponse),
        (status = 500, description = "ClickHouse unavailable, body not a JSON object, or insert failed", body = ErrorResponse)
    ),
    tag = "analytics"
)]
pub async fn track_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    state.metrics.track_requests.inc();

    let store = state
        .store
        .as_ref()
        .ok_or_else(|| ApiError::backend_unavailable(BACKEND_UNAVAILABLE))?;

    let payload = parse_object(&body)?;
    let (Some(event_type), Some(page_url)) = (
        non_empty_str(&payload, "event_type"),
        non_empty_str(&payload, "page_url"),
    ) else {
        return Err(ApiError::bad_request(MISSING_FIELDS));
    };

    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or(UNKNOWN_USER_AGENT)
        .to_string();

    let event = NewAnalyticsEvent {
        event_type,
        page_url,
        user_agent,
    };
    store.insert_event(&event).await?;

    tracing::debug!(
        event_type = %event.event_type,
        page_url = %event.page_url,
        "Event recorded"
    );
    Ok((StatusCode::CREATED, Json(MessageResponse::new("Event recorded"))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use lugx_storage::{ClickHouseClient, InMemoryEventStore};
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct TestApp {
        app: Router,
        registry: MetricsRegistry,
    }

    fn test_app(store: Option<EventStore>) -> TestApp {
        let registry = MetricsRegistry::new();
        let metrics = AnalyticsMetrics::register(&registry).unwrap();
        let app = router(
            AppState::new(store, metrics),
            registry.clone(),
            &CorsConfig::default(),
        );
        TestApp { app, registry }
    }

    fn in_memory() -> (Arc<InMemoryEventStore>, Option<EventStore>) {
        let events = Arc::new(InMemoryEventStore::new());
        (events.clone(), Some(EventStore::InMemory(events)))
    }

    fn clickhouse_settings(host: String) -> ClickHouseSettings {
        ClickHouseSettings {
            host,
            port: None,
            secure: false,
            username: "default".to_string(),
            password: "secret".to_string(),
            database: None,
        }
    }

    fn track(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/track")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
    }

    fn track_count(registry: &MetricsRegistry) -> String {
        registry
            .render()
            .unwrap()
            .lines()
            .find(|l| l.starts_with("track_requests_total "))
            .unwrap()
            .to_string()
    }

    #[tokio::test]
    async fn test_track_records_event() {
        let (events, store) = in_memory();
        let test = test_app(store);

        let request = Request::builder()
            .method("POST")
            .uri("/track")
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::USER_AGENT, "Mozilla/5.0")
            .body(Body::from(r#"{"event_type": "page_view", "page_url": "/index.html"}"#))
            .unwrap();
        let (status, body) = send(&test.app, request).await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body, json!({"message": "Event recorded"}));

        let stored = events.events();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].event_type, "page_view");
        assert_eq!(stored[0].page_url, "/index.html");
        assert_eq!(stored[0].user_agent, "Mozilla/5.0");
        assert_eq!(track_count(&test.registry), "track_requests_total 1");
    }

    #[tokio::test]
    async fn test_track_defaults_user_agent() {
        let (events, store) = in_memory();
        let test = test_app(store);

        let (status, _) = send(&test.app, track(r#"{"event_type": "click", "page_url": "/"}"#)).await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(events.events()[0].user_agent, "Unknown");
    }

    #[tokio::test]
    async fn test_track_counts_each_request() {
        let (events, store) = in_memory();
        let test = test_app(store);

        for page in ["/", "/shop", "/about"] {
            let body = json!({"event_type": "page_view", "page_url": page}).to_string();
            let (status, _) = send(&test.app, track(&body)).await;
            assert_eq!(status, StatusCode::CREATED);
        }

        assert_eq!(events.len(), 3);
        assert_eq!(track_count(&test.registry), "track_requests_total 3");
    }

    #[tokio::test]
    async fn test_track_rejects_missing_fields() {
        let (events, store) = in_memory();
        let test = test_app(store);

        let bodies = [
            r#"{"page_url": "/"}"#,
            r#"{"event_type": "click"}"#,
            r#"{"event_type": "", "page_url": "/"}"#,
            r#"{"event_type": "click", "page_url": ""}"#,
            r#"{"event_type": 5, "page_url": "/"}"#,
            "{}",
        ];
        for body in bodies {
            let (status, json) = send(&test.app, track(body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "body: {body}");
            assert_eq!(json, json!({"error": "Missing fields"}));
        }

        assert!(events.is_empty());
        // Failed requests are still counted
        assert_eq!(
            track_count(&test.registry),
            format!("track_requests_total {}", bodies.len())
        );
    }

    #[tokio::test]
    async fn test_track_non_object_body_is_server_error() {
        let (events, store) = in_memory();
        let test = test_app(store);

        let (status, body) = send(&test.app, track("[]")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"error": "Request body must be a JSON object"}));

        for raw in ["not json", "", "null"] {
            let (status, body) = send(&test.app, track(raw)).await;
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "body: {raw}");
            assert!(body["error"].is_string(), "body: {raw}");
        }

        assert!(events.is_empty());
        assert_eq!(track_count(&test.registry), "track_requests_total 4");
    }

    #[tokio::test]
    async fn test_missing_clickhouse_config_disables_track() {
        let store = open_event_store(false, Err(ConfigError::Missing("CLICKHOUSE_HOST"))).await;
        assert!(store.is_none());

        let test = test_app(store);
        let (status, body) = send(
            &test.app,
            track(r#"{"event_type": "page_view", "page_url": "/"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"error": BACKEND_UNAVAILABLE}));
    }

    #[tokio::test]
    async fn test_dev_mode_ignores_clickhouse_config() {
        let store = open_event_store(true, Err(ConfigError::Missing("CLICKHOUSE_HOST"))).await;
        assert_eq!(store.as_ref().map(EventStore::kind), Some("in-memory"));

        let test = test_app(store);
        let (status, _) = send(
            &test.app,
            track(r#"{"event_type": "page_view", "page_url": "/"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_track_without_backend() {
        let test = test_app(None);

        let (status, body) = send(
            &test.app,
            track(r#"{"event_type": "page_view", "page_url": "/"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"error": "ClickHouse client not available"}));

        // Availability is checked before validation
        let (status, body) = send(&test.app, track("{}")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "ClickHouse client not available");

        assert_eq!(track_count(&test.registry), "track_requests_total 2");
    }

    #[tokio::test]
    async fn test_unreachable_clickhouse_disables_track() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("Service Unavailable"))
            .mount(&server)
            .await;

        let store = connect_event_store(clickhouse_settings(server.uri())).await;
        assert!(store.is_none());

        let test = test_app(store);
        let (status, body) = send(
            &test.app,
            track(r#"{"event_type": "page_view", "page_url": "/"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], BACKEND_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_insert_error_is_echoed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string(
                "Code: 252. DB::Exception: Too many parts (300). (TOO_MANY_PARTS)\n",
            ))
            .mount(&server)
            .await;

        let client = ClickHouseClient::new(clickhouse_settings(server.uri())).unwrap();
        let test = test_app(Some(EventStore::ClickHouse(client)));

        let (status, body) = send(
            &test.app,
            track(r#"{"event_type": "page_view", "page_url": "/"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body,
            json!({"error": "Code: 252. DB::Exception: Too many parts (300). (TOO_MANY_PARTS)"})
        );
    }

    #[tokio::test]
    async fn test_metrics_available_without_backend() {
        let test = test_app(None);

        let response = test
            .app
            .clone()
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/plain; version=0.0.4"
        );
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert!(String::from_utf8_lossy(&body).contains("track_requests_total 0"));
    }

    #[tokio::test]
    async fn test_health_reports_backend_state() {
        let (_, store) = in_memory();
        let test = test_app(store);
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let (status, body) = send(&test.app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["backend"], "connected");

        let test = test_app(None);
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let (_, body) = send(&test.app, request).await;
        assert_eq!(body["backend"], "unavailable");
        // Health checks do not count as /track requests
        assert_eq!(track_count(&test.registry), "track_requests_total 0");
    }

    #[tokio::test]
    async fn test_track_allows_cross_origin_browsers() {
        let (_, store) = in_memory();
        let test = test_app(store);

        let request = Request::builder()
            .method("POST")
            .uri("/track")
            .header(header::ORIGIN, "http://shop.lugx.example")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"event_type": "page_view", "page_url": "/"}"#))
            .unwrap();
        let response = test.app.clone().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    }

    #[tokio::test]
    async fn test_openapi_document() {
        let test = test_app(None);
        let request = Request::builder()
            .uri("/api-doc/openapi.json")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&test.app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["paths"]["/track"]["post"].is_object());
    }
}
