// LUGX shared service plumbing
//
// Every LUGX service has the same request shape:
// count the request, validate a few fields, call one backend, answer in JSON.
// This crate holds the parts of that shape that do not depend on the backend:
// - config: environment loading (dotenvy) and typed settings
// - error: ApiError and its JSON rendering
// - payload: JSON body parsing and required-field checks
// - metrics: per-service Prometheus registry and the /metrics route
// - server: health route, CORS, tracing layer and the listener loop
// - telemetry: tracing-subscriber initialization

pub mod config;
pub mod error;
pub mod metrics;
pub mod payload;
pub mod server;
pub mod telemetry;

pub use config::{
    dev_mode, load_dotenv, ClickHouseConfig, ConfigError, CorsConfig, ServerConfig, SupabaseConfig,
};
pub use error::{ApiError, ErrorResponse};
pub use metrics::{metrics_routes, MetricsRegistry};
pub use payload::{
    non_empty_str, parse_object, take_required, JsonObject, MessageResponse, RecordCreated,
};
pub use server::{cors_layer, health_routes, serve, HealthInfo};
pub use telemetry::init_tracing;
