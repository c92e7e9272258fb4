// Environment configuration
//
// All settings come from environment variables, optionally seeded from a
// `.env` file. Backend credentials are required; everything else has a default.

use axum::http::HeaderValue;
use lugx_storage::{ClickHouseSettings, SupabaseSettings};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use thiserror::Error;

/// Errors raised while reading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required variable is unset or empty
    #[error("{0} environment variable not set")]
    Missing(&'static str),

    /// A variable is set but cannot be parsed
    #[error("invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
}

/// Load `.env` into the process environment if one exists.
///
/// A missing file is normal in container deployments and is not reported.
pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => tracing::debug!(path = %path.display(), "Loaded .env file"),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!("Failed to load .env file: {}", e),
    }
}

/// Whether in-memory backends should replace the hosted ones
pub fn dev_mode() -> bool {
    std::env::var("LUGX_DEV_MODE")
        .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// Non-empty value of `name` from `lookup`
fn lookup_var<F>(lookup: &F, name: &'static str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name).filter(|v| !v.trim().is_empty())
}

fn lookup_required<F>(lookup: &F, name: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup_var(lookup, name).ok_or(ConfigError::Missing(name))
}

fn var(name: &'static str) -> Option<String> {
    lookup_var(&env_var, name)
}

fn parse_bool(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        _ => Err(ConfigError::Invalid {
            var: name,
            value: value.to_string(),
        }),
    }
}

// ============================================
// Listener
// ============================================

/// Listener address for a service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
}

impl ServerConfig {
    /// Read `HOST` (default 0.0.0.0) and `PORT` (default `default_port`)
    pub fn from_env(default_port: u16) -> Result<Self, ConfigError> {
        Self::from_vars(var("HOST"), var("PORT"), default_port)
    }

    fn from_vars(
        host: Option<String>,
        port: Option<String>,
        default_port: u16,
    ) -> Result<Self, ConfigError> {
        let ip = match host {
            Some(h) => h
                .parse::<IpAddr>()
                .map_err(|_| ConfigError::Invalid { var: "HOST", value: h })?,
            None => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        };
        let port = match port {
            Some(p) => p
                .parse::<u16>()
                .map_err(|_| ConfigError::Invalid { var: "PORT", value: p })?,
            None => default_port,
        };
        Ok(Self {
            bind_addr: SocketAddr::new(ip, port),
        })
    }
}

// ============================================
// ClickHouse
// ============================================

/// ClickHouse credentials for the analytics service
#[derive(Clone)]
pub struct ClickHouseConfig {
    pub host: String,
    pub username: String,
    pub password: String,
    pub port: Option<u16>,
    pub secure: bool,
    pub database: Option<String>,
}

impl ClickHouseConfig {
    /// Environment variables:
    /// - `CLICKHOUSE_HOST`, `CLICKHOUSE_USERNAME`, `CLICKHOUSE_PASSWORD` (required)
    /// - `CLICKHOUSE_PORT` (default 8443 secure / 8123 plain)
    /// - `CLICKHOUSE_SECURE` (default true)
    /// - `CLICKHOUSE_DATABASE` (default: server default database)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_var)
    }

    /// Same as `from_env`, reading variables through `lookup`
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup_required(&lookup, "CLICKHOUSE_HOST")?;
        let username = lookup_required(&lookup, "CLICKHOUSE_USERNAME")?;
        let password = lookup_required(&lookup, "CLICKHOUSE_PASSWORD")?;

        let port = lookup_var(&lookup, "CLICKHOUSE_PORT")
            .map(|p| {
                p.trim().parse::<u16>().map_err(|_| ConfigError::Invalid {
                    var: "CLICKHOUSE_PORT",
                    value: p,
                })
            })
            .transpose()?;
        let secure = lookup_var(&lookup, "CLICKHOUSE_SECURE")
            .map(|v| parse_bool("CLICKHOUSE_SECURE", v.trim()))
            .transpose()?
            .unwrap_or(true);

        Ok(Self {
            host,
            username,
            password,
            port,
            secure,
            database: lookup_var(&lookup, "CLICKHOUSE_DATABASE"),
        })
    }

    pub fn settings(&self) -> ClickHouseSettings {
        ClickHouseSettings {
            host: self.host.clone(),
            port: self.port,
            secure: self.secure,
            username: self.username.clone(),
            password: self.password.clone(),
            database: self.database.clone(),
        }
    }
}

impl std::fmt::Debug for ClickHouseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClickHouseConfig")
            .field("host", &self.host)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("port", &self.port)
            .field("secure", &self.secure)
            .field("database", &self.database)
            .finish()
    }
}

// ============================================
// Supabase
// ============================================

/// Supabase project URL and API key for the catalog and order services
#[derive(Clone)]
pub struct SupabaseConfig {
    pub url: String,
    pub key: String,
}

impl SupabaseConfig {
    /// Read `SUPABASE_URL` and `SUPABASE_KEY`, both required
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_var)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            url: lookup_required(&lookup, "SUPABASE_URL")?,
            key: lookup_required(&lookup, "SUPABASE_KEY")?,
        })
    }

    pub fn settings(&self) -> SupabaseSettings {
        SupabaseSettings {
            url: self.url.clone(),
            key: self.key.clone(),
        }
    }
}

impl std::fmt::Debug for SupabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseConfig")
            .field("url", &self.url)
            .field("key", &"[REDACTED]")
            .finish()
    }
}

// ============================================
// CORS
// ============================================

/// Allowed browser origins. Empty means any origin.
#[derive(Debug, Clone, Default)]
pub struct CorsConfig {
    pub allowed_origins: Vec<HeaderValue>,
}

impl CorsConfig {
    /// Read a comma separated `CORS_ALLOWED_ORIGINS`.
    /// Example: CORS_ALLOWED_ORIGINS="https://lugx.example.com,https://admin.lugx.example.com"
    pub fn from_env() -> Self {
        Self::parse(var("CORS_ALLOWED_ORIGINS").as_deref())
    }

    fn parse(raw: Option<&str>) -> Self {
        let allowed_origins = raw
            .map(|s| {
                s.split(',')
                    .filter_map(|s| s.trim().parse().ok())
                    .collect()
            })
            .unwrap_or_default();
        Self { allowed_origins }
    }

    pub fn allows_any(&self) -> bool {
        self.allowed_origins.is_empty()
    }
}
