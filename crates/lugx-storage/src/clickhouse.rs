// ClickHouse HTTP interface client
//
// Statements go to the server root: DDL and queries as the POST body,
// inserts as `?query=INSERT ... FORMAT JSONEachRow` with one JSON object per line.
// See: https://clickhouse.com/docs/en/interfaces/http

use reqwest::{Client, RequestBuilder, Response, Url};
use serde::Serialize;

use crate::error::{Result, StorageError};

/// DDL for the analytics table, run at startup
pub const CREATE_ANALYTICS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS web_analytics (
    id UUID DEFAULT generateUUIDv4(),
    event_type String,
    page_url String,
    user_agent String,
    timestamp DateTime DEFAULT now()
) ENGINE = MergeTree()
ORDER BY (timestamp)
"#;

const SECURE_PORT: u16 = 8443;
const PLAIN_PORT: u16 = 8123;

/// Connection settings
#[derive(Clone)]
pub struct ClickHouseSettings {
    /// Bare hostname, or a full `http(s)://host:port` URL
    pub host: String,
    pub port: Option<u16>,
    pub secure: bool,
    pub username: String,
    pub password: String,
    pub database: Option<String>,
}

impl std::fmt::Debug for ClickHouseSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClickHouseSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("secure", &self.secure)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("database", &self.database)
            .finish()
    }
}

impl ClickHouseSettings {
    /// Resolve the HTTP endpoint these settings point at
    pub fn endpoint(&self) -> Result<Url> {
        let host = self.host.trim();
        if host.is_empty() {
            return Err(StorageError::invalid_config("ClickHouse host is empty"));
        }

        let raw = if host.starts_with("http://") || host.starts_with("https://") {
            host.to_string()
        } else {
            let (scheme, default_port) = if self.secure {
                ("https", SECURE_PORT)
            } else {
                ("http", PLAIN_PORT)
            };
            let (name, host_port) = split_host_port(host)?;
            let port = self.port.or(host_port).unwrap_or(default_port);
            format!("{}://{}:{}/", scheme, name, port)
        };

        let mut url = Url::parse(&raw).map_err(|e| {
            StorageError::invalid_config(format!(
                "ClickHouse host {:?}: {}; {}",
                raw, e, HOST_HINT
            ))
        })?;
        if let Some(port) = self.port {
            url.set_port(Some(port))
                .map_err(|_| StorageError::invalid_config(format!("cannot set port on {}", raw)))?;
        }
        Ok(url)
    }
}

const HOST_HINT: &str = "set CLICKHOUSE_PORT or use a full http(s):// URL";

/// Split a bare `host:port`. IPv6 addresses need brackets to carry a port.
fn split_host_port(host: &str) -> Result<(&str, Option<u16>)> {
    let split = if host.starts_with('[') {
        host.rsplit_once("]:")
            .map(|(name, port)| (&host[..name.len() + 1], port))
    } else if host.matches(':').count() == 1 {
        host.split_once(':')
    } else {
        None
    };

    match split {
        None => Ok((host, None)),
        Some((name, port)) => match port.parse::<u16>() {
            Ok(port) => Ok((name, Some(port))),
            Err(_) => Err(StorageError::invalid_config(format!(
                "ClickHouse host {:?} has an invalid port; {}",
                host, HOST_HINT
            ))),
        },
    }
}

/// ClickHouse client bound to one server and user
#[derive(Clone)]
pub struct ClickHouseClient {
    http: Client,
    endpoint: Url,
    username: String,
    password: String,
    database: Option<String>,
}

impl ClickHouseClient {
    /// Build a client without touching the network
    pub fn new(settings: ClickHouseSettings) -> Result<Self> {
        let endpoint = settings.endpoint()?;
        Ok(Self {
            http: Client::new(),
            endpoint,
            username: settings.username,
            password: settings.password,
            database: settings.database,
        })
    }

    /// Build a client and verify the server accepts our credentials
    pub async fn connect(settings: ClickHouseSettings) -> Result<Self> {
        let client = Self::new(settings)?;
        let version = client.command("SELECT version()").await?;
        tracing::info!(
            endpoint = %client.endpoint,
            version = %version.trim(),
            "Connected to ClickHouse"
        );
        Ok(client)
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Run a statement and return the raw response body
    pub async fn command(&self, sql: &str) -> Result<String> {
        let response = self
            .request()
            .body(sql.to_string())
            .send()
            .await?;
        read_body(response).await
    }

    /// Insert rows into `table`, one JSON object per row
    pub async fn insert_rows<T: Serialize>(
        &self,
        table: &str,
        columns: &[&str],
        rows: &[T],
    ) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }

        let query = format!(
            "INSERT INTO {} ({}) FORMAT JSONEachRow",
            table,
            columns.join(", ")
        );
        let mut body = String::new();
        for row in rows {
            body.push_str(&serde_json::to_string(row)?);
            body.push('\n');
        }

        let response = self
            .request()
            .query(&[("query", query.as_str())])
            .body(body)
            .send()
            .await?;
        read_body(response).await?;

        tracing::debug!(table, rows = rows.len(), "Inserted rows into ClickHouse");
        Ok(())
    }

    fn request(&self) -> RequestBuilder {
        let mut builder = self
            .http
            .post(self.endpoint.clone())
            .header("X-ClickHouse-User", &self.username)
            .header("X-ClickHouse-Key", &self.password);
        if let Some(database) = &self.database {
            builder = builder.query(&[("database", database.as_str())]);
        }
        builder
    }
}

impl std::fmt::Debug for ClickHouseClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClickHouseClient")
            .field("endpoint", &self.endpoint.as_str())
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Success body, or the server's exception text as a rejection
async fn read_body(response: Response) -> Result<String> {
    let status = response.status();
    let body = response.text().await?;
    if status.is_success() {
        Ok(body)
    } else {
        Err(StorageError::rejected(status.as_u16(), body.trim()))
    }
}
