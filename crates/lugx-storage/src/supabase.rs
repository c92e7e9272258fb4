// Supabase PostgREST client
//
// Only the two calls the services need:
// - insert one row and return the stored representation
// - select every row of a table

use reqwest::{Client, RequestBuilder, Response, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, StorageError};

/// Project URL and API key
#[derive(Clone)]
pub struct SupabaseSettings {
    pub url: String,
    pub key: String,
}

impl std::fmt::Debug for SupabaseSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseSettings")
            .field("url", &self.url)
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// PostgREST error body
#[derive(Debug, Deserialize)]
struct PostgrestError {
    message: Option<String>,
}

#[derive(Clone)]
pub struct SupabaseClient {
    http: Client,
    rest_url: Url,
    key: String,
}

impl SupabaseClient {
    /// Validate settings and build a client. No request is made.
    pub fn new(settings: SupabaseSettings) -> Result<Self> {
        let base = settings.url.trim().trim_end_matches('/');
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(StorageError::invalid_config(format!(
                "Supabase URL must start with http:// or https://, got {:?}",
                settings.url
            )));
        }
        if settings.key.trim().is_empty() {
            return Err(StorageError::invalid_config("Supabase key is empty"));
        }

        let rest_url = Url::parse(&format!("{}/rest/v1/", base))
            .map_err(|e| StorageError::invalid_config(format!("Supabase URL: {}", e)))?;

        Ok(Self {
            http: Client::new(),
            rest_url,
            key: settings.key,
        })
    }

    pub fn rest_url(&self) -> &Url {
        &self.rest_url
    }

    /// Insert `row` into `table` and return the stored rows
    pub async fn insert<T: Serialize + ?Sized>(&self, table: &str, row: &T) -> Result<Vec<Value>> {
        let response = self
            .request(reqwest::Method::POST, table)?
            .header("Prefer", "return=representation")
            .json(row)
            .send()
            .await?;
        let rows = read_rows(response).await?;
        tracing::debug!(table, rows = rows.len(), "Inserted into Supabase");
        Ok(rows)
    }

    /// Every row of `table`, unfiltered and unpaginated
    pub async fn select_all(&self, table: &str) -> Result<Vec<Value>> {
        let response = self
            .request(reqwest::Method::GET, table)?
            .query(&[("select", "*")])
            .send()
            .await?;
        read_rows(response).await
    }

    fn request(&self, method: reqwest::Method, table: &str) -> Result<RequestBuilder> {
        let url = self
            .rest_url
            .join(table)
            .map_err(|e| StorageError::invalid_config(format!("table {:?}: {}", table, e)))?;
        Ok(self
            .http
            .request(method, url)
            .header("apikey", &self.key)
            .bearer_auth(&self.key))
    }
}

impl std::fmt::Debug for SupabaseClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseClient")
            .field("rest_url", &self.rest_url.as_str())
            .field("key", &"[REDACTED]")
            .finish()
    }
}

async fn read_rows(response: Response) -> Result<Vec<Value>> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        let message = serde_json::from_str::<PostgrestError>(&body)
            .ok()
            .and_then(|e| e.message)
            .unwrap_or_else(|| body.trim().to_string());
        return Err(StorageError::rejected(status.as_u16(), message));
    }
    Ok(serde_json::from_str(&body)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(url: &str) -> SupabaseClient {
        SupabaseClient::new(SupabaseSettings {
            url: url.to_string(),
            key: "anon-key".to_string(),
        })
        .unwrap()
    }

    #[test]
    fn test_rest_url() {
        let client = client("https://project.supabase.co/");
        assert_eq!(client.rest_url().as_str(), "https://project.supabase.co/rest/v1/");
    }

    #[test]
    fn test_rejects_bad_settings() {
        let bad_url = SupabaseClient::new(SupabaseSettings {
            url: "project.supabase.co".to_string(),
            key: "anon-key".to_string(),
        });
        assert!(matches!(bad_url, Err(StorageError::InvalidConfig(_))));

        let empty_key = SupabaseClient::new(SupabaseSettings {
            url: "https://project.supabase.co".to_string(),
            key: " ".to_string(),
        });
        assert!(matches!(empty_key, Err(StorageError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn test_insert_returns_representation() {
        let server = MockServer::start().await;
        let row = json!({"name": "X", "category": "Y", "release_date": "2024-01-01", "price": 9.99});
        let mut stored = row.clone();
        stored["id"] = json!(7);

        Mock::given(method("POST"))
            .and(path("/rest/v1/games"))
            .and(header("apikey", "anon-key"))
            .and(header("Authorization", "Bearer anon-key"))
            .and(header("Prefer", "return=representation"))
            .and(body_json(&row))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!([stored.clone()])))
            .expect(1)
            .mount(&server)
            .await;

        let rows = client(&server.uri()).insert("games", &row).await.unwrap();
        assert_eq!(rows, vec![stored]);
    }

    #[tokio::test]
    async fn test_select_all() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/orders"))
            .and(query_param("select", "*"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let rows = client(&server.uri()).select_all("orders").await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_postgrest_error_message_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "code": "PGRST204",
                "details": null,
                "hint": null,
                "message": "Could not find the 'nme' column of 'games' in the schema cache"
            })))
            .mount(&server)
            .await;

        let err = client(&server.uri())
            .insert("games", &json!({"nme": "X"}))
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Could not find the 'nme' column of 'games' in the schema cache"
        );
    }

    #[tokio::test]
    async fn test_non_json_error_body_is_kept() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("upstream connect error\n"))
            .mount(&server)
            .await;

        let err = client(&server.uri()).select_all("games").await.unwrap_err();
        match err {
            StorageError::Rejected { status, message } => {
                assert_eq!(status, 503);
                assert_eq!(message, "upstream connect error");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
