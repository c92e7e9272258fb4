// API error type
// Decision: One error enum for every LUGX route, rendered as {"error": "..."}
// Decision: Backend errors are passed through verbatim, there is no redaction layer

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use lugx_storage::StorageError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Standard error body for API endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message describing what went wrong.
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Errors returned by route handlers
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request is unusable as sent; the message is returned as-is
    #[error("{0}")]
    BadRequest(String),

    /// The body is not a JSON object. Answered as a server error.
    #[error("{0}")]
    InvalidBody(String),

    /// Required keys are absent from the request object. Answered as a server error.
    #[error("Missing fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    /// The backend handle was never established; the message is returned as-is
    #[error("{0}")]
    BackendUnavailable(String),

    /// The backend call failed
    #[error(transparent)]
    Backend(#[from] StorageError),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        ApiError::BadRequest(msg.into())
    }

    pub fn backend_unavailable(msg: impl Into<String>) -> Self {
        ApiError::BackendUnavailable(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::InvalidBody(_)
            | ApiError::MissingFields(_)
            | ApiError::BackendUnavailable(_)
            | ApiError::Backend(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), "Request failed: {}", message);
        } else {
            tracing::debug!(status = status.as_u16(), "Request rejected: {}", message);
        }
        (status, Json(ErrorResponse::new(message))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn render(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_bad_request_renders_message_verbatim() {
        let (status, body) = render(ApiError::bad_request("Missing fields")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, serde_json::json!({"error": "Missing fields"}));
    }

    #[tokio::test]
    async fn test_missing_fields_lists_keys() {
        let (status, body) = render(ApiError::MissingFields(vec!["name", "price"])).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Missing fields: name, price");
    }

    #[tokio::test]
    async fn test_invalid_body_is_server_error() {
        let (status, body) =
            render(ApiError::InvalidBody("Request body must be a JSON object".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, serde_json::json!({"error": "Request body must be a JSON object"}));
    }

    #[tokio::test]
    async fn test_backend_unavailable_is_server_error() {
        let (status, body) =
            render(ApiError::backend_unavailable("ClickHouse client not available")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "ClickHouse client not available");
    }

    #[tokio::test]
    async fn test_backend_error_passes_through() {
        let storage = StorageError::Rejected {
            status: 404,
            message: "relation \"public.games\" does not exist".to_string(),
        };
        let (status, body) = render(ApiError::from(storage)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "relation \"public.games\" does not exist");
    }
}
