// Request and response bodies shared by the services
//
// Handlers take the raw body and parse it themselves so the request counter
// is incremented before any parsing can fail.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

use crate::error::ApiError;

/// A decoded JSON object body
pub type JsonObject = Map<String, Value>;

/// Parse a request body that must be a JSON object.
pub fn parse_object(body: &[u8]) -> Result<JsonObject, ApiError> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(ApiError::InvalidBody(
            "Request body must be a JSON object".to_string(),
        )),
        Err(e) => Err(ApiError::InvalidBody(format!("Invalid JSON body: {}", e))),
    }
}

/// Remove the given keys from `object`, failing with every absent key listed.
///
/// Only presence is checked. A key holding `null` counts as present.
pub fn take_required<const N: usize>(
    object: &mut JsonObject,
    fields: [&'static str; N],
) -> Result<[Value; N], ApiError> {
    let missing: Vec<&'static str> = fields
        .iter()
        .copied()
        .filter(|field| !object.contains_key(*field))
        .collect();
    if !missing.is_empty() {
        return Err(ApiError::MissingFields(missing));
    }

    Ok(fields.map(|field| object.remove(field).unwrap_or(Value::Null)))
}

/// Non-empty string value of `key`, if any
pub fn non_empty_str(object: &JsonObject, key: &str) -> Option<String> {
    object
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// `{"message": "..."}`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    #[schema(example = "Event recorded")]
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Acknowledgement for an inserted record, carrying the rows the backend returned.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RecordCreated {
    /// Human readable confirmation.
    pub message: String,
    /// Rows as stored by the backend, including generated columns.
    #[schema(value_type = Vec<Object>)]
    pub response: Vec<Value>,
}

impl RecordCreated {
    pub fn new(message: impl Into<String>, response: Vec<Value>) -> Self {
        Self {
            message: message.into(),
            response,
        }
    }
}
