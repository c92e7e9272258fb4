// Storage errors
//
// Display strings are what callers of the HTTP services eventually see,
// so each variant renders the underlying message without decoration.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, StorageError>;

#[derive(Debug, Error)]
pub enum StorageError {
    /// Transport failure talking to the backend
    #[error("{0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status
    #[error("{message}")]
    Rejected { status: u16, message: String },

    /// A row could not be encoded or a response could not be decoded
    #[error("{0}")]
    Serialization(#[from] serde_json::Error),

    /// Client settings are unusable (bad URL, empty key, ...)
    #[error("invalid backend configuration: {0}")]
    InvalidConfig(String),
}

impl StorageError {
    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        StorageError::Rejected {
            status,
            message: message.into(),
        }
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        StorageError::InvalidConfig(msg.into())
    }
}
