//! Spreadsheet error types

use skytally_core::InventoryError;
use thiserror::Error;

/// Failure of one publish or highlight operation.
///
/// Reported per table: the in-memory tables stay valid and publishing can be
/// retried without collecting again.
#[derive(Error, Debug)]
pub enum PublishError {
    #[error("Spreadsheet quota exhausted: {0}")]
    QuotaExhausted(String),

    #[error("Permission denied on spreadsheet {spreadsheet_id}: {message}")]
    PermissionDenied {
        spreadsheet_id: String,
        message: String,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Sheets API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid backend configuration: {0}")]
    InvalidConfig(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Inventory(#[from] InventoryError),
}

impl PublishError {
    /// Quota and transport failures usually clear up on their own.
    pub fn is_retryable(&self) -> bool {
        matches!(self, PublishError::QuotaExhausted(_) | PublishError::Http(_))
    }
}

pub type Result<T> = std::result::Result<T, PublishError>;
