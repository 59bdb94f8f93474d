use thiserror::Error;

#[derive(Error, Debug)]
pub enum InventoryError {
    /// Invalid or empty selection, detected before any network call.
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// Malformed input to the snapshot differencer.
    #[error("Invalid diff input: {0}")]
    DiffInput(String),

    #[error("Invalid snapshot date '{0}' (expected YYYYMMDD)")]
    InvalidDate(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, InventoryError>;
