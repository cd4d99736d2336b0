use sea_orm::DbErr;
use thiserror::Error;

/// Errors that can occur while reading or writing records.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from sea-orm.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    /// A JSON column could not be converted to or from its record field.
    #[error("Serialization error in {column}: {message}")]
    Serialization { column: &'static str, message: String },

    /// Invalid input data.
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },
}

impl StoreError {
    pub(crate) fn serialization(column: &'static str, err: serde_json::Error) -> Self {
        Self::Serialization {
            column,
            message: err.to_string(),
        }
    }
}

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
