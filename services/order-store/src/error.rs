//! Store error taxonomy

use thiserror::Error;
use types::OrderId;

/// Failures surfaced by an [`crate::OrderStore`] backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("order not found: {0}")]
    NotFound(OrderId),

    #[error("database error: {0}")]
    Database(String),

    #[error("row decode error: {0}")]
    Decode(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
                StoreError::Decode(err.to_string())
            }
            other => StoreError::Database(other.to_string()),
        }
    }
}
