//! Request-rejection taxonomy
//!
//! Malformed submissions are rejected at the transport boundary and never
//! reach the engine. Store and engine failures have their own error types
//! next to the code that produces them.

use thiserror::Error;

/// A submission that failed boundary validation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvalidRequest {
    #[error("invalid price: {0}")]
    Price(String),

    #[error("invalid amount: {0}")]
    Amount(String),

    #[error("invalid pair: {0}")]
    Pair(String),

    #[error("unknown side code: {0}")]
    Side(i64),

    #[error("malformed request: {0}")]
    Malformed(String),
}
