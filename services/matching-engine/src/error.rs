//! Engine error taxonomy

use order_store::StoreError;
use thiserror::Error;
use types::OrderId;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Cancellation target is unknown or already terminal.
    #[error("order not found: {order_id}")]
    OrderNotFound { order_id: OrderId },

    /// Persistence failure during order creation; the submission is aborted.
    #[error("storage failure: {0}")]
    Storage(#[from] StoreError),

    /// Index and ladder disagree. Fatal for the pair: the pair is
    /// quarantined and every further operation on it fails with this error.
    #[error("book inconsistency on pair {pair_id}: {detail}")]
    Inconsistency { pair_id: String, detail: String },

    /// The match loop is not running.
    #[error("engine is not available")]
    Unavailable,
}
