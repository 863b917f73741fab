//! Boot-time book reconstruction
//!
//! The in-memory book is never persisted. At boot the store's replay log —
//! order placements and cancellation events merged in `created_at` order —
//! is run back through the normal match-and-rest path with persistence
//! disabled. Matching is deterministic and was serialized when the history
//! was written, so the rebuilt ladders and index equal the pre-restart
//! state, including partially filled remainders.

use crate::book::Book;
use crate::error::EngineError;
use order_store::{OrderStore, ReplayRecord};
use parking_lot::RwLock;

/// Replay the store's log into the book. Returns the number of placements
/// replayed.
pub async fn rebuild(book: &RwLock<Book>, store: &dyn OrderStore) -> Result<usize, EngineError> {
    let log = store.replay_log().await?;

    let mut book = book.write();
    let mut placed = 0usize;
    for record in log {
        match record {
            ReplayRecord::Placed(mut order) => {
                book.match_incoming(&mut order)?;
                placed += 1;
            }
            ReplayRecord::Cancelled { order_id, .. } => match book.cancel(order_id) {
                Ok(_) => {}
                // A cancellation with no resting target can only come from
                // history written before events and book state were kept in
                // step; skip it rather than abort the boot.
                Err(EngineError::OrderNotFound { .. }) => {
                    tracing::warn!(order_id = %order_id, "replayed cancellation had no resting order");
                }
                Err(err) => return Err(err),
            },
        }
    }
    Ok(placed)
}
