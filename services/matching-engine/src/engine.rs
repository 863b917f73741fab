//! The match loop and its handles
//!
//! Producers push submissions onto an unbounded FIFO; a single consumer
//! dequeues them one at a time, so every order of a pair is matched in
//! arrival order. Cancellations and snapshot reads run on caller threads and
//! contend with the consumer through the book's readers-writer lock.
//!
//! Persistence ordering: the store create runs before any book mutation, so
//! a storage failure simply rejects the submission. The TARGET_HIT appends
//! run after the writer lock is released; a failure there is logged and
//! swallowed because rolling back the match would leave phantom resting
//! volume.

use crate::book::{Book, Fill};
use crate::error::EngineError;
use crate::snapshot::{self, BookView};
use order_store::OrderStore;
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use types::events::{empty_metadata, target_hit_metadata};
use types::{EventKind, NewOrder, Order, OrderId};

/// Outcome of one consumer step.
#[derive(Debug)]
pub struct MatchSummary {
    /// The committed incoming order; `amount` is its unmatched remainder.
    pub order: Order,
    /// Fills recorded against resting counterparties, in match order.
    pub fills: Vec<Fill>,
}

/// The single consumer that owns the match loop.
pub struct Engine {
    book: Arc<RwLock<Book>>,
    store: Arc<dyn OrderStore>,
    rx: mpsc::UnboundedReceiver<NewOrder>,
}

/// Cloneable handle used by transports: submit, cancel, read the book.
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::UnboundedSender<NewOrder>,
    book: Arc<RwLock<Book>>,
    store: Arc<dyn OrderStore>,
}

impl Engine {
    /// Rebuild the book from the store, then start the consumer task.
    pub async fn start(
        store: Arc<dyn OrderStore>,
    ) -> Result<(EngineHandle, JoinHandle<()>), EngineError> {
        let book = Arc::new(RwLock::new(Book::new()));
        let restored = crate::recovery::rebuild(&book, store.as_ref()).await?;
        if restored > 0 {
            tracing::info!(orders = restored, "book rebuilt from order store");
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let engine = Engine {
            book: Arc::clone(&book),
            store: Arc::clone(&store),
            rx,
        };
        let handle = EngineHandle { tx, book, store };
        let join = tokio::spawn(engine.run());
        Ok((handle, join))
    }

    async fn run(mut self) {
        tracing::info!("order book initialized");
        while let Some(new) = self.rx.recv().await {
            if let Err(err) = process_submission(&self.book, self.store.as_ref(), new).await {
                tracing::error!(error = %err, "order processing failed");
            }
        }
        tracing::info!("submission channel closed, match loop stopping");
    }
}

/// One consumer step: commit the incoming order, match it under the writer
/// lock, rest any residual, then append the match events.
///
/// This is exactly what the engine task runs per dequeued submission; it is
/// public so embedders and tests can drive the loop deterministically.
pub async fn process_submission(
    book: &RwLock<Book>,
    store: &dyn OrderStore,
    new: NewOrder,
) -> Result<MatchSummary, EngineError> {
    // Create first: on storage failure nothing has touched the book yet.
    let mut order = store.create_order(&new).await?;

    let fills = book.write().match_incoming(&mut order)?;

    if fills.is_empty() {
        tracing::debug!(
            order_id = %order.id,
            pair_id = %order.pair_id,
            price = %order.price,
            "no crossing orders found"
        );
    } else if order.amount.is_zero() {
        tracing::info!(
            order_id = %order.id,
            pair_id = %order.pair_id,
            matched_count = fills.len(),
            "order fully matched"
        );
    } else {
        tracing::info!(
            order_id = %order.id,
            pair_id = %order.pair_id,
            matched_count = fills.len(),
            remaining = %order.amount,
            "order partially matched"
        );
    }

    for fill in &fills {
        if let Err(err) = store
            .append_event(
                EventKind::TargetHit,
                fill.maker_order_id,
                target_hit_metadata(order.id),
            )
            .await
        {
            // The match already happened; reverting would fabricate volume.
            tracing::error!(
                order_id = %fill.maker_order_id,
                matching_order_id = %order.id,
                error = %err,
                "failed to append match event"
            );
        }
    }

    Ok(MatchSummary { order, fills })
}

impl EngineHandle {
    /// Enqueue a submission for the match loop. Returns immediately; the
    /// order is matched when the consumer dequeues it.
    pub fn submit(&self, new: NewOrder) -> Result<(), EngineError> {
        tracing::info!(
            pair_id = %new.pair_id,
            side = %new.side,
            price = %new.price,
            amount = %new.amount,
            "order received"
        );
        self.tx.send(new).map_err(|_| EngineError::Unavailable)
    }

    /// Cancel a resting order: remove it from the book and append the
    /// cancellation event. Only resting orders can be cancelled; in-flight
    /// submissions and terminal orders yield `OrderNotFound`.
    pub async fn cancel(&self, id: OrderId) -> Result<Order, EngineError> {
        tracing::info!(order_id = %id, "cancellation requested");
        let cancelled = self.book.write().cancel(id)?;

        if let Err(err) = self
            .store
            .append_event(EventKind::OrderCancelled, id, empty_metadata())
            .await
        {
            tracing::error!(order_id = %id, error = %err, "failed to append cancellation event");
        }
        Ok(cancelled)
    }

    /// Best-levels view of one pair under the shared read lock. `size`
    /// counts levels per side; `offset` skips levels from the top of book.
    pub fn book_view(&self, pair_id: &str, size: usize, offset: usize) -> BookView {
        snapshot::view(&self.book.read(), pair_id, size, offset)
    }
}
