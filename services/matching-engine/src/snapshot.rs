//! Book-view snapshots
//!
//! Read-only, value-copied views of the best price levels, consumed by the
//! streaming transport. Asks walk from the lowest price upward, bids from
//! the highest downward; `size` and `offset` count levels, and each selected
//! level contributes its whole FIFO in time order. The view is a copy:
//! callers may observe a stale book once the walk returns.

use crate::book::Book;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use types::{Order, Side};

/// Best-priced orders of one pair, per side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookView {
    pub asks: Vec<Order>,
    pub bids: Vec<Order>,
}

/// One streamed frame: a view plus the tick timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotFrame {
    pub asks: Vec<Order>,
    pub bids: Vec<Order>,
    pub time: DateTime<Utc>,
}

impl SnapshotFrame {
    pub fn new(view: BookView, time: DateTime<Utc>) -> Self {
        Self {
            asks: view.asks,
            bids: view.bids,
            time,
        }
    }
}

/// Build a view from the book. The caller holds the read lock.
pub fn view(book: &Book, pair_id: &str, size: usize, offset: usize) -> BookView {
    let asks = book.side_view(pair_id, Side::Ask, offset, size);
    let bids = book.side_view(pair_id, Side::Bid, offset, size);
    tracing::debug!(
        pair_id,
        ask_count = asks.len(),
        bid_count = bids.len(),
        "book view built"
    );
    BookView { asks, bids }
}
