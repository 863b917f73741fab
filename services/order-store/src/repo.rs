//! The repository contract
//!
//! Backends may run operations concurrently; serializing book mutation is
//! the engine's job. `create_order` is the only multi-row transaction.

use crate::error::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use types::{AccountId, EventKind, HistoryEvent, NewOrder, Order, OrderId};

/// Durable order repository.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Insert the order row (assigning a fresh monotonic id and the server
    /// timestamp) together with its ORDER_CREATED event, atomically.
    async fn create_order(&self, new: &NewOrder) -> Result<Order, StoreError>;

    /// Read a single order row by id.
    async fn order_by_id(&self, id: OrderId) -> Result<Order, StoreError>;

    /// Append one history event. Append-only; never rolls back a match.
    async fn append_event(
        &self,
        kind: EventKind,
        order_id: OrderId,
        metadata: Value,
    ) -> Result<HistoryEvent, StoreError>;

    /// Paginated listing of an account's orders, newest first. `page` is
    /// zero-based.
    async fn orders_for_account(
        &self,
        account_id: AccountId,
        page: u32,
        size: u32,
    ) -> Result<Vec<Order>, StoreError>;

    /// The boot-time reconstruction feed: every order placement and every
    /// ORDER_CANCELLED event, merged in `created_at` order. Placements sort
    /// before cancellations at equal timestamps.
    async fn replay_log(&self) -> Result<Vec<ReplayRecord>, StoreError>;
}

/// One entry of the reconstruction feed.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplayRecord {
    /// An order row as created (original amount, store timestamp).
    Placed(Order),
    /// An ORDER_CANCELLED event.
    Cancelled { order_id: OrderId, at: DateTime<Utc> },
}

impl ReplayRecord {
    fn sort_key(&self) -> (DateTime<Utc>, u8, i64) {
        match self {
            ReplayRecord::Placed(order) => (order.created_at, 0, order.id.as_i64()),
            ReplayRecord::Cancelled { order_id, at } => (*at, 1, order_id.as_i64()),
        }
    }
}

/// Merge placements and cancellations into one chronologically ordered feed.
pub(crate) fn merge_replay(
    placements: Vec<Order>,
    cancellations: Vec<(OrderId, DateTime<Utc>)>,
) -> Vec<ReplayRecord> {
    let mut log: Vec<ReplayRecord> = placements
        .into_iter()
        .map(ReplayRecord::Placed)
        .chain(
            cancellations
                .into_iter()
                .map(|(order_id, at)| ReplayRecord::Cancelled { order_id, at }),
        )
        .collect();
    log.sort_by_key(ReplayRecord::sort_key);
    log
}
