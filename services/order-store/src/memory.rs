//! In-memory store backend
//!
//! Mutex-guarded tables with monotonic id counters. One lock acquisition is
//! one transaction, which gives `create_order` its atomicity for free. Used
//! by the test suites and by embedded single-process runs.

use crate::error::StoreError;
use crate::repo::{merge_replay, OrderStore, ReplayRecord};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::BTreeMap;
use types::{AccountId, EventId, EventKind, HistoryEvent, NewOrder, Order, OrderId};

pub struct MemoryOrderStore {
    inner: Mutex<Tables>,
}

struct Tables {
    orders: BTreeMap<i64, Order>,
    events: Vec<HistoryEvent>,
    next_order_id: i64,
    next_event_id: i32,
}

impl MemoryOrderStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Tables {
                orders: BTreeMap::new(),
                events: Vec::new(),
                next_order_id: 1,
                next_event_id: 1,
            }),
        }
    }

    /// All appended events, in append order.
    pub fn events(&self) -> Vec<HistoryEvent> {
        self.inner.lock().events.clone()
    }

    /// Events appended against one order, in append order.
    pub fn events_for(&self, order_id: OrderId) -> Vec<HistoryEvent> {
        self.inner
            .lock()
            .events
            .iter()
            .filter(|e| e.order_id == order_id)
            .cloned()
            .collect()
    }

    /// Number of order rows.
    pub fn order_count(&self) -> usize {
        self.inner.lock().orders.len()
    }
}

impl Default for MemoryOrderStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Tables {
    fn push_event(&mut self, kind: EventKind, order_id: OrderId, metadata: Value) -> HistoryEvent {
        let event = HistoryEvent {
            id: EventId::new(self.next_event_id),
            event: kind,
            order_id,
            metadata,
            created_at: Utc::now(),
        };
        self.next_event_id += 1;
        self.events.push(event.clone());
        event
    }
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
    async fn create_order(&self, new: &NewOrder) -> Result<Order, StoreError> {
        let mut tables = self.inner.lock();

        let order = Order {
            id: OrderId::new(tables.next_order_id),
            pair_id: new.pair_id.clone(),
            price: new.price,
            amount: new.amount,
            account_id: new.account_id,
            created_at: Utc::now(),
            side: new.side,
        };
        tables.next_order_id += 1;
        tables.orders.insert(order.id.as_i64(), order.clone());
        tables.push_event(EventKind::OrderCreated, order.id, types::events::empty_metadata());

        Ok(order)
    }

    async fn order_by_id(&self, id: OrderId) -> Result<Order, StoreError> {
        self.inner
            .lock()
            .orders
            .get(&id.as_i64())
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    async fn append_event(
        &self,
        kind: EventKind,
        order_id: OrderId,
        metadata: Value,
    ) -> Result<HistoryEvent, StoreError> {
        Ok(self.inner.lock().push_event(kind, order_id, metadata))
    }

    async fn orders_for_account(
        &self,
        account_id: AccountId,
        page: u32,
        size: u32,
    ) -> Result<Vec<Order>, StoreError> {
        let tables = self.inner.lock();
        Ok(tables
            .orders
            .values()
            .rev()
            .filter(|o| o.account_id == account_id)
            .skip(page as usize * size as usize)
            .take(size as usize)
            .cloned()
            .collect())
    }

    async fn replay_log(&self) -> Result<Vec<ReplayRecord>, StoreError> {
        let tables = self.inner.lock();
        let placements = tables.orders.values().cloned().collect();
        let cancellations = tables
            .events
            .iter()
            .filter(|e| e.event == EventKind::OrderCancelled)
            .map(|e| (e.order_id, e.created_at))
            .collect();
        Ok(merge_replay(placements, cancellations))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::{Amount, PairId, Price, Side};

    fn bid(account: i32) -> NewOrder {
        NewOrder {
            pair_id: PairId::new("BTC-USDT"),
            price: Price::from_u64(100),
            amount: Amount::from_str("5").unwrap(),
            account_id: AccountId::new(account),
            side: Side::Bid,
        }
    }

    #[tokio::test]
    async fn test_create_assigns_monotonic_ids() {
        let store = MemoryOrderStore::new();
        let a = store.create_order(&bid(1)).await.unwrap();
        let b = store.create_order(&bid(1)).await.unwrap();
        assert!(a.id < b.id);
        assert!(a.created_at <= b.created_at);
    }

    #[tokio::test]
    async fn test_create_appends_companion_event() {
        let store = MemoryOrderStore::new();
        let order = store.create_order(&bid(1)).await.unwrap();

        let events = store.events_for(order.id);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event, EventKind::OrderCreated);
        assert!(events[0].metadata.as_object().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_order_by_id_not_found() {
        let store = MemoryOrderStore::new();
        let err = store.order_by_id(OrderId::new(404)).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(id) if id == OrderId::new(404)));
    }

    #[tokio::test]
    async fn test_append_event_metadata() {
        let store = MemoryOrderStore::new();
        let order = store.create_order(&bid(1)).await.unwrap();

        let event = store
            .append_event(
                EventKind::TargetHit,
                order.id,
                types::events::target_hit_metadata(OrderId::new(99)),
            )
            .await
            .unwrap();

        assert_eq!(event.event, EventKind::TargetHit);
        assert_eq!(event.metadata["matching_order_id"], 99);
    }

    #[tokio::test]
    async fn test_orders_for_account_pagination() {
        let store = MemoryOrderStore::new();
        for _ in 0..5 {
            store.create_order(&bid(1)).await.unwrap();
        }
        store.create_order(&bid(2)).await.unwrap();

        let first = store
            .orders_for_account(AccountId::new(1), 0, 2)
            .await
            .unwrap();
        assert_eq!(first.len(), 2);
        // Newest first
        assert!(first[0].id > first[1].id);

        let last = store
            .orders_for_account(AccountId::new(1), 2, 2)
            .await
            .unwrap();
        assert_eq!(last.len(), 1);
    }

    #[tokio::test]
    async fn test_replay_log_contains_cancellations() {
        let store = MemoryOrderStore::new();
        let order = store.create_order(&bid(1)).await.unwrap();
        store.create_order(&bid(2)).await.unwrap();
        store
            .append_event(EventKind::OrderCancelled, order.id, types::events::empty_metadata())
            .await
            .unwrap();

        let log = store.replay_log().await.unwrap();
        assert_eq!(log.len(), 3);
        assert!(matches!(&log[0], ReplayRecord::Placed(o) if o.id == order.id));
        assert!(log
            .iter()
            .any(|r| matches!(r, ReplayRecord::Cancelled { order_id, .. } if *order_id == order.id)));
    }
}
