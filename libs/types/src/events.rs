//! Order history events
//!
//! Append-only rows describing an order's lifecycle. A match appends one
//! TARGET_HIT per resting counterparty, with the incoming order's id in the
//! metadata bag.

use crate::ids::{EventId, OrderId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// The event names the engine emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    #[serde(rename = "ORDER_CREATED")]
    OrderCreated,
    #[serde(rename = "ORDER_CANCELLED")]
    OrderCancelled,
    #[serde(rename = "TARGET_HIT")]
    TargetHit,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::OrderCreated => "ORDER_CREATED",
            EventKind::OrderCancelled => "ORDER_CANCELLED",
            EventKind::TargetHit => "TARGET_HIT",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "ORDER_CREATED" => Some(EventKind::OrderCreated),
            "ORDER_CANCELLED" => Some(EventKind::OrderCancelled),
            "TARGET_HIT" => Some(EventKind::TargetHit),
            _ => None,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One row of the order_history_events table. Never mutated after append.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEvent {
    pub id: EventId,
    pub event: EventKind,
    pub order_id: OrderId,
    pub metadata: Value,
    pub created_at: DateTime<Utc>,
}

/// Metadata bag for a TARGET_HIT event.
pub fn target_hit_metadata(matching_order_id: OrderId) -> Value {
    serde_json::json!({ "matching_order_id": matching_order_id })
}

/// The default, empty metadata bag.
pub fn empty_metadata() -> Value {
    Value::Object(serde_json::Map::new())
}
