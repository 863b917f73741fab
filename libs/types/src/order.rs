//! Order records and sides
//!
//! An [`Order`] is the in-memory form of one row of the orders table; its
//! `amount` is the remaining amount and is decremented in place while the
//! order rests in the book. A [`NewOrder`] is a submission that has not been
//! committed yet: the store assigns `id` and `created_at` on create.

use crate::errors::InvalidRequest;
use crate::ids::{AccountId, OrderId, PairId};
use crate::numeric::{Amount, Price};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Order side. The wire and storage code is 0 for ASK, 1 for BID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// Sell offer. Best ask is the lowest price.
    Ask,
    /// Buy offer. Best bid is the highest price.
    Bid,
}

impl Side {
    /// The side an incoming order matches against.
    pub fn opposite(&self) -> Self {
        match self {
            Side::Ask => Side::Bid,
            Side::Bid => Side::Ask,
        }
    }

    /// Integer code used by the wire format and the order_type column.
    pub fn code(&self) -> i32 {
        match self {
            Side::Ask => 0,
            Side::Bid => 1,
        }
    }

    pub fn from_code(code: i64) -> Result<Self, InvalidRequest> {
        match code {
            0 => Ok(Side::Ask),
            1 => Ok(Side::Bid),
            other => Err(InvalidRequest::Side(other)),
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Ask => write!(f, "ASK"),
            Side::Bid => write!(f, "BID"),
        }
    }
}

impl Serialize for Side {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_i32(self.code())
    }
}

impl<'de> Deserialize<'de> for Side {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let code = i64::deserialize(deserializer)?;
        Side::from_code(code).map_err(serde::de::Error::custom)
    }
}

/// A committed order. While resting in the book, `amount` is the remaining
/// amount; the durable row keeps the original amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub pair_id: PairId,
    pub price: Price,
    pub amount: Amount,
    pub account_id: AccountId,
    pub created_at: DateTime<Utc>,
    #[serde(rename = "type")]
    pub side: Side,
}

/// An order submission, before the store has assigned an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOrder {
    pub pair_id: PairId,
    pub price: Price,
    pub amount: Amount,
    pub account_id: AccountId,
    #[serde(rename = "type")]
    pub side: Side,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_order() -> Order {
        Order {
            id: OrderId::new(7),
            pair_id: PairId::new("BTC-USDT"),
            price: Price::from_str("100.5").unwrap(),
            amount: Amount::from_str("2.25").unwrap(),
            account_id: AccountId::new(3),
            created_at: Utc.with_ymd_and_hms(2024, 2, 17, 12, 30, 0).unwrap(),
            side: Side::Bid,
        }
    }

    #[test]
    fn test_side_opposite() {
        assert_eq!(Side::Ask.opposite(), Side::Bid);
        assert_eq!(Side::Bid.opposite(), Side::Ask);
    }

    #[test]
    fn test_side_codes() {
        assert_eq!(Side::Ask.code(), 0);
        assert_eq!(Side::Bid.code(), 1);
        assert_eq!(Side::from_code(0).unwrap(), Side::Ask);
        assert_eq!(Side::from_code(1).unwrap(), Side::Bid);
        assert!(Side::from_code(2).is_err());
    }

    #[test]
    fn test_order_wire_format() {
        let order = sample_order();
        let json = serde_json::to_value(&order).unwrap();

        assert_eq!(json["id"], 7);
        assert_eq!(json["pair_id"], "BTC-USDT");
        assert_eq!(json["price"], 100.5);
        assert_eq!(json["amount"], 2.25);
        assert_eq!(json["account_id"], 3);
        assert_eq!(json["type"], 1);
        // created_at is ISO-8601
        assert!(json["created_at"].as_str().unwrap().starts_with("2024-02-17T12:30:00"));
    }

    #[test]
    fn test_new_order_deserialization() {
        let json = r#"{"pair_id":"BTC-USDT","price":100.5,"amount":2.0,"account_id":1,"type":0}"#;
        let new: NewOrder = serde_json::from_str(json).unwrap();
        assert_eq!(new.side, Side::Ask);
        assert_eq!(new.price, Price::from_str("100.5").unwrap());
    }

    #[test]
    fn test_new_order_rejects_bad_side() {
        let json = r#"{"pair_id":"BTC-USDT","price":100.5,"amount":2.0,"account_id":1,"type":5}"#;
        assert!(serde_json::from_str::<NewOrder>(json).is_err());
    }

    #[test]
    fn test_new_order_rejects_non_positive_amount() {
        let json = r#"{"pair_id":"BTC-USDT","price":100.5,"amount":0,"account_id":1,"type":0}"#;
        assert!(serde_json::from_str::<NewOrder>(json).is_err());
    }
}
