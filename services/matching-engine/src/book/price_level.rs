//! Price level: the FIFO queue at one price point
//!
//! New arrivals append at the tail; all inserts at a level serialize through
//! the engine, so queue order equals `created_at` order and the fill scan
//! enforces time priority by walking from the front.

use std::collections::VecDeque;
use types::{AccountId, Amount, Order, OrderId, Price};

/// One fill recorded against a resting order during a match.
#[derive(Debug, Clone, PartialEq)]
pub struct Fill {
    pub maker_order_id: OrderId,
    pub maker_account_id: AccountId,
    pub price: Price,
    pub amount: Amount,
    /// True when the resting order was fully consumed and left the book.
    pub exhausted: bool,
}

/// Time-ordered queue of resting orders at a single price.
#[derive(Debug, Clone, Default)]
pub struct PriceLevel {
    orders: VecDeque<Order>,
}

impl PriceLevel {
    pub fn new() -> Self {
        Self {
            orders: VecDeque::new(),
        }
    }

    /// Append at the tail (time priority).
    pub fn push_back(&mut self, order: Order) {
        self.orders.push_back(order);
    }

    /// Remove an order anywhere in the queue by id.
    pub fn remove(&mut self, id: OrderId) -> Option<Order> {
        let position = self.orders.iter().position(|o| o.id == id)?;
        self.orders.remove(position)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Order> {
        self.orders.iter()
    }

    pub fn front(&self) -> Option<&Order> {
        self.orders.front()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    /// Consume resting orders from the front of the queue.
    ///
    /// Resting orders owned by `taker_account` are skipped in place; they
    /// neither match nor block the scan from reaching later arrivals. A
    /// resting order larger than the remainder is decremented and stays; a
    /// smaller or equal one is removed and its id pushed onto `removed`.
    /// Returns the unmatched remainder.
    pub fn fill(
        &mut self,
        taker_account: AccountId,
        mut remaining: Amount,
        fills: &mut Vec<Fill>,
        removed: &mut Vec<OrderId>,
    ) -> Amount {
        let mut idx = 0;
        while idx < self.orders.len() && !remaining.is_zero() {
            if self.orders[idx].account_id == taker_account {
                idx += 1;
                continue;
            }

            if self.orders[idx].amount > remaining {
                let maker = &mut self.orders[idx];
                maker.amount = maker.amount - remaining;
                fills.push(Fill {
                    maker_order_id: maker.id,
                    maker_account_id: maker.account_id,
                    price: maker.price,
                    amount: remaining,
                    exhausted: false,
                });
                remaining = Amount::zero();
            } else if let Some(maker) = self.orders.remove(idx) {
                remaining = remaining - maker.amount;
                removed.push(maker.id);
                fills.push(Fill {
                    maker_order_id: maker.id,
                    maker_account_id: maker.account_id,
                    price: maker.price,
                    amount: maker.amount,
                    exhausted: true,
                });
                // removal shifts the queue; idx already points at the next entry
            }
        }
        remaining
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use types::{PairId, Price, Side};

    fn order(id: i64, account: i32, amount: &str) -> Order {
        Order {
            id: OrderId::new(id),
            pair_id: PairId::new("X"),
            price: Price::from_u64(100),
            amount: Amount::from_str(amount).unwrap(),
            account_id: AccountId::new(account),
            created_at: Utc::now(),
            side: Side::Bid,
        }
    }

    #[test]
    fn test_fifo_order() {
        let mut level = PriceLevel::new();
        level.push_back(order(1, 1, "1"));
        level.push_back(order(2, 1, "2"));

        assert_eq!(level.front().unwrap().id, OrderId::new(1));
        assert_eq!(level.len(), 2);
    }

    #[test]
    fn test_remove_mid_queue() {
        let mut level = PriceLevel::new();
        level.push_back(order(1, 1, "1"));
        level.push_back(order(2, 2, "2"));
        level.push_back(order(3, 3, "3"));

        let removed = level.remove(OrderId::new(2)).unwrap();
        assert_eq!(removed.id, OrderId::new(2));
        assert_eq!(level.len(), 2);
        assert!(level.remove(OrderId::new(2)).is_none());
    }

    #[test]
    fn test_fill_partial_decrements_front() {
        let mut level = PriceLevel::new();
        level.push_back(order(1, 1, "5"));

        let mut fills = Vec::new();
        let mut removed = Vec::new();
        let remaining = level.fill(
            AccountId::new(2),
            Amount::from_str("3").unwrap(),
            &mut fills,
            &mut removed,
        );

        assert!(remaining.is_zero());
        assert_eq!(fills.len(), 1);
        assert!(!fills[0].exhausted);
        assert_eq!(fills[0].amount, Amount::from_str("3").unwrap());
        assert_eq!(level.front().unwrap().amount, Amount::from_str("2").unwrap());
        assert!(removed.is_empty());
    }

    #[test]
    fn test_fill_consumes_queue_in_order() {
        let mut level = PriceLevel::new();
        level.push_back(order(1, 1, "2"));
        level.push_back(order(2, 2, "3"));

        let mut fills = Vec::new();
        let mut removed = Vec::new();
        let remaining = level.fill(
            AccountId::new(3),
            Amount::from_str("4").unwrap(),
            &mut fills,
            &mut removed,
        );

        assert!(remaining.is_zero());
        assert_eq!(fills.len(), 2);
        assert_eq!(fills[0].maker_order_id, OrderId::new(1));
        assert!(fills[0].exhausted);
        assert_eq!(fills[1].maker_order_id, OrderId::new(2));
        assert!(!fills[1].exhausted);
        assert_eq!(removed, vec![OrderId::new(1)]);
        assert_eq!(level.front().unwrap().amount, Amount::from_str("1").unwrap());
    }

    #[test]
    fn test_fill_skips_own_account() {
        let mut level = PriceLevel::new();
        level.push_back(order(1, 7, "2"));
        level.push_back(order(2, 8, "2"));

        let mut fills = Vec::new();
        let mut removed = Vec::new();
        let remaining = level.fill(
            AccountId::new(7),
            Amount::from_str("2").unwrap(),
            &mut fills,
            &mut removed,
        );

        // Own order skipped and untouched; the later arrival matched.
        assert!(remaining.is_zero());
        assert_eq!(fills.len(), 1);
        assert_eq!(fills[0].maker_order_id, OrderId::new(2));
        assert_eq!(level.front().unwrap().id, OrderId::new(1));
        assert_eq!(level.front().unwrap().amount, Amount::from_str("2").unwrap());
    }

    #[test]
    fn test_fill_with_only_own_orders_matches_nothing() {
        let mut level = PriceLevel::new();
        level.push_back(order(1, 7, "2"));

        let mut fills = Vec::new();
        let mut removed = Vec::new();
        let remaining = level.fill(
            AccountId::new(7),
            Amount::from_str("2").unwrap(),
            &mut fills,
            &mut removed,
        );

        assert_eq!(remaining, Amount::from_str("2").unwrap());
        assert!(fills.is_empty());
        assert_eq!(level.len(), 1);
    }
}
