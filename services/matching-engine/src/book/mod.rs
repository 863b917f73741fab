//! The book: per-pair ladders plus the order index
//!
//! A [`Book`] owns every resting order. Each pair holds an ask ladder and a
//! bid ladder; the index maps an order id to its ladder location so a
//! cancellation never scans. Index and ladders mutate together under the
//! engine's writer lock, and a divergence between them quarantines the pair.

mod ladder;
mod price_level;

pub use ladder::Ladder;
pub use price_level::{Fill, PriceLevel};

use crate::error::EngineError;
use std::collections::{HashMap, HashSet};
use types::{Order, OrderId, PairId, Price, Side};

/// Where a resting order lives. Not authoritative for amount.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderLocator {
    pub pair_id: PairId,
    pub side: Side,
    pub price: Price,
}

/// Both sides of one pair.
#[derive(Debug, Clone, Default)]
pub struct PairBook {
    pub asks: Ladder,
    pub bids: Ladder,
}

impl PairBook {
    pub fn side(&self, side: Side) -> &Ladder {
        match side {
            Side::Ask => &self.asks,
            Side::Bid => &self.bids,
        }
    }

    fn side_mut(&mut self, side: Side) -> &mut Ladder {
        match side {
            Side::Ask => &mut self.asks,
            Side::Bid => &mut self.bids,
        }
    }
}

#[derive(Debug, Default)]
pub struct Book {
    pairs: HashMap<String, PairBook>,
    index: HashMap<OrderId, OrderLocator>,
    quarantined: HashSet<String>,
}

impl Book {
    pub fn new() -> Self {
        Self::default()
    }

    /// Match an incoming order against the opposite ladder of its pair and
    /// rest any residual on its own side.
    ///
    /// Walks crossing levels best-first; within a level the FIFO is consumed
    /// front-first, skipping the incoming account's own orders. On return
    /// `incoming.amount` holds the unmatched remainder (zero when fully
    /// filled); a positive remainder has been rested and indexed.
    pub fn match_incoming(&mut self, incoming: &mut Order) -> Result<Vec<Fill>, EngineError> {
        let pair_key = incoming.pair_id.as_str().to_string();
        self.ensure_healthy(&pair_key)?;

        let opp_side = incoming.side.opposite();
        let mut fills = Vec::new();
        let mut removed = Vec::new();
        let mut remaining = incoming.amount;

        {
            let pair = self.pairs.entry(pair_key.clone()).or_default();
            let opp = pair.side_mut(opp_side);
            for price in opp.crossing_prices(opp_side, incoming.price) {
                if remaining.is_zero() {
                    break;
                }
                if let Some(level) = opp.level_mut(price) {
                    remaining = level.fill(incoming.account_id, remaining, &mut fills, &mut removed);
                }
                opp.drop_if_empty(price);
            }
        }

        for id in &removed {
            if self.index.remove(id).is_none() {
                return Err(
                    self.quarantine(&pair_key, format!("filled order {id} missing from index"))
                );
            }
        }

        incoming.amount = remaining;
        if !remaining.is_zero() {
            self.rest(incoming.clone());
        }
        Ok(fills)
    }

    /// Remove a resting order. `OrderNotFound` when the id is unknown or
    /// already terminal (filled and cancelled orders leave the index).
    pub fn cancel(&mut self, id: OrderId) -> Result<Order, EngineError> {
        let locator = self
            .index
            .get(&id)
            .cloned()
            .ok_or(EngineError::OrderNotFound { order_id: id })?;
        let pair_key = locator.pair_id.as_str().to_string();
        self.ensure_healthy(&pair_key)?;

        if !self.pairs.contains_key(&pair_key) {
            return Err(self.quarantine(&pair_key, format!("indexed order {id} has no pair book")));
        }
        let removed = self
            .pairs
            .get_mut(&pair_key)
            .and_then(|pair| pair.side_mut(locator.side).remove(locator.price, id));
        match removed {
            Some(order) => {
                self.index.remove(&id);
                tracing::debug!(
                    order_id = %order.id,
                    pair_id = %order.pair_id,
                    side = %order.side,
                    price = %order.price,
                    amount = %order.amount,
                    "order removed"
                );
                Ok(order)
            }
            None => {
                Err(self.quarantine(&pair_key, format!("indexed order {id} missing from ladder")))
            }
        }
    }

    /// Value copies of the best levels on one side, skipping `skip` levels
    /// and concatenating the FIFOs of the next `take`.
    pub fn side_view(&self, pair_id: &str, side: Side, skip: usize, take: usize) -> Vec<Order> {
        self.pairs
            .get(pair_id)
            .map(|pair| pair.side(side).view(side, skip, take))
            .unwrap_or_default()
    }

    pub fn pair(&self, pair_id: &str) -> Option<&PairBook> {
        self.pairs.get(pair_id)
    }

    pub fn indexed_order_count(&self) -> usize {
        self.index.len()
    }

    pub fn locate(&self, id: OrderId) -> Option<&OrderLocator> {
        self.index.get(&id)
    }

    pub fn is_quarantined(&self, pair_id: &str) -> bool {
        self.quarantined.contains(pair_id)
    }

    /// Diagnostic scan: every indexed id must sit in its recorded ladder
    /// level and every resting order must be indexed. Returns the first
    /// violation found.
    pub fn consistency_violation(&self) -> Option<String> {
        for (id, locator) in &self.index {
            let present = self
                .pairs
                .get(locator.pair_id.as_str())
                .and_then(|pair| pair.side(locator.side).level(locator.price))
                .map(|level| level.iter().any(|o| o.id == *id))
                .unwrap_or(false);
            if !present {
                return Some(format!("indexed order {id} missing from ladder"));
            }
        }

        let resting: usize = self
            .pairs
            .values()
            .map(|pair| pair.asks.order_count() + pair.bids.order_count())
            .sum();
        if resting != self.index.len() {
            return Some(format!(
                "{} resting orders but {} index entries",
                resting,
                self.index.len()
            ));
        }
        None
    }

    fn rest(&mut self, order: Order) {
        let pair_key = order.pair_id.as_str().to_string();
        let locator = OrderLocator {
            pair_id: order.pair_id.clone(),
            side: order.side,
            price: order.price,
        };
        let id = order.id;

        let pair = self.pairs.entry(pair_key).or_default();
        let ladder = pair.side_mut(order.side);
        let level_existed = ladder.level(order.price).is_some();
        tracing::debug!(
            order_id = %order.id,
            pair_id = %order.pair_id,
            price = %order.price,
            amount = %order.amount,
            new_level = !level_existed,
            "order resting"
        );
        ladder.insert(order);
        self.index.insert(id, locator);
    }

    fn ensure_healthy(&self, pair_id: &str) -> Result<(), EngineError> {
        if self.quarantined.contains(pair_id) {
            Err(EngineError::Inconsistency {
                pair_id: pair_id.to_string(),
                detail: "pair is quarantined".to_string(),
            })
        } else {
            Ok(())
        }
    }

    fn quarantine(&mut self, pair_id: &str, detail: String) -> EngineError {
        tracing::error!(pair_id, detail = %detail, "book inconsistency, quarantining pair");
        self.quarantined.insert(pair_id.to_string());
        EngineError::Inconsistency {
            pair_id: pair_id.to_string(),
            detail,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use types::{AccountId, Amount};

    fn order(id: i64, side: Side, price: u64, amount: &str, account: i32) -> Order {
        Order {
            id: OrderId::new(id),
            pair_id: PairId::new("X"),
            price: Price::from_u64(price),
            amount: Amount::from_str(amount).unwrap(),
            account_id: AccountId::new(account),
            created_at: Utc::now(),
            side,
        }
    }

    #[test]
    fn test_rest_when_no_cross() {
        let mut book = Book::new();
        let mut bid = order(1, Side::Bid, 100, "5", 1);

        let fills = book.match_incoming(&mut bid).unwrap();

        assert!(fills.is_empty());
        assert_eq!(bid.amount, Amount::from_str("5").unwrap());
        assert_eq!(book.pair("X").unwrap().bids.order_count(), 1);
        assert_eq!(book.indexed_order_count(), 1);
        assert!(book.consistency_violation().is_none());
    }

    #[test]
    fn test_exact_fill_empties_both_sides() {
        let mut book = Book::new();
        book.match_incoming(&mut order(1, Side::Bid, 100, "5", 1)).unwrap();

        let mut ask = order(2, Side::Ask, 100, "5", 2);
        let fills = book.match_incoming(&mut ask).unwrap();

        assert_eq!(fills.len(), 1);
        assert_eq!(fills[0].maker_order_id, OrderId::new(1));
        assert!(ask.amount.is_zero());
        assert!(book.pair("X").unwrap().bids.is_empty());
        assert!(book.pair("X").unwrap().asks.is_empty());
        assert_eq!(book.indexed_order_count(), 0);
    }

    #[test]
    fn test_crossing_consumes_better_levels_first() {
        let mut book = Book::new();
        book.match_incoming(&mut order(1, Side::Bid, 100, "2", 1)).unwrap();
        book.match_incoming(&mut order(2, Side::Bid, 99, "3", 1)).unwrap();

        // Marketable ask at 99 takes the 100 level before the 99 level.
        let mut ask = order(3, Side::Ask, 99, "4", 2);
        let fills = book.match_incoming(&mut ask).unwrap();

        assert_eq!(fills.len(), 2);
        assert_eq!(fills[0].price, Price::from_u64(100));
        assert_eq!(fills[0].amount, Amount::from_str("2").unwrap());
        assert_eq!(fills[1].price, Price::from_u64(99));
        assert_eq!(fills[1].amount, Amount::from_str("2").unwrap());

        // A 1-unit residual bid rests at 99; the ask is fully filled.
        assert!(ask.amount.is_zero());
        let pair = book.pair("X").unwrap();
        assert!(pair.asks.is_empty());
        assert_eq!(pair.bids.order_count(), 1);
        assert_eq!(
            pair.bids.level(Price::from_u64(99)).unwrap().front().unwrap().amount,
            Amount::from_str("1").unwrap()
        );
    }

    #[test]
    fn test_price_improvement_never_trades_through_limit() {
        let mut book = Book::new();
        book.match_incoming(&mut order(1, Side::Bid, 98, "5", 1)).unwrap();

        // Ask at 99 must not sell to a 98 bid.
        let mut ask = order(2, Side::Ask, 99, "5", 2);
        let fills = book.match_incoming(&mut ask).unwrap();

        assert!(fills.is_empty());
        let pair = book.pair("X").unwrap();
        assert_eq!(pair.bids.order_count(), 1);
        assert_eq!(pair.asks.order_count(), 1);
    }

    #[test]
    fn test_cancel_unknown_is_not_found() {
        let mut book = Book::new();
        let err = book.cancel(OrderId::new(42)).unwrap_err();
        assert!(matches!(err, EngineError::OrderNotFound { order_id } if order_id == OrderId::new(42)));
    }

    #[test]
    fn test_cancel_removes_from_ladder_and_index() {
        let mut book = Book::new();
        book.match_incoming(&mut order(1, Side::Bid, 100, "5", 1)).unwrap();

        let cancelled = book.cancel(OrderId::new(1)).unwrap();
        assert_eq!(cancelled.id, OrderId::new(1));
        assert_eq!(book.indexed_order_count(), 0);
        assert!(book.pair("X").unwrap().bids.is_empty());

        // Second cancel is not double-processed.
        assert!(matches!(
            book.cancel(OrderId::new(1)),
            Err(EngineError::OrderNotFound { .. })
        ));
    }

    #[test]
    fn test_cancel_after_fill_is_not_found() {
        let mut book = Book::new();
        book.match_incoming(&mut order(1, Side::Bid, 100, "5", 1)).unwrap();
        book.match_incoming(&mut order(2, Side::Ask, 100, "5", 2)).unwrap();

        assert!(matches!(
            book.cancel(OrderId::new(1)),
            Err(EngineError::OrderNotFound { .. })
        ));
    }

    #[test]
    fn test_conservation_of_amount() {
        let mut book = Book::new();
        book.match_incoming(&mut order(1, Side::Bid, 100, "2", 1)).unwrap();
        book.match_incoming(&mut order(2, Side::Bid, 99, "3", 1)).unwrap();

        let mut ask = order(3, Side::Ask, 98, "9", 2);
        let fills = book.match_incoming(&mut ask).unwrap();

        let filled: Amount = fills
            .iter()
            .fold(Amount::zero(), |acc, f| acc + f.amount);
        assert_eq!(filled + ask.amount, Amount::from_str("9").unwrap());
        assert!(book.consistency_violation().is_none());
    }

    #[test]
    fn test_quarantined_pair_rejects_operations() {
        let mut book = Book::new();
        book.match_incoming(&mut order(1, Side::Bid, 100, "5", 1)).unwrap();
        book.quarantine("X", "test-induced".to_string());

        let err = book.match_incoming(&mut order(2, Side::Ask, 100, "5", 2)).unwrap_err();
        assert!(matches!(err, EngineError::Inconsistency { .. }));
        assert!(book.is_quarantined("X"));
    }
}
