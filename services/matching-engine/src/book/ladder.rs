//! Price ladder: the ordered map of levels for one side of one pair
//!
//! A BTreeMap keyed by the decimal price gives O(log n) insert/remove and
//! ordered best-first traversal. Which end is "best" is a traversal
//! parameter: asks walk from the minimum key, bids from the maximum. Empty
//! levels are removed eagerly so iteration stays dense.

use super::price_level::PriceLevel;
use std::collections::BTreeMap;
use types::{Order, OrderId, Price, Side};

#[derive(Debug, Clone, Default)]
pub struct Ladder {
    levels: BTreeMap<Price, PriceLevel>,
}

impl Ladder {
    pub fn new() -> Self {
        Self {
            levels: BTreeMap::new(),
        }
    }

    /// Insert a resting order at the tail of its price level.
    pub fn insert(&mut self, order: Order) {
        self.levels
            .entry(order.price)
            .or_insert_with(PriceLevel::new)
            .push_back(order);
    }

    /// Remove an order by id from the level at `price`, dropping the level
    /// if it becomes empty.
    pub fn remove(&mut self, price: Price, id: OrderId) -> Option<Order> {
        let level = self.levels.get_mut(&price)?;
        let removed = level.remove(id);
        if removed.is_some() && level.is_empty() {
            self.levels.remove(&price);
        }
        removed
    }

    /// Best price for a ladder holding orders of `side`: lowest ask,
    /// highest bid.
    pub fn best(&self, side: Side) -> Option<Price> {
        match side {
            Side::Ask => self.levels.keys().next().copied(),
            Side::Bid => self.levels.keys().next_back().copied(),
        }
    }

    /// The next level after `cursor` in best-first order: upward for asks,
    /// downward for bids.
    pub fn next_best(&self, side: Side, cursor: Price) -> Option<Price> {
        match side {
            Side::Ask => self
                .levels
                .range((std::ops::Bound::Excluded(cursor), std::ops::Bound::Unbounded))
                .map(|(p, _)| *p)
                .next(),
            Side::Bid => self
                .levels
                .range((std::ops::Bound::Unbounded, std::ops::Bound::Excluded(cursor)))
                .map(|(p, _)| *p)
                .next_back(),
        }
    }

    /// Prices of the levels an incoming opposite-side order with the given
    /// limit may trade at, best-first. For resting asks those are the levels
    /// at or below the limit, ascending; for resting bids the levels at or
    /// above it, descending.
    pub fn crossing_prices(&self, side: Side, limit: Price) -> Vec<Price> {
        match side {
            Side::Ask => self.levels.range(..=limit).map(|(p, _)| *p).collect(),
            Side::Bid => self.levels.range(limit..).rev().map(|(p, _)| *p).collect(),
        }
    }

    pub fn level_mut(&mut self, price: Price) -> Option<&mut PriceLevel> {
        self.levels.get_mut(&price)
    }

    pub fn level(&self, price: Price) -> Option<&PriceLevel> {
        self.levels.get(&price)
    }

    /// Drop the level at `price` if it holds no orders.
    pub fn drop_if_empty(&mut self, price: Price) {
        if self.levels.get(&price).is_some_and(PriceLevel::is_empty) {
            self.levels.remove(&price);
        }
    }

    /// Value copies of the orders in the best `take` levels after skipping
    /// `skip` levels, best-first, each level's FIFO concatenated in order.
    pub fn view(&self, side: Side, skip: usize, take: usize) -> Vec<Order> {
        let collect = |levels: &mut dyn Iterator<Item = &PriceLevel>| {
            levels
                .skip(skip)
                .take(take)
                .flat_map(|level| level.iter().cloned().collect::<Vec<_>>())
                .collect()
        };
        match side {
            Side::Ask => collect(&mut self.levels.values()),
            Side::Bid => collect(&mut self.levels.values().rev()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    /// Total resting orders across all levels.
    pub fn order_count(&self) -> usize {
        self.levels.values().map(PriceLevel::len).sum()
    }
}
