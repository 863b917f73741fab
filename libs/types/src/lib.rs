//! Shared domain types for the order book
//!
//! Identifier newtypes, fixed-point price/amount arithmetic, order and
//! history-event records, and the request-rejection taxonomy. Everything
//! here is storage- and transport-agnostic; the store, engine and gateway
//! crates build on these types.

pub mod errors;
pub mod events;
pub mod ids;
pub mod numeric;
pub mod order;

pub use errors::InvalidRequest;
pub use events::{EventKind, HistoryEvent};
pub use ids::{AccountId, EventId, OrderId, PairId};
pub use numeric::{Amount, Price};
pub use order::{NewOrder, Order, Side};
