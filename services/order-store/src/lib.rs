//! Order repository
//!
//! The durable record of orders and their append-only history events. The
//! contract is [`OrderStore`]; the engine only ever talks to the trait, so a
//! deployment picks a backend: [`MemoryOrderStore`] for tests and embedded
//! runs, [`PgOrderStore`] for Postgres.
//!
//! **Transactional guarantee:** `create_order` inserts the order row and its
//! companion ORDER_CREATED event atomically — both commit or neither does.
//! Everything else is a single-row read or append.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod repo;
pub mod schema;

pub use error::StoreError;
pub use memory::MemoryOrderStore;
pub use postgres::PgOrderStore;
pub use repo::{OrderStore, ReplayRecord};
