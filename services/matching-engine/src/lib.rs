//! Matching engine
//!
//! Price-time-priority order books over many independent trading pairs.
//! Submissions flow through a FIFO channel into a single consumer; every
//! book mutation happens on that consumer or under the book's writer lock,
//! which removes all intra-pair races. Snapshots read under the shared lock.
//!
//! **Key invariants:**
//! - Conservation of amount: fills plus residual equal the incoming amount
//! - Price-time priority: best price first, earliest arrival first within a level
//! - Price improvement: an order never trades through its own limit
//! - No self-trades: same-account resting orders are skipped, not consumed

pub mod book;
pub mod engine;
pub mod error;
pub mod recovery;
pub mod snapshot;

pub use book::{Book, Fill};
pub use engine::{process_submission, Engine, EngineHandle, MatchSummary};
pub use error::EngineError;
pub use snapshot::{BookView, SnapshotFrame};
