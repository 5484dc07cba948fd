//! # Punchcard Store
//!
//! The redemption ledger: the authoritative, append-only record of which
//! redemption ids have been consumed, and the derived per-customer stamp
//! balances.
//!
//! The [`Ledger`] trait keeps the service storage-agnostic. The SQLite
//! backend is the primary one; [`MemoryLedger`] mirrors its semantics
//! for tests.

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryLedger;
pub use sqlite::SqliteLedger;
pub use traits::{Ledger, RecordOutcome};
