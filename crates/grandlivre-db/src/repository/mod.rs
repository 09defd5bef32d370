//! Database repository implementations for the ledger.
//!
//! Each repository wraps a `SqlitePool` for standalone reads and admin
//! operations. Statements that must join a posting transaction are exposed
//! as `pub(crate)` functions taking a `&mut SqliteConnection`.

pub mod account;
pub mod category;
pub mod expense;
pub mod journal;
pub mod sequence;
