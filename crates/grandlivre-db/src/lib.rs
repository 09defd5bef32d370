//! # grandlivre-db: Ledger Persistence
//!
//! SQLite storage for the double-entry ledger, with the services that
//! write to it transactionally.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Sale / Supply / Transfer / Stock / Fuel / Expense workflows            │
//! │       │ record_*(tenant, &event, actor)                                │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  grandlivre-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   LedgerIntegration ──► PostingRules (grandlivre-core)          │   │
//! │  │          │                                                      │   │
//! │  │          ▼                                                      │   │
//! │  │   JournalEngine ──► journal / account / expense / sequence     │   │
//! │  │          │              repositories                            │   │
//! │  │          ▼                                                      │   │
//! │  │   ChartBootstrap      Database (pool.rs)    migrations          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite (WAL): accounts, journal_entries, journal_entry_lines,         │
//! │                expense_categories, expenses, reference_sequences       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`config`] - Environment-driven settings
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Accounts, categories, expenses, journal, sequences
//! - [`engine`] - Journal entry lifecycle
//! - [`bootstrap`] - Chart-of-accounts seeding
//! - [`integration`] - `record_*` operations for business workflows
//!
//! ## Usage
//!
//! ```rust,ignore
//! use grandlivre_db::{Database, LedgerSettings};
//!
//! let settings = LedgerSettings::from_env()?;
//! let db = Database::new(settings.db_config()).await?;
//!
//! let ledger = db.ledger(settings.codes.clone());
//! ledger.initialize_chart_of_accounts(&tenant, &admin).await?;
//! let entry = ledger.record_sale(&tenant, &sale, &cashier).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod bootstrap;
pub mod config;
pub mod engine;
pub mod error;
pub mod integration;
pub mod migrations;
pub mod pool;
pub mod repository;

#[cfg(test)]
mod testing;

#[cfg(test)]
mod scenarios;

// =============================================================================
// Re-exports
// =============================================================================

pub use bootstrap::{BootstrapReport, ChartBootstrap};
pub use config::{ConfigError, LedgerSettings};
pub use engine::JournalEngine;
pub use error::{DbError, DbResult};
pub use integration::LedgerIntegration;
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::account::{AccountRepository, NewAccount};
pub use repository::category::CategoryRepository;
pub use repository::expense::{ExpenseRepository, NewExpense};
pub use repository::journal::JournalRepository;
