//! # grandlivre-core: Pure Accounting Logic
//!
//! The rules side of the double-entry ledger. Everything here is a pure
//! function of its inputs: no database, no clock reads in business rules,
//! no ambient tenant or user.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Sale / Supply / Transfer / Stock / Fuel / Expense workflows            │
//! │                 │ completed business event                             │
//! │                 ▼                                                       │
//! │  ┌───────────────────────────────────────────────────────────────────┐ │
//! │  │               ★ grandlivre-core (THIS CRATE) ★                    │ │
//! │  │                                                                   │ │
//! │  │   events ──► posting::PostingRules ──► Posting { lines by code } │ │
//! │  │                      ▲                                            │ │
//! │  │               chart::AccountCodes                                 │ │
//! │  │                                                                   │ │
//! │  │   validation (Σdebit == Σcredit)   reference (JE-VTE-…-0001)      │ │
//! │  └───────────────────────────────────────────────────────────────────┘ │
//! │                 │                                                       │
//! │                 ▼                                                       │
//! │  grandlivre-db: resolve accounts, allocate reference, post atomically   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Ledger entities (Account, JournalEntry, Expense, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`events`] - Business events handed over by the workflows
//! - [`chart`] - Account codes and the bootstrap catalogue
//! - [`posting`] - Event-to-entry translation rules
//! - [`reference`] - Reference number formats
//! - [`validation`] - Entry balancing and input checks
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use chrono::NaiveDate;
//! use grandlivre_core::events::FuelLog;
//! use grandlivre_core::{PostingRules, Scope};
//!
//! let rules = PostingRules::default();
//! let postings = rules.fuel_log(&FuelLog {
//!     fuel_log_id: "f-1".to_string(),
//!     vehicle: "Truck".to_string(),
//!     date: NaiveDate::from_ymd_opt(2026, 10, 18).unwrap(),
//!     scope: Scope::none(),
//!     cost_cents: 300_000,
//! });
//!
//! assert_eq!(postings.len(), 1);
//! assert_eq!(postings[0].total_debit(), postings[0].total_credit());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod chart;
pub mod error;
pub mod events;
pub mod money;
pub mod posting;
pub mod reference;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use chart::AccountCodes;
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use posting::{AutoExpense, Posting, PostingLine, PostingRules};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum length of entry descriptions and expense labels.
pub const MAX_LABEL_LENGTH: usize = 255;

/// Maximum length of account and category names.
pub const MAX_NAME_LENGTH: usize = 120;
