//! # Error Types
//!
//! Domain-specific error types for grandlivre-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  grandlivre-core errors (this file)                                    │
//! │  ├── CoreError        - Accounting rule violations                     │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  grandlivre-db errors (separate crate)                                 │
//! │  └── DbError          - Storage failures, wraps CoreError              │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → admin screen message    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Configuration absence (no chart of accounts, inactive account) is NOT an
//! error: the posting layer treats it as a silent no-op.

use thiserror::Error;

use crate::money::Money;

// =============================================================================
// Core Error
// =============================================================================

/// Accounting rule violations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Sum of debits differs from sum of credits.
    ///
    /// ## When This Occurs
    /// - A posting rule received inconsistent event totals
    ///   (payments + due + discount != subtotal)
    /// - An administrator tries to post a draft that does not balance
    #[error("Unbalanced entry: debit {debit} != credit {credit}")]
    Unbalanced { debit: Money, credit: Money },

    /// A journal entry was submitted without lines.
    #[error("Journal entry must have at least one line")]
    EmptyEntry,

    /// A line carried a negative debit or credit.
    #[error("Line amounts must not be negative (line {line})")]
    NegativeAmount { line: usize },

    /// Line amounts add up past what a cent total can hold.
    #[error("Entry totals overflow (line {line})")]
    AmountOverflow { line: usize },

    /// The entry is not in a state that allows the requested transition.
    ///
    /// ## When This Occurs
    /// - Posting an entry that is already Posted or Voided
    /// - Voiding a Draft or an already Voided entry
    #[error("Journal entry {reference} is {current}, cannot {operation}")]
    InvalidEntryStatus {
        reference: String,
        current: String,
        operation: String,
    },

    /// The expense is not in a state that allows the requested transition.
    #[error("Expense {reference} is {current}, cannot {operation}")]
    InvalidExpenseStatus {
        reference: String,
        current: String,
        operation: String,
    },

    /// Bootstrap-created accounts cannot be deleted.
    #[error("Account {code} is a system account and cannot be deleted")]
    SystemAccount { code: String },

    /// Accounts referenced by journal lines are never physically deleted.
    #[error("Account {code} is referenced by journal lines; deactivate it instead")]
    AccountInUse { code: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    pub fn invalid_entry_status(
        reference: impl Into<String>,
        current: impl Into<String>,
        operation: impl Into<String>,
    ) -> Self {
        CoreError::InvalidEntryStatus {
            reference: reference.into(),
            current: current.into(),
            operation: operation.into(),
        }
    }

    pub fn invalid_expense_status(
        reference: impl Into<String>,
        current: impl Into<String>,
        operation: impl Into<String>,
    ) -> Self {
        CoreError::InvalidExpenseStatus {
            reference: reference.into(),
            current: current.into(),
            operation: operation.into(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Used for early validation of administrative input before any storage.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format.
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unbalanced_message() {
        let err = CoreError::Unbalanced {
            debit: Money::from_cents(100_000),
            credit: Money::from_cents(90_000),
        };
        assert_eq!(err.to_string(), "Unbalanced entry: debit 1000.00 != credit 900.00");
    }

    #[test]
    fn test_invalid_status_message() {
        let err = CoreError::invalid_entry_status("JE-CBR-20261018-0001", "voided", "void");
        assert_eq!(
            err.to_string(),
            "Journal entry JE-CBR-20261018-0001 is voided, cannot void"
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "code".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
