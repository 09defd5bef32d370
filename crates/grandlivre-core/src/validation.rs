//! # Validation Module
//!
//! Entry balancing and administrative input validation.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  candidate lines ──► entry_totals() ──► Σdebit == Σcredit ? ──► store  │
//! │                          │                     │                       │
//! │                          ▼                     ▼                       │
//! │                  NegativeAmount           Unbalanced                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use grandlivre_core::validation::{ensure_balanced, entry_totals};
//! use grandlivre_core::{Money, NewJournalLine};
//!
//! let lines = vec![
//!     NewJournalLine::debit("cash", Money::from_cents(300_000)),
//!     NewJournalLine::credit("revenue", Money::from_cents(300_000)),
//! ];
//! let totals = entry_totals(&lines).unwrap();
//! assert!(ensure_balanced(&totals).is_ok());
//! ```

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::NewJournalLine;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Entry Balancing
// =============================================================================

/// Debit and credit sums of a set of lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EntryTotals {
    pub debit: Money,
    pub credit: Money,
}

impl EntryTotals {
    #[inline]
    pub fn is_balanced(&self) -> bool {
        self.debit == self.credit
    }
}

/// Sums the lines, rejecting negative amounts.
pub fn entry_totals(lines: &[NewJournalLine]) -> CoreResult<EntryTotals> {
    let mut totals = EntryTotals::default();

    for (index, line) in lines.iter().enumerate() {
        if line.debit.is_negative() || line.credit.is_negative() {
            return Err(CoreError::NegativeAmount { line: index + 1 });
        }
        let overflow = || CoreError::AmountOverflow { line: index + 1 };
        totals.debit = totals.debit.checked_add(line.debit).ok_or_else(overflow)?;
        totals.credit = totals.credit.checked_add(line.credit).ok_or_else(overflow)?;
    }

    Ok(totals)
}

/// Exact cent comparison of debit and credit totals.
pub fn ensure_balanced(totals: &EntryTotals) -> CoreResult<()> {
    if totals.is_balanced() {
        Ok(())
    } else {
        Err(CoreError::Unbalanced {
            debit: totals.debit,
            credit: totals.credit,
        })
    }
}

// =============================================================================
// Administrative Input
// =============================================================================

/// Validates a chart-of-accounts code.
///
/// ## Rules
/// - Must not be empty
/// - At most 20 characters
/// - Digits, letters, dots and hyphens only
pub fn validate_account_code(code: &str) -> ValidationResult<()> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "code".to_string(),
        });
    }

    if code.len() > 20 {
        return Err(ValidationError::TooLong {
            field: "code".to_string(),
            max: 20,
        });
    }

    if !code
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ValidationError::InvalidFormat {
            field: "code".to_string(),
            reason: "must contain only letters, digits, dots and hyphens".to_string(),
        });
    }

    Ok(())
}

/// Validates a free-text label (account name, description, expense label).
pub fn validate_label(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

/// Validates a strictly positive amount.
pub fn validate_positive_amount(field: &str, amount: Money) -> ValidationResult<()> {
    if !amount.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
