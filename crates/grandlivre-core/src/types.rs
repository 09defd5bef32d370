//! # Domain Types
//!
//! Ledger entities shared by the posting rules and the database layer.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Ledger Entities                                │
//! │                                                                         │
//! │  Account ◄──────────── JournalEntryLine ──────────► JournalEntry        │
//! │  (code, type,           (debit | credit)            (reference, status, │
//! │   balance)                                            source, totals)   │
//! │     ▲                                                     ▲             │
//! │     │                                                     │             │
//! │  ExpenseCategory ◄──────────── Expense ───────────────────┘             │
//! │  (code, account?)          (status, journal_entry_id?)                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID: (account code, entry reference, expense reference)

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;
use uuid::Uuid;

use crate::money::Money;

/// Generates a new entity identifier (UUID v4 string).
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Account Type
// =============================================================================

/// Account class. Determines the normal balance side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Asset,
    Liability,
    Equity,
    Revenue,
    Expense,
}

impl AccountType {
    /// Asset and Expense balances grow with debits; the rest with credits.
    #[inline]
    pub const fn is_debit_normal(&self) -> bool {
        matches!(self, AccountType::Asset | AccountType::Expense)
    }

    /// Signed balance change produced by a debit/credit movement.
    ///
    /// ## Example
    /// ```rust
    /// use grandlivre_core::{AccountType, Money};
    ///
    /// let cash = AccountType::Asset.balance_delta(Money::from_cents(900), Money::zero());
    /// assert_eq!(cash.cents(), 900);
    ///
    /// let revenue = AccountType::Revenue.balance_delta(Money::zero(), Money::from_cents(1000));
    /// assert_eq!(revenue.cents(), 1000);
    /// ```
    pub fn balance_delta(&self, debit: Money, credit: Money) -> Money {
        if self.is_debit_normal() {
            debit - credit
        } else {
            credit - debit
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            AccountType::Asset => "asset",
            AccountType::Liability => "liability",
            AccountType::Equity => "equity",
            AccountType::Revenue => "revenue",
            AccountType::Expense => "expense",
        }
    }
}

// =============================================================================
// Account
// =============================================================================

/// A chart-of-accounts entry with its running balance.
///
/// `balance_cents` follows the normal-balance convention of `account_type`
/// and is only ever changed by posting or voiding a journal entry.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Account {
    pub id: String,
    pub tenant_id: String,
    /// Chart-of-accounts code, unique per tenant (e.g. "571").
    pub code: String,
    pub name: String,
    pub account_type: AccountType,
    pub balance_cents: i64,
    pub is_active: bool,
    /// Created by the bootstrap; cannot be deleted.
    pub is_system: bool,
    pub created_by: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Account {
    #[inline]
    pub fn balance(&self) -> Money {
        Money::from_cents(self.balance_cents)
    }
}

// =============================================================================
// Journal Status
// =============================================================================

/// Lifecycle of a journal entry: `Draft --post--> Posted --void--> Voided`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum JournalStatus {
    /// Recorded but not yet applied to balances.
    Draft,
    /// Applied to account balances.
    Posted,
    /// Reversed; terminal.
    Voided,
}

impl JournalStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            JournalStatus::Draft => "draft",
            JournalStatus::Posted => "posted",
            JournalStatus::Voided => "voided",
        }
    }
}

impl Default for JournalStatus {
    fn default() -> Self {
        JournalStatus::Draft
    }
}

impl fmt::Display for JournalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Entry Source
// =============================================================================

/// Kind of business event that originated a journal entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Sale,
    CreditPayment,
    Supply,
    Transfer,
    StockMovement,
    FuelLog,
    LogisticCharge,
    Expense,
    Manual,
}

impl SourceKind {
    /// Journal reference prefix for entries of this source.
    ///
    /// Credit payments have no dedicated prefix and fall back to `JE-AUTO`.
    pub const fn reference_prefix(&self) -> &'static str {
        match self {
            SourceKind::Sale => "JE-VTE",
            SourceKind::Supply => "JE-APR",
            SourceKind::Transfer => "JE-TRF",
            SourceKind::StockMovement => "JE-STK",
            SourceKind::FuelLog => "JE-CBR",
            SourceKind::LogisticCharge => "JE-LOG",
            SourceKind::Expense => "JE-DEP",
            SourceKind::CreditPayment | SourceKind::Manual => "JE-AUTO",
        }
    }
}

/// Typed link from a journal entry to the event row that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SourceRef {
    pub kind: SourceKind,
    pub id: String,
}

impl SourceRef {
    pub fn new(kind: SourceKind, id: impl Into<String>) -> Self {
        SourceRef { kind, id: id.into() }
    }
}

/// Optional shop / warehouse scoping carried by entries and expenses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Scope {
    pub shop_id: Option<String>,
    pub warehouse_id: Option<String>,
}

impl Scope {
    pub fn none() -> Self {
        Scope::default()
    }

    pub fn shop(shop_id: impl Into<String>) -> Self {
        Scope {
            shop_id: Some(shop_id.into()),
            warehouse_id: None,
        }
    }

    pub fn warehouse(warehouse_id: impl Into<String>) -> Self {
        Scope {
            shop_id: None,
            warehouse_id: Some(warehouse_id.into()),
        }
    }
}

// =============================================================================
// Journal Entry
// =============================================================================

/// A dated, referenced, multi-line accounting record.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct JournalEntry {
    pub id: String,
    pub tenant_id: String,
    /// `{PREFIX}-{YYYYMMDD}-{NNNN}`, unique per tenant.
    pub reference: String,
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub description: String,
    pub status: JournalStatus,
    pub source: Option<SourceRef>,
    pub total_debit_cents: i64,
    pub total_credit_cents: i64,
    pub shop_id: Option<String>,
    pub warehouse_id: Option<String>,
    pub created_by: Option<String>,
    pub posted_by: Option<String>,
    #[ts(as = "Option<String>")]
    pub posted_at: Option<DateTime<Utc>>,
    pub voided_by: Option<String>,
    #[ts(as = "Option<String>")]
    pub voided_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl JournalEntry {
    #[inline]
    pub fn total_debit(&self) -> Money {
        Money::from_cents(self.total_debit_cents)
    }

    #[inline]
    pub fn total_credit(&self) -> Money {
        Money::from_cents(self.total_credit_cents)
    }

    #[inline]
    pub fn is_balanced(&self) -> bool {
        self.total_debit_cents == self.total_credit_cents
    }
}

/// One debit or credit movement of a journal entry. Immutable once stored.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct JournalEntryLine {
    pub id: String,
    pub entry_id: String,
    pub account_id: String,
    pub debit_cents: i64,
    pub credit_cents: i64,
    pub description: Option<String>,
}

impl JournalEntryLine {
    #[inline]
    pub fn debit(&self) -> Money {
        Money::from_cents(self.debit_cents)
    }

    #[inline]
    pub fn credit(&self) -> Money {
        Money::from_cents(self.credit_cents)
    }
}

/// A candidate line addressed by account id, before it is stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewJournalLine {
    pub account_id: String,
    pub debit: Money,
    pub credit: Money,
    pub description: Option<String>,
}

impl NewJournalLine {
    pub fn debit(account_id: impl Into<String>, amount: Money) -> Self {
        NewJournalLine {
            account_id: account_id.into(),
            debit: amount,
            credit: Money::zero(),
            description: None,
        }
    }

    pub fn credit(account_id: impl Into<String>, amount: Money) -> Self {
        NewJournalLine {
            account_id: account_id.into(),
            debit: Money::zero(),
            credit: amount,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A candidate journal entry: header fields plus lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewJournalEntry {
    pub description: String,
    pub date: NaiveDate,
    pub lines: Vec<NewJournalLine>,
    pub source: Option<SourceRef>,
    pub scope: Scope,
    pub notes: Option<String>,
}

impl NewJournalEntry {
    pub fn new(description: impl Into<String>, date: NaiveDate, lines: Vec<NewJournalLine>) -> Self {
        NewJournalEntry {
            description: description.into(),
            date,
            lines,
            source: None,
            scope: Scope::none(),
            notes: None,
        }
    }

    pub fn with_source(mut self, source: SourceRef) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Reference prefix: the source's prefix, `JE-AUTO` for manual entries.
    pub fn reference_prefix(&self) -> &'static str {
        self.source
            .as_ref()
            .map(|s| s.kind.reference_prefix())
            .unwrap_or(SourceKind::Manual.reference_prefix())
    }
}

// =============================================================================
// Payment Method
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Bank,
    MobileMoney,
    Card,
    /// Sold on account: lands in customer receivables.
    Credit,
}

impl Default for PaymentMethod {
    fn default() -> Self {
        PaymentMethod::Cash
    }
}

// =============================================================================
// Expenses
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ExpenseStatus {
    Pending,
    Approved,
    Rejected,
}

impl ExpenseStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ExpenseStatus::Pending => "pending",
            ExpenseStatus::Approved => "approved",
            ExpenseStatus::Rejected => "rejected",
        }
    }
}

impl Default for ExpenseStatus {
    fn default() -> Self {
        ExpenseStatus::Pending
    }
}

/// An operating expense, either entered manually or synthesized by a
/// posting rule (already Approved and linked to its entry).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Expense {
    pub id: String,
    pub tenant_id: String,
    pub reference: String,
    pub label: String,
    pub amount_cents: i64,
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub status: ExpenseStatus,
    pub category_id: Option<String>,
    pub payment_method: Option<PaymentMethod>,
    /// Set once the expense has been posted to the ledger.
    pub journal_entry_id: Option<String>,
    pub shop_id: Option<String>,
    pub warehouse_id: Option<String>,
    pub created_by: Option<String>,
    pub approved_by: Option<String>,
    #[ts(as = "Option<String>")]
    pub approved_at: Option<DateTime<Utc>>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Expense {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

/// Expense classification, optionally mapped to a ledger account.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ExpenseCategory {
    pub id: String,
    pub tenant_id: String,
    /// Unique per tenant (e.g. "fuel").
    pub code: String,
    pub name: String,
    pub account_id: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================
