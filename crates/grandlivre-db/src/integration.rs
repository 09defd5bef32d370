//! # Accounting Integration
//!
//! The entry point business workflows call once an event has completed.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  record_fuel_log(tenant, &FuelLog, actor)                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  PostingRules::fuel_log()          → [Posting { lines by code }]        │
//! │       │   empty? ─────────────────────────────────────► Ok(None)        │
//! │       ▼                                                                 │
//! │  resolve every code (active only)                                       │
//! │       │   any missing? ── info! ──────────────────────► Ok(None)        │
//! │       ▼                                                                 │
//! │  Σdebit == Σcredit ?                                                    │
//! │       │   no ── error! ───────────────────────────────► Ok(None)        │
//! │       ▼                                                                 │
//! │  BEGIN                                                                  │
//! │    write_entry() per posting (reference, entry, lines, balances)        │
//! │    auto-expense per posting that asks for one                           │
//! │  COMMIT ──────────────────────────────────────────────► Ok(Some(entry)) │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Error Policy
//! Accounting is bookkeeping that follows the business operation, never a
//! precondition for it. Missing configuration, zero amounts and unbalanced
//! rule output are logged and produce `Ok(None)`. Only storage failures are
//! returned as `Err`, and callers are expected to log them and carry on.
//!
//! All postings generated by one event commit together or not at all.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, error, info, warn};

use crate::bootstrap::{BootstrapReport, ChartBootstrap};
use crate::engine::{self, JournalEngine};
use crate::error::{DbError, DbResult};
use crate::repository::account::AccountRepository;
use crate::repository::category::{self, CategoryRepository};
use crate::repository::expense::{self, ExpenseRepository};
use crate::repository::journal::{self, JournalRepository};
use crate::repository::sequence::{self, Counter};
use grandlivre_core::events::{
    CreditPaymentReceived, FuelLog, LogisticCharge, SaleCompleted, StockMovement, SupplyReceived,
    TransferReceived,
};
use grandlivre_core::reference::AUTO_EXPENSE_PREFIX;
use grandlivre_core::validation::EntryTotals;
use grandlivre_core::{
    new_id, AccountCodes, AutoExpense, CoreError, Expense, ExpenseStatus, JournalEntry,
    JournalStatus, NewJournalEntry, NewJournalLine, Posting, PostingRules, SourceRef,
};

/// A posting whose codes resolved to account ids and whose totals checked out.
struct PreparedPosting {
    entry: NewJournalEntry,
    totals: EntryTotals,
    auto_expense: Option<AutoExpense>,
}

/// Ledger integration service for one account numbering.
#[derive(Debug, Clone)]
pub struct LedgerIntegration {
    pool: SqlitePool,
    rules: PostingRules,
}

impl LedgerIntegration {
    pub fn new(pool: SqlitePool, codes: AccountCodes) -> Self {
        LedgerIntegration {
            pool,
            rules: PostingRules::new(codes),
        }
    }

    pub fn rules(&self) -> &PostingRules {
        &self.rules
    }

    /// Seeds the tenant's chart of accounts. Idempotent.
    pub async fn initialize_chart_of_accounts(
        &self,
        tenant_id: &str,
        actor_id: &str,
    ) -> DbResult<BootstrapReport> {
        ChartBootstrap::new(self.pool.clone(), self.rules.codes().clone())
            .initialize_chart_of_accounts(tenant_id, actor_id)
            .await
    }

    // =========================================================================
    // Business events
    // =========================================================================

    /// Completed sale. Returns the revenue entry, or the cost-of-goods-sold
    /// entry when the sale had no revenue to book.
    pub async fn record_sale(
        &self,
        tenant_id: &str,
        sale: &SaleCompleted,
        actor_id: &str,
    ) -> DbResult<Option<JournalEntry>> {
        self.commit_postings(tenant_id, self.rules.sale(sale), actor_id).await
    }

    pub async fn record_credit_payment(
        &self,
        tenant_id: &str,
        payment: &CreditPaymentReceived,
        actor_id: &str,
    ) -> DbResult<Option<JournalEntry>> {
        self.commit_postings(tenant_id, self.rules.credit_payment(payment), actor_id)
            .await
    }

    pub async fn record_supply_reception(
        &self,
        tenant_id: &str,
        supply: &SupplyReceived,
        actor_id: &str,
    ) -> DbResult<Option<JournalEntry>> {
        self.commit_postings(tenant_id, self.rules.supply_reception(supply), actor_id)
            .await
    }

    pub async fn record_transfer_reception(
        &self,
        tenant_id: &str,
        transfer: &TransferReceived,
        actor_id: &str,
    ) -> DbResult<Option<JournalEntry>> {
        self.commit_postings(tenant_id, self.rules.transfer_reception(transfer), actor_id)
            .await
    }

    /// Only losses and adjustments post; other movement kinds are booked by
    /// the sale, supply and transfer rules.
    pub async fn record_stock_movement(
        &self,
        tenant_id: &str,
        movement: &StockMovement,
        actor_id: &str,
    ) -> DbResult<Option<JournalEntry>> {
        self.commit_postings(tenant_id, self.rules.stock_movement(movement), actor_id)
            .await
    }

    pub async fn record_fuel_log(
        &self,
        tenant_id: &str,
        log: &FuelLog,
        actor_id: &str,
    ) -> DbResult<Option<JournalEntry>> {
        self.commit_postings(tenant_id, self.rules.fuel_log(log), actor_id).await
    }

    /// Standalone logistic charge. Charges attached to a supply or transfer
    /// are skipped here.
    pub async fn record_logistic_charge(
        &self,
        tenant_id: &str,
        charge: &LogisticCharge,
        actor_id: &str,
    ) -> DbResult<Option<JournalEntry>> {
        self.commit_postings(tenant_id, self.rules.logistic_charge(charge), actor_id)
            .await
    }

    // =========================================================================
    // Expenses
    // =========================================================================

    /// Pending → Approved, then posts the expense and links it to its entry,
    /// in one transaction.
    ///
    /// Approving an already Approved expense only posts it if it is not yet
    /// linked, so repeated approvals never create a second entry. The
    /// approval itself succeeds even when accounting is not configured.
    ///
    /// ## Errors
    /// - `CoreError::InvalidExpenseStatus` for a Rejected expense
    pub async fn approve_expense(
        &self,
        tenant_id: &str,
        expense_id: &str,
        actor_id: &str,
    ) -> DbResult<Option<JournalEntry>> {
        let expense = self.load_expense(tenant_id, expense_id).await?;

        match expense.status {
            ExpenseStatus::Rejected => {
                return Err(CoreError::invalid_expense_status(
                    expense.reference,
                    expense.status.as_str(),
                    "approve",
                )
                .into());
            }
            ExpenseStatus::Approved => {
                debug!(tenant_id, reference = %expense.reference, "Expense already approved");
                return self.record_expense(tenant_id, expense_id, actor_id).await;
            }
            ExpenseStatus::Pending => {}
        }

        let approved = Expense {
            status: ExpenseStatus::Approved,
            ..expense
        };
        let prepared = self.prepare_expense(tenant_id, &approved).await?;

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        if !expense::mark_approved(&mut tx, tenant_id, expense_id, actor_id, now).await? {
            tx.rollback().await?;
            let current = self.load_expense(tenant_id, expense_id).await?;
            return Err(CoreError::invalid_expense_status(
                current.reference,
                current.status.as_str(),
                "approve",
            )
            .into());
        }

        let entry = match prepared {
            Some(prepared) => {
                write_linked_expense_entry(&mut tx, tenant_id, &approved, &prepared, actor_id, now)
                    .await?
            }
            None => None,
        };
        tx.commit().await?;

        info!(
            tenant_id,
            reference = %approved.reference,
            entry = entry.as_ref().map(|e| e.reference.as_str()).unwrap_or("-"),
            "Expense approved"
        );
        Ok(entry)
    }

    /// Posts an Approved expense that has no journal entry yet.
    ///
    /// Pending, Rejected and already linked expenses produce `Ok(None)`.
    pub async fn record_expense(
        &self,
        tenant_id: &str,
        expense_id: &str,
        actor_id: &str,
    ) -> DbResult<Option<JournalEntry>> {
        let expense = self.load_expense(tenant_id, expense_id).await?;
        let Some(prepared) = self.prepare_expense(tenant_id, &expense).await? else {
            return Ok(None);
        };

        let mut tx = self.pool.begin().await?;
        let entry =
            write_linked_expense_entry(&mut tx, tenant_id, &expense, &prepared, actor_id, Utc::now())
                .await?;
        match entry {
            Some(entry) => {
                tx.commit().await?;
                info!(tenant_id, reference = %entry.reference, expense = %expense.reference, "Expense posted");
                Ok(Some(entry))
            }
            None => {
                tx.rollback().await?;
                Ok(None)
            }
        }
    }

    // =========================================================================
    // Administrative journal management
    // =========================================================================

    /// Manual entry, created as a Draft.
    pub async fn create_journal_entry(
        &self,
        tenant_id: &str,
        entry: NewJournalEntry,
        actor_id: &str,
    ) -> DbResult<JournalEntry> {
        JournalEngine::new(self.pool.clone())
            .create_draft(tenant_id, entry, actor_id)
            .await
    }

    pub async fn post_journal_entry(
        &self,
        tenant_id: &str,
        entry_id: &str,
        actor_id: &str,
    ) -> DbResult<JournalEntry> {
        JournalEngine::new(self.pool.clone())
            .post(tenant_id, entry_id, actor_id)
            .await
    }

    pub async fn void_journal_entry(
        &self,
        tenant_id: &str,
        entry_id: &str,
        actor_id: &str,
    ) -> DbResult<JournalEntry> {
        JournalEngine::new(self.pool.clone())
            .void(tenant_id, entry_id, actor_id)
            .await
    }

    // =========================================================================
    // Internals
    // =========================================================================

    async fn load_expense(&self, tenant_id: &str, expense_id: &str) -> DbResult<Expense> {
        ExpenseRepository::new(self.pool.clone())
            .get(tenant_id, expense_id)
            .await?
            .ok_or_else(|| DbError::not_found("Expense", expense_id))
    }

    /// Resolves the expense's category account and prepares its posting.
    async fn prepare_expense(
        &self,
        tenant_id: &str,
        expense: &Expense,
    ) -> DbResult<Option<PreparedPosting>> {
        let mut category_code = None;

        // Lookups stay inside the tenant: a category or account id owned by
        // another tenant reads as absent.
        if let Some(category_id) = &expense.category_id {
            let category = CategoryRepository::new(self.pool.clone())
                .get(tenant_id, category_id)
                .await?;
            if let Some(account_id) = category.and_then(|c| c.account_id) {
                match AccountRepository::new(self.pool.clone()).get(tenant_id, &account_id).await? {
                    Some(account) if account.is_active => category_code = Some(account.code),
                    _ => {
                        info!(
                            tenant_id,
                            reference = %expense.reference,
                            "Category account unavailable, expense not posted"
                        );
                        return Ok(None);
                    }
                }
            }
        }

        let postings = self.rules.approved_expense(expense, category_code.as_deref());
        Ok(self.prepare(tenant_id, postings).await?.and_then(|mut p| p.pop()))
    }

    /// Posts every posting of one event in a single transaction and returns
    /// the first entry.
    async fn commit_postings(
        &self,
        tenant_id: &str,
        postings: Vec<Posting>,
        actor_id: &str,
    ) -> DbResult<Option<JournalEntry>> {
        let Some(source) = postings.first().map(|p| p.source.clone()) else {
            debug!(tenant_id, "Nothing to post");
            return Ok(None);
        };

        if self.already_posted(tenant_id, &source).await? {
            warn!(tenant_id, kind = ?source.kind, source_id = %source.id, "Event already posted, skipping");
            return Ok(None);
        }

        let Some(prepared) = self.prepare(tenant_id, postings).await? else {
            return Ok(None);
        };

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let first = match write_prepared(&mut tx, tenant_id, &source, &prepared, actor_id, now).await {
            Ok(Some(first)) => first,
            Ok(None) => {
                tx.rollback().await?;
                warn!(
                    tenant_id,
                    kind = ?source.kind,
                    source_id = %source.id,
                    "Event posted concurrently, rolled back duplicate"
                );
                return Ok(None);
            }
            Err(err) => {
                if err.is_constraint() {
                    error!(
                        tenant_id,
                        kind = ?source.kind,
                        source_id = %source.id,
                        error = %err,
                        "Ledger constraint rejected posting"
                    );
                }
                tx.rollback().await?;
                return Err(err);
            }
        };

        tx.commit().await?;
        Ok(Some(first))
    }

    /// `true` if a non-voided entry already exists for this event.
    ///
    /// Read outside any transaction, so it only skips the common case.
    /// [`write_prepared`] repeats the check under the write lock.
    async fn already_posted(&self, tenant_id: &str, source: &SourceRef) -> DbResult<bool> {
        let entries = JournalRepository::new(self.pool.clone())
            .find_by_source(tenant_id, source)
            .await?;
        Ok(entries.iter().any(|e| e.status != JournalStatus::Voided))
    }

    /// Resolves every account code and checks balance.
    ///
    /// `None` when any code is missing or inactive (nothing of the event is
    /// posted) or when a posting does not balance.
    async fn prepare(
        &self,
        tenant_id: &str,
        postings: Vec<Posting>,
    ) -> DbResult<Option<Vec<PreparedPosting>>> {
        let accounts = AccountRepository::new(self.pool.clone());
        let mut ids: HashMap<String, String> = HashMap::new();

        for posting in &postings {
            for code in posting.account_codes() {
                if ids.contains_key(code) {
                    continue;
                }
                match accounts.resolve(tenant_id, code).await? {
                    Some(account) => {
                        ids.insert(account.code, account.id);
                    }
                    None => {
                        info!(
                            tenant_id,
                            code,
                            kind = ?posting.source.kind,
                            source_id = %posting.source.id,
                            "Account not configured, skipping posting"
                        );
                        return Ok(None);
                    }
                }
            }
        }

        let mut prepared = Vec::with_capacity(postings.len());
        for posting in postings {
            let lines: Vec<NewJournalLine> = posting
                .lines
                .iter()
                .filter_map(|line| {
                    ids.get(&line.account_code).map(|id| NewJournalLine {
                        account_id: id.clone(),
                        debit: line.debit,
                        credit: line.credit,
                        description: Some(line.description.clone()),
                    })
                })
                .collect();
            if lines.is_empty() {
                continue;
            }

            let entry = NewJournalEntry::new(posting.description, posting.date, lines)
                .with_source(posting.source)
                .with_scope(posting.scope);

            let totals = match engine::check_entry(&entry) {
                Ok(totals) => totals,
                Err(err) => {
                    error!(
                        tenant_id,
                        description = %entry.description,
                        error = %err,
                        "Rejected journal entry"
                    );
                    return Ok(None);
                }
            };

            prepared.push(PreparedPosting {
                entry,
                totals,
                auto_expense: posting.auto_expense,
            });
        }

        if prepared.is_empty() {
            return Ok(None);
        }
        Ok(Some(prepared))
    }
}

/// Writes every prepared posting of one event with its auto-expense.
/// `None` if the source already had a live posting; the caller must roll
/// back.
async fn write_prepared(
    conn: &mut SqliteConnection,
    tenant_id: &str,
    source: &SourceRef,
    prepared: &[PreparedPosting],
    actor_id: &str,
    now: DateTime<Utc>,
) -> DbResult<Option<JournalEntry>> {
    let mut first: Option<JournalEntry> = None;

    for posting in prepared {
        let entry = engine::write_entry(
            conn,
            tenant_id,
            &posting.entry,
            posting.totals,
            JournalStatus::Posted,
            actor_id,
            now,
        )
        .await?;

        // write_entry starts with a write, so this transaction now holds the
        // database write lock and sees every committed posting of the source.
        if first.is_none() && journal::live_source_count_in(conn, tenant_id, source).await? > 1 {
            return Ok(None);
        }

        if let Some(auto) = &posting.auto_expense {
            insert_auto_expense(conn, tenant_id, &entry, auto, actor_id, now).await?;
        }

        info!(
            tenant_id,
            reference = %entry.reference,
            entry_id = %entry.id,
            amount = %entry.total_debit(),
            "Journal entry posted"
        );
        first.get_or_insert(entry);
    }

    Ok(first)
}

/// Writes the expense's entry and links it. `None` if the expense was
/// linked by someone else in the meantime; the caller must roll back.
async fn write_linked_expense_entry(
    conn: &mut SqliteConnection,
    tenant_id: &str,
    expense: &Expense,
    prepared: &PreparedPosting,
    actor_id: &str,
    now: DateTime<Utc>,
) -> DbResult<Option<JournalEntry>> {
    let entry = engine::write_entry(
        conn,
        tenant_id,
        &prepared.entry,
        prepared.totals,
        JournalStatus::Posted,
        actor_id,
        now,
    )
    .await?;

    if !expense::link_entry(conn, &expense.id, &entry.id).await? {
        warn!(tenant_id, reference = %expense.reference, "Expense already linked");
        return Ok(None);
    }
    Ok(Some(entry))
}

/// Synthesizes the Approved, linked expense that accompanies a posting.
/// A missing category leaves `category_id` empty.
async fn insert_auto_expense(
    conn: &mut SqliteConnection,
    tenant_id: &str,
    entry: &JournalEntry,
    auto: &AutoExpense,
    actor_id: &str,
    now: DateTime<Utc>,
) -> DbResult<Expense> {
    let category_id = category::id_by_code(conn, tenant_id, &auto.category_code).await?;
    let reference =
        sequence::next_reference(conn, Counter::Expense, tenant_id, AUTO_EXPENSE_PREFIX, entry.date)
            .await?;

    let created = Expense {
        id: new_id(),
        tenant_id: tenant_id.to_string(),
        reference,
        label: auto.label.clone(),
        amount_cents: auto.amount.cents(),
        date: entry.date,
        status: ExpenseStatus::Approved,
        category_id,
        payment_method: None,
        journal_entry_id: Some(entry.id.clone()),
        shop_id: entry.shop_id.clone(),
        warehouse_id: entry.warehouse_id.clone(),
        created_by: Some(actor_id.to_string()),
        approved_by: Some(actor_id.to_string()),
        approved_at: Some(now),
        created_at: now,
    };

    expense::insert(conn, &created).await?;
    debug!(tenant_id, reference = %created.reference, category = %auto.category_code, "Auto expense created");
    Ok(created)
}
