//! # Journal Entry Engine
//!
//! Turns candidate lines into durable, balanced, referenced journal entries
//! and drives their lifecycle.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   create_draft() ──► Draft ──post()──► Posted ──void()──► Voided        │
//! │                                  ▲                                      │
//! │   create_and_post() ─────────────┘                                      │
//! │                                                                         │
//! │   Posted applies every line to its account; Voided applies the exact    │
//! │   inverse. Nothing leaves Voided.                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## One Transaction Per Operation
//! ```text
//! BEGIN
//!   reference_sequences upsert   (first statement is a write: takes the lock)
//!   INSERT journal_entries
//!   INSERT journal_entry_lines × N
//!   UPDATE accounts × N          (posted only)
//! COMMIT                         (any error: the transaction is dropped and
//!                                 rolled back, nothing survives)
//! ```

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::journal::{self, JournalRepository};
use crate::repository::{account, sequence};
use grandlivre_core::validation::{ensure_balanced, entry_totals, validate_label, EntryTotals};
use grandlivre_core::{
    new_id, CoreError, CoreResult, JournalEntry, JournalEntryLine, JournalStatus, Money,
    NewJournalEntry, MAX_LABEL_LENGTH,
};

/// Journal entry engine over a connection pool.
#[derive(Debug, Clone)]
pub struct JournalEngine {
    pool: SqlitePool,
}

impl JournalEngine {
    /// Creates a new JournalEngine.
    pub fn new(pool: SqlitePool) -> Self {
        JournalEngine { pool }
    }

    /// Creates an entry directly in the Posted state and applies its lines.
    ///
    /// ## Returns
    /// * `Ok(None)` - `lines` was empty, nothing was created
    /// * `Ok(Some(entry))` - the posted entry
    ///
    /// ## Errors
    /// - `CoreError::Unbalanced` if Σdebit != Σcredit (nothing persisted)
    /// - `CoreError::NegativeAmount` for a negative line amount
    /// - `CoreError::AmountOverflow` if the totals do not fit in cents
    /// - `DbError::NotFound` if a line names an unknown or inactive account
    pub async fn create_and_post(
        &self,
        tenant_id: &str,
        entry: NewJournalEntry,
        actor_id: &str,
    ) -> DbResult<Option<JournalEntry>> {
        let totals = check_entry(&entry)?;
        if entry.lines.is_empty() {
            debug!(tenant_id, "No lines, nothing to post");
            return Ok(None);
        }
        self.ensure_accounts(tenant_id, &entry).await?;

        let mut tx = self.pool.begin().await?;
        let posted = write_entry(
            &mut tx,
            tenant_id,
            &entry,
            totals,
            JournalStatus::Posted,
            actor_id,
            Utc::now(),
        )
        .await?;
        tx.commit().await?;

        info!(
            tenant_id,
            reference = %posted.reference,
            amount = %posted.total_debit(),
            "Journal entry posted"
        );
        Ok(Some(posted))
    }

    /// Creates a Draft entry. Balances are untouched until [`Self::post`].
    ///
    /// Drafts must already be balanced and non-empty.
    pub async fn create_draft(
        &self,
        tenant_id: &str,
        entry: NewJournalEntry,
        actor_id: &str,
    ) -> DbResult<JournalEntry> {
        let totals = check_entry(&entry)?;
        if entry.lines.is_empty() {
            return Err(CoreError::EmptyEntry.into());
        }
        self.ensure_accounts(tenant_id, &entry).await?;

        let mut tx = self.pool.begin().await?;
        let draft = write_entry(
            &mut tx,
            tenant_id,
            &entry,
            totals,
            JournalStatus::Draft,
            actor_id,
            Utc::now(),
        )
        .await?;
        tx.commit().await?;

        info!(tenant_id, reference = %draft.reference, "Draft journal entry created");
        Ok(draft)
    }

    /// Draft → Posted, applying every line to its account.
    ///
    /// ## Errors
    /// - `CoreError::InvalidEntryStatus` unless the entry is a Draft
    /// - `CoreError::Unbalanced` / `EmptyEntry` if its lines do not balance
    pub async fn post(&self, tenant_id: &str, entry_id: &str, actor_id: &str) -> DbResult<JournalEntry> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE journal_entries SET status = 'posted', posted_by = ?3, posted_at = ?4 \
             WHERE tenant_id = ?1 AND id = ?2 AND status = 'draft'",
        )
        .bind(tenant_id)
        .bind(entry_id)
        .bind(actor_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(self.transition_error(tenant_id, entry_id, "post").await);
        }

        let lines = journal::lines_in(&mut tx, entry_id).await?;
        if lines.is_empty() {
            return Err(CoreError::EmptyEntry.into());
        }
        ensure_balanced(&stored_totals(&lines))?;

        for line in &lines {
            account::apply_movement(&mut tx, &line.account_id, line.debit(), line.credit(), now)
                .await?;
        }

        let posted = journal::get_in(&mut tx, tenant_id, entry_id)
            .await?
            .ok_or_else(|| DbError::not_found("JournalEntry", entry_id))?;
        tx.commit().await?;

        info!(tenant_id, reference = %posted.reference, "Draft journal entry posted");
        Ok(posted)
    }

    /// Posted → Voided, applying the inverse of every line.
    ///
    /// ## Errors
    /// - `CoreError::InvalidEntryStatus` unless the entry is Posted
    pub async fn void(&self, tenant_id: &str, entry_id: &str, actor_id: &str) -> DbResult<JournalEntry> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE journal_entries SET status = 'voided', voided_by = ?3, voided_at = ?4 \
             WHERE tenant_id = ?1 AND id = ?2 AND status = 'posted'",
        )
        .bind(tenant_id)
        .bind(entry_id)
        .bind(actor_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(self.transition_error(tenant_id, entry_id, "void").await);
        }

        // Every debit becomes a credit of the same amount and vice versa
        for line in journal::lines_in(&mut tx, entry_id).await? {
            account::apply_movement(&mut tx, &line.account_id, line.credit(), line.debit(), now)
                .await?;
        }

        let voided = journal::get_in(&mut tx, tenant_id, entry_id)
            .await?
            .ok_or_else(|| DbError::not_found("JournalEntry", entry_id))?;
        tx.commit().await?;

        info!(tenant_id, reference = %voided.reference, "Journal entry voided");
        Ok(voided)
    }

    /// Every line must name an active account of the tenant.
    async fn ensure_accounts(&self, tenant_id: &str, entry: &NewJournalEntry) -> DbResult<()> {
        for line in &entry.lines {
            let found: Option<String> = sqlx::query_scalar(
                "SELECT id FROM accounts WHERE id = ?1 AND tenant_id = ?2 AND is_active = 1",
            )
            .bind(&line.account_id)
            .bind(tenant_id)
            .fetch_optional(&self.pool)
            .await?;

            if found.is_none() {
                return Err(DbError::not_found("Account", &line.account_id));
            }
        }
        Ok(())
    }

    /// Explains why a guarded status update touched no row.
    async fn transition_error(&self, tenant_id: &str, entry_id: &str, operation: &str) -> DbError {
        match JournalRepository::new(self.pool.clone()).get(tenant_id, entry_id).await {
            Ok(Some(entry)) => {
                CoreError::invalid_entry_status(entry.reference, entry.status.as_str(), operation).into()
            }
            Ok(None) => DbError::not_found("JournalEntry", entry_id),
            Err(err) => err,
        }
    }
}

/// Validates a candidate entry and returns its totals.
pub(crate) fn check_entry(entry: &NewJournalEntry) -> CoreResult<EntryTotals> {
    validate_label("description", &entry.description, MAX_LABEL_LENGTH)?;
    let totals = entry_totals(&entry.lines)?;
    ensure_balanced(&totals)?;
    Ok(totals)
}

fn stored_totals(lines: &[JournalEntryLine]) -> EntryTotals {
    EntryTotals {
        debit: lines.iter().map(|l| l.debit()).sum::<Money>(),
        credit: lines.iter().map(|l| l.credit()).sum::<Money>(),
    }
}

/// Allocates a reference and writes an entry with its lines. Posted entries
/// also move account balances. Runs inside the caller's transaction.
pub(crate) async fn write_entry(
    conn: &mut SqliteConnection,
    tenant_id: &str,
    entry: &NewJournalEntry,
    totals: EntryTotals,
    status: JournalStatus,
    actor_id: &str,
    now: DateTime<Utc>,
) -> DbResult<JournalEntry> {
    let reference = sequence::next_reference(
        conn,
        sequence::Counter::JournalEntry,
        tenant_id,
        entry.reference_prefix(),
        entry.date,
    )
    .await?;

    let posted = status == JournalStatus::Posted;
    let stored = JournalEntry {
        id: new_id(),
        tenant_id: tenant_id.to_string(),
        reference,
        date: entry.date,
        description: entry.description.trim().to_string(),
        status,
        source: entry.source.clone(),
        total_debit_cents: totals.debit.cents(),
        total_credit_cents: totals.credit.cents(),
        shop_id: entry.scope.shop_id.clone(),
        warehouse_id: entry.scope.warehouse_id.clone(),
        created_by: Some(actor_id.to_string()),
        posted_by: posted.then(|| actor_id.to_string()),
        posted_at: posted.then_some(now),
        voided_by: None,
        voided_at: None,
        notes: entry.notes.clone(),
        created_at: now,
    };

    journal::insert_entry(conn, &stored).await?;

    for (index, line) in entry.lines.iter().enumerate() {
        let row = JournalEntryLine {
            id: new_id(),
            entry_id: stored.id.clone(),
            account_id: line.account_id.clone(),
            debit_cents: line.debit.cents(),
            credit_cents: line.credit.cents(),
            description: line.description.clone(),
        };
        journal::insert_line(conn, &row, index as i64 + 1).await?;

        if posted {
            account::apply_movement(conn, &line.account_id, line.debit, line.credit, now).await?;
        }
    }

    debug!(tenant_id, reference = %stored.reference, lines = entry.lines.len(), "Entry written");
    Ok(stored)
}

// =============================================================================
// Unit Tests
// =============================================================================
