//! # Expense Repository
//!
//! Manual expenses and the auto-expenses synthesized by posting rules.
//!
//! ## Expense Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  MANUAL                                                                 │
//! │    create() ──► Pending ──approve──► Approved ──► linked to JE-DEP-…   │
//! │                    │                                                    │
//! │                    └──reject───► Rejected                               │
//! │                                                                         │
//! │  AUTOMATIC (stock loss, fuel, supply, logistics)                        │
//! │    inserted Approved and linked, in the posting transaction            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `journal_entry_id` is written at most once: `link_entry()` only updates
//! rows whose link is still NULL.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::sequence::{self, Counter};
use grandlivre_core::reference::MANUAL_EXPENSE_PREFIX;
use grandlivre_core::validation::{validate_label, validate_positive_amount};
use grandlivre_core::{
    new_id, CoreError, Expense, ExpenseStatus, Money, PaymentMethod, Scope, MAX_LABEL_LENGTH,
};

const EXPENSE_COLUMNS: &str = r#"
    id, tenant_id, reference, label, amount_cents, date, status,
    category_id, payment_method, journal_entry_id, shop_id, warehouse_id,
    created_by, approved_by, approved_at, created_at
"#;

/// Input for a manually entered expense.
#[derive(Debug, Clone)]
pub struct NewExpense {
    pub label: String,
    pub amount: Money,
    pub date: NaiveDate,
    pub category_id: Option<String>,
    pub payment_method: Option<PaymentMethod>,
    pub scope: Scope,
}

/// Repository for expense operations.
#[derive(Debug, Clone)]
pub struct ExpenseRepository {
    pool: SqlitePool,
}

impl ExpenseRepository {
    /// Creates a new ExpenseRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ExpenseRepository { pool }
    }

    /// Records a Pending expense with a `DEP-{YYYYMMDD}-{NNNN}` reference.
    pub async fn create(
        &self,
        tenant_id: &str,
        input: NewExpense,
        actor_id: &str,
    ) -> DbResult<Expense> {
        validate_label("label", &input.label, MAX_LABEL_LENGTH)?;
        validate_positive_amount("amount", input.amount)?;

        if let Some(category_id) = &input.category_id {
            let owned: Option<String> = sqlx::query_scalar(
                "SELECT id FROM expense_categories WHERE id = ?1 AND tenant_id = ?2",
            )
            .bind(category_id)
            .bind(tenant_id)
            .fetch_optional(&self.pool)
            .await?;
            if owned.is_none() {
                return Err(DbError::not_found("Expense category", category_id.as_str()));
            }
        }

        let mut tx = self.pool.begin().await?;

        let reference = sequence::next_reference(
            &mut tx,
            Counter::Expense,
            tenant_id,
            MANUAL_EXPENSE_PREFIX,
            input.date,
        )
        .await?;

        let expense = Expense {
            id: new_id(),
            tenant_id: tenant_id.to_string(),
            reference,
            label: input.label.trim().to_string(),
            amount_cents: input.amount.cents(),
            date: input.date,
            status: ExpenseStatus::Pending,
            category_id: input.category_id,
            payment_method: input.payment_method,
            journal_entry_id: None,
            shop_id: input.scope.shop_id,
            warehouse_id: input.scope.warehouse_id,
            created_by: Some(actor_id.to_string()),
            approved_by: None,
            approved_at: None,
            created_at: Utc::now(),
        };

        insert(&mut tx, &expense).await?;
        tx.commit().await?;

        debug!(tenant_id, reference = %expense.reference, "Expense recorded");
        Ok(expense)
    }

    pub async fn get(&self, tenant_id: &str, id: &str) -> DbResult<Option<Expense>> {
        let sql = format!("SELECT {EXPENSE_COLUMNS} FROM expenses WHERE tenant_id = ?1 AND id = ?2");
        let expense = sqlx::query_as::<_, Expense>(&sql)
            .bind(tenant_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(expense)
    }

    /// Lists a tenant's expenses by date then reference, optionally by status.
    pub async fn list(&self, tenant_id: &str, status: Option<ExpenseStatus>) -> DbResult<Vec<Expense>> {
        let sql = format!(
            "SELECT {EXPENSE_COLUMNS} FROM expenses \
             WHERE tenant_id = ?1 AND (?2 IS NULL OR status = ?2) \
             ORDER BY date, reference"
        );
        let expenses = sqlx::query_as::<_, Expense>(&sql)
            .bind(tenant_id)
            .bind(status)
            .fetch_all(&self.pool)
            .await?;

        Ok(expenses)
    }

    /// Expenses linked to a journal entry (auto-expenses of a posting).
    pub async fn find_by_entry(&self, entry_id: &str) -> DbResult<Vec<Expense>> {
        let sql = format!("SELECT {EXPENSE_COLUMNS} FROM expenses WHERE journal_entry_id = ?1");
        let expenses = sqlx::query_as::<_, Expense>(&sql)
            .bind(entry_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(expenses)
    }

    /// Pending → Rejected.
    pub async fn reject(&self, tenant_id: &str, id: &str, actor_id: &str) -> DbResult<Expense> {
        let result = sqlx::query(
            "UPDATE expenses SET status = 'rejected', approved_by = ?3, approved_at = ?4 \
             WHERE tenant_id = ?1 AND id = ?2 AND status = 'pending'",
        )
        .bind(tenant_id)
        .bind(id)
        .bind(actor_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        let expense = self
            .get(tenant_id, id)
            .await?
            .ok_or_else(|| DbError::not_found("Expense", id))?;

        if result.rows_affected() == 0 {
            return Err(CoreError::invalid_expense_status(
                expense.reference,
                expense.status.as_str(),
                "reject",
            )
            .into());
        }

        info!(tenant_id, reference = %expense.reference, "Expense rejected");
        Ok(expense)
    }
}

// =============================================================================
// Transaction-scoped statements
// =============================================================================

pub(crate) async fn insert(conn: &mut SqliteConnection, expense: &Expense) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO expenses (
            id, tenant_id, reference, label, amount_cents, date, status,
            category_id, payment_method, journal_entry_id, shop_id, warehouse_id,
            created_by, approved_by, approved_at, created_at
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5, ?6, ?7,
            ?8, ?9, ?10, ?11, ?12,
            ?13, ?14, ?15, ?16
        )
        "#,
    )
    .bind(&expense.id)
    .bind(&expense.tenant_id)
    .bind(&expense.reference)
    .bind(&expense.label)
    .bind(expense.amount_cents)
    .bind(expense.date)
    .bind(expense.status)
    .bind(&expense.category_id)
    .bind(expense.payment_method)
    .bind(&expense.journal_entry_id)
    .bind(&expense.shop_id)
    .bind(&expense.warehouse_id)
    .bind(&expense.created_by)
    .bind(&expense.approved_by)
    .bind(expense.approved_at)
    .bind(expense.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Pending → Approved. Returns `false` if the expense was not Pending.
pub(crate) async fn mark_approved(
    conn: &mut SqliteConnection,
    tenant_id: &str,
    id: &str,
    actor_id: &str,
    now: DateTime<Utc>,
) -> DbResult<bool> {
    let result = sqlx::query(
        "UPDATE expenses SET status = 'approved', approved_by = ?3, approved_at = ?4 \
         WHERE tenant_id = ?1 AND id = ?2 AND status = 'pending'",
    )
    .bind(tenant_id)
    .bind(id)
    .bind(actor_id)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Sets the back-link to the posting entry. Returns `false` if the expense
/// was already linked.
pub(crate) async fn link_entry(
    conn: &mut SqliteConnection,
    id: &str,
    entry_id: &str,
) -> DbResult<bool> {
    let result = sqlx::query(
        "UPDATE expenses SET journal_entry_id = ?2 WHERE id = ?1 AND journal_entry_id IS NULL",
    )
    .bind(id)
    .bind(entry_id)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() == 1)
}
