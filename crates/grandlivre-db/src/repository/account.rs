//! # Account Repository
//!
//! The Account Ledger: chart-of-accounts rows and their running balances.
//!
//! ## Balance Mutation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Balances change ONLY through apply_movement(), called by the journal  │
//! │  engine inside a posting or voiding transaction:                        │
//! │                                                                         │
//! │    UPDATE accounts                                                      │
//! │    SET balance_cents = balance_cents + (debit - credit)   asset/expense │
//! │                                      + (credit - debit)   others        │
//! │                                                                         │
//! │  The increment is evaluated by SQLite under the write lock, so two     │
//! │  postings touching the same account never lose an update.              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Lookups Never Fail On Absence
//! `resolve()` returns `Ok(None)` for unknown or inactive codes. Callers in
//! the integration service treat that as "accounting not configured".

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use grandlivre_core::chart::AccountTemplate;
use grandlivre_core::validation::{validate_account_code, validate_label};
use grandlivre_core::{new_id, Account, AccountType, CoreError, Money, MAX_NAME_LENGTH};

const ACCOUNT_COLUMNS: &str = r#"
    id, tenant_id, code, name, account_type, balance_cents,
    is_active, is_system, created_by, created_at, updated_at
"#;

/// Input for an administrator-created account.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub code: String,
    pub name: String,
    pub account_type: AccountType,
}

/// Repository for chart-of-accounts operations.
#[derive(Debug, Clone)]
pub struct AccountRepository {
    pool: SqlitePool,
}

impl AccountRepository {
    /// Creates a new AccountRepository.
    pub fn new(pool: SqlitePool) -> Self {
        AccountRepository { pool }
    }

    /// Looks up an ACTIVE account by code for a tenant.
    pub async fn resolve(&self, tenant_id: &str, code: &str) -> DbResult<Option<Account>> {
        let sql = format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts \
             WHERE tenant_id = ?1 AND code = ?2 AND is_active = 1"
        );
        let account = sqlx::query_as::<_, Account>(&sql)
            .bind(tenant_id)
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;

        Ok(account)
    }

    /// Gets a tenant's account by ID, active or not.
    pub async fn get(&self, tenant_id: &str, id: &str) -> DbResult<Option<Account>> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE tenant_id = ?1 AND id = ?2");
        let account = sqlx::query_as::<_, Account>(&sql)
            .bind(tenant_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(account)
    }

    /// Gets an account by code, active or not.
    pub async fn get_by_code(&self, tenant_id: &str, code: &str) -> DbResult<Option<Account>> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE tenant_id = ?1 AND code = ?2");
        let account = sqlx::query_as::<_, Account>(&sql)
            .bind(tenant_id)
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;

        Ok(account)
    }

    /// Lists a tenant's accounts in code order.
    pub async fn list(&self, tenant_id: &str, include_inactive: bool) -> DbResult<Vec<Account>> {
        let sql = format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts \
             WHERE tenant_id = ?1 AND (?2 OR is_active = 1) \
             ORDER BY code"
        );
        let accounts = sqlx::query_as::<_, Account>(&sql)
            .bind(tenant_id)
            .bind(include_inactive)
            .fetch_all(&self.pool)
            .await?;

        Ok(accounts)
    }

    /// Creates a non-system account with a zero balance.
    ///
    /// ## Errors
    /// - `DbError::Core(Validation)` for a malformed code or name
    /// - `DbError::UniqueViolation` if the code already exists for the tenant
    pub async fn create(
        &self,
        tenant_id: &str,
        account: NewAccount,
        actor_id: &str,
    ) -> DbResult<Account> {
        validate_account_code(&account.code)?;
        validate_label("name", &account.name, MAX_NAME_LENGTH)?;
        let code = account.code.trim().to_string();

        if self.get_by_code(tenant_id, &code).await?.is_some() {
            return Err(DbError::duplicate("account code", code));
        }

        let now = Utc::now();
        let created = Account {
            id: new_id(),
            tenant_id: tenant_id.to_string(),
            code,
            name: account.name.trim().to_string(),
            account_type: account.account_type,
            balance_cents: 0,
            is_active: true,
            is_system: false,
            created_by: Some(actor_id.to_string()),
            created_at: now,
            updated_at: now,
        };

        debug!(tenant_id, code = %created.code, "Creating account");
        insert(&self.pool, &created).await?;

        Ok(created)
    }

    /// Soft-deactivates an account. Deactivated accounts no longer resolve,
    /// so postings that need them are skipped.
    pub async fn deactivate(&self, tenant_id: &str, code: &str) -> DbResult<Account> {
        self.set_active(tenant_id, code, false).await
    }

    /// Makes a deactivated account resolvable again.
    pub async fn reactivate(&self, tenant_id: &str, code: &str) -> DbResult<Account> {
        self.set_active(tenant_id, code, true).await
    }

    async fn set_active(&self, tenant_id: &str, code: &str, active: bool) -> DbResult<Account> {
        let result = sqlx::query(
            "UPDATE accounts SET is_active = ?3, updated_at = ?4 WHERE tenant_id = ?1 AND code = ?2",
        )
        .bind(tenant_id)
        .bind(code)
        .bind(active)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Account", code));
        }

        info!(tenant_id, code, active, "Account activation changed");

        self.get_by_code(tenant_id, code)
            .await?
            .ok_or_else(|| DbError::not_found("Account", code))
    }

    /// Physically deletes an account.
    ///
    /// ## Errors
    /// - `CoreError::SystemAccount` for bootstrap-created accounts
    /// - `CoreError::AccountInUse` when any journal line references it
    pub async fn delete(&self, tenant_id: &str, code: &str) -> DbResult<()> {
        let account = self
            .get_by_code(tenant_id, code)
            .await?
            .ok_or_else(|| DbError::not_found("Account", code))?;

        if account.is_system {
            return Err(CoreError::SystemAccount { code: account.code }.into());
        }

        let references: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM journal_entry_lines WHERE account_id = ?1")
                .bind(&account.id)
                .fetch_one(&self.pool)
                .await?;
        if references > 0 {
            return Err(CoreError::AccountInUse { code: account.code }.into());
        }

        sqlx::query("DELETE FROM accounts WHERE id = ?1")
            .bind(&account.id)
            .execute(&self.pool)
            .await?;

        info!(tenant_id, code, "Account deleted");
        Ok(())
    }
}

// =============================================================================
// Transaction-scoped statements
// =============================================================================

async fn insert<'e, E>(executor: E, account: &Account) -> DbResult<()>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO accounts (
            id, tenant_id, code, name, account_type, balance_cents,
            is_active, is_system, created_by, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
        "#,
    )
    .bind(&account.id)
    .bind(&account.tenant_id)
    .bind(&account.code)
    .bind(&account.name)
    .bind(account.account_type)
    .bind(account.balance_cents)
    .bind(account.is_active)
    .bind(account.is_system)
    .bind(&account.created_by)
    .bind(account.created_at)
    .bind(account.updated_at)
    .execute(executor)
    .await?;

    Ok(())
}

/// Creates a system account unless the tenant already has that code.
///
/// Existing rows are left untouched (name, activation and balance).
/// Returns `true` when a row was inserted.
pub(crate) async fn insert_system_if_absent(
    conn: &mut SqliteConnection,
    tenant_id: &str,
    template: &AccountTemplate,
    actor_id: &str,
    now: DateTime<Utc>,
) -> DbResult<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO accounts (
            id, tenant_id, code, name, account_type, balance_cents,
            is_active, is_system, created_by, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, 0, 1, 1, ?6, ?7, ?7)
        ON CONFLICT (tenant_id, code) DO NOTHING
        "#,
    )
    .bind(new_id())
    .bind(tenant_id)
    .bind(&template.code)
    .bind(&template.name)
    .bind(template.account_type)
    .bind(actor_id)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Id of a tenant's account by code, within a transaction.
pub(crate) async fn id_by_code(
    conn: &mut SqliteConnection,
    tenant_id: &str,
    code: &str,
) -> DbResult<Option<String>> {
    let id = sqlx::query_scalar("SELECT id FROM accounts WHERE tenant_id = ?1 AND code = ?2")
        .bind(tenant_id)
        .bind(code)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(id)
}

/// Applies a debit/credit movement to an account balance.
///
/// Zero movements are skipped. The sign follows the account's normal side.
pub(crate) async fn apply_movement(
    conn: &mut SqliteConnection,
    account_id: &str,
    debit: Money,
    credit: Money,
    now: DateTime<Utc>,
) -> DbResult<()> {
    if debit.is_zero() && credit.is_zero() {
        return Ok(());
    }

    let result = sqlx::query(
        r#"
        UPDATE accounts SET
            balance_cents = balance_cents + CASE
                WHEN account_type IN ('asset', 'expense') THEN ?2 - ?3
                ELSE ?3 - ?2
            END,
            updated_at = ?4
        WHERE id = ?1
        "#,
    )
    .bind(account_id)
    .bind(debit.cents())
    .bind(credit.cents())
    .bind(now)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Account", account_id));
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
