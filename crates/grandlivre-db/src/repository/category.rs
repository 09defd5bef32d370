//! # Expense Category Repository
//!
//! Categories classify expenses and may point at the ledger account an
//! approved expense of that category debits.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use grandlivre_core::chart::CategoryTemplate;
use grandlivre_core::validation::validate_label;
use grandlivre_core::{new_id, ExpenseCategory, ValidationError, MAX_NAME_LENGTH};

const CATEGORY_COLUMNS: &str = "id, tenant_id, code, name, account_id, created_at";

/// Repository for expense categories.
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: SqlitePool,
}

impl CategoryRepository {
    /// Creates a new CategoryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CategoryRepository { pool }
    }

    /// Creates a category, optionally linked to an account of the same tenant.
    pub async fn create(
        &self,
        tenant_id: &str,
        code: &str,
        name: &str,
        account_id: Option<&str>,
    ) -> DbResult<ExpenseCategory> {
        let code = code.trim();
        if code.is_empty() {
            return Err(ValidationError::Required {
                field: "code".to_string(),
            }
            .into());
        }
        validate_label("name", name, MAX_NAME_LENGTH)?;

        if let Some(account_id) = account_id {
            let owned: Option<String> =
                sqlx::query_scalar("SELECT id FROM accounts WHERE id = ?1 AND tenant_id = ?2")
                    .bind(account_id)
                    .bind(tenant_id)
                    .fetch_optional(&self.pool)
                    .await?;
            if owned.is_none() {
                return Err(DbError::not_found("Account", account_id));
            }
        }

        if self.find_by_code(tenant_id, code).await?.is_some() {
            return Err(DbError::duplicate("category code", code));
        }

        let category = ExpenseCategory {
            id: new_id(),
            tenant_id: tenant_id.to_string(),
            code: code.to_string(),
            name: name.trim().to_string(),
            account_id: account_id.map(str::to_string),
            created_at: Utc::now(),
        };

        debug!(tenant_id, code, "Creating expense category");

        sqlx::query(
            "INSERT INTO expense_categories (id, tenant_id, code, name, account_id, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(&category.id)
        .bind(&category.tenant_id)
        .bind(&category.code)
        .bind(&category.name)
        .bind(&category.account_id)
        .bind(category.created_at)
        .execute(&self.pool)
        .await?;

        Ok(category)
    }

    pub async fn get(&self, tenant_id: &str, id: &str) -> DbResult<Option<ExpenseCategory>> {
        let sql = format!(
            "SELECT {CATEGORY_COLUMNS} FROM expense_categories WHERE tenant_id = ?1 AND id = ?2"
        );
        let category = sqlx::query_as::<_, ExpenseCategory>(&sql)
            .bind(tenant_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(category)
    }

    pub async fn find_by_code(&self, tenant_id: &str, code: &str) -> DbResult<Option<ExpenseCategory>> {
        let sql = format!(
            "SELECT {CATEGORY_COLUMNS} FROM expense_categories WHERE tenant_id = ?1 AND code = ?2"
        );
        let category = sqlx::query_as::<_, ExpenseCategory>(&sql)
            .bind(tenant_id)
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;

        Ok(category)
    }

    pub async fn list(&self, tenant_id: &str) -> DbResult<Vec<ExpenseCategory>> {
        let sql = format!(
            "SELECT {CATEGORY_COLUMNS} FROM expense_categories WHERE tenant_id = ?1 ORDER BY code"
        );
        let categories = sqlx::query_as::<_, ExpenseCategory>(&sql)
            .bind(tenant_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(categories)
    }
}

/// Creates a category unless the tenant already has that code.
///
/// `account_id` is the already-resolved id of the template's account code.
pub(crate) async fn insert_if_absent(
    conn: &mut SqliteConnection,
    tenant_id: &str,
    template: &CategoryTemplate,
    account_id: Option<&str>,
    now: DateTime<Utc>,
) -> DbResult<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO expense_categories (id, tenant_id, code, name, account_id, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        ON CONFLICT (tenant_id, code) DO NOTHING
        "#,
    )
    .bind(new_id())
    .bind(tenant_id)
    .bind(&template.code)
    .bind(&template.name)
    .bind(account_id)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Category id by code within a transaction. Absence is tolerated.
pub(crate) async fn id_by_code(
    conn: &mut SqliteConnection,
    tenant_id: &str,
    code: &str,
) -> DbResult<Option<String>> {
    let id = sqlx::query_scalar("SELECT id FROM expense_categories WHERE tenant_id = ?1 AND code = ?2")
        .bind(tenant_id)
        .bind(code)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::account::NewAccount;
    use grandlivre_core::AccountType;

    #[tokio::test]
    async fn test_create_and_find() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let account = db
            .accounts()
            .create(
                "t1",
                NewAccount {
                    code: "622".to_string(),
                    name: "Loyers".to_string(),
                    account_type: AccountType::Expense,
                },
                "admin",
            )
            .await
            .unwrap();

        let repo = db.categories();
        let created = repo.create("t1", "rent", "Loyer", Some(&account.id)).await.unwrap();

        let found = repo.find_by_code("t1", "rent").await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert_eq!(found.account_id.as_deref(), Some(account.id.as_str()));
        assert!(repo.find_by_code("t2", "rent").await.unwrap().is_none());
        assert!(repo.get("t1", &created.id).await.unwrap().is_some());
        assert!(repo.get("t2", &created.id).await.unwrap().is_none());

        let err = repo.create("t1", "rent", "Loyer", None).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_foreign_account_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let err = db
            .categories()
            .create("t1", "rent", "Loyer", Some("missing"))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
