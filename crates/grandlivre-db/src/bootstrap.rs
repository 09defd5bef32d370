//! # Account Bootstrap
//!
//! Seeds a tenant's system accounts and starting expense categories.
//!
//! ## Idempotency
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  INSERT .. ON CONFLICT (tenant_id, code) DO NOTHING                     │
//! │                                                                         │
//! │  1st call: 14 accounts + 4 categories created                           │
//! │  2nd call: 0 created; names, activation and balances untouched          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Safe to call on every first touch of the finance module.

use chrono::Utc;
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbResult;
use crate::repository::{account, category};
use grandlivre_core::AccountCodes;

/// What a bootstrap run created.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BootstrapReport {
    pub tenant_id: String,
    /// Codes of the accounts inserted by this run.
    pub accounts_created: Vec<String>,
    pub accounts_existing: usize,
    /// Codes of the categories inserted by this run.
    pub categories_created: Vec<String>,
    pub categories_existing: usize,
}

impl BootstrapReport {
    /// `true` when the tenant was already fully set up.
    pub fn is_noop(&self) -> bool {
        self.accounts_created.is_empty() && self.categories_created.is_empty()
    }
}

/// Chart-of-accounts bootstrap for one account numbering.
#[derive(Debug, Clone)]
pub struct ChartBootstrap {
    pool: SqlitePool,
    codes: AccountCodes,
}

impl ChartBootstrap {
    pub fn new(pool: SqlitePool, codes: AccountCodes) -> Self {
        ChartBootstrap { pool, codes }
    }

    /// Creates every missing system account and expense category for the
    /// tenant, in one transaction.
    pub async fn initialize_chart_of_accounts(
        &self,
        tenant_id: &str,
        actor_id: &str,
    ) -> DbResult<BootstrapReport> {
        let now = Utc::now();
        let mut report = BootstrapReport {
            tenant_id: tenant_id.to_string(),
            ..BootstrapReport::default()
        };

        let mut tx = self.pool.begin().await?;

        for template in self.codes.system_accounts() {
            if account::insert_system_if_absent(&mut tx, tenant_id, &template, actor_id, now).await? {
                report.accounts_created.push(template.code);
            } else {
                report.accounts_existing += 1;
            }
        }

        for template in self.codes.expense_categories() {
            let account_id = match &template.account_code {
                Some(code) => account::id_by_code(&mut tx, tenant_id, code).await?,
                None => None,
            };
            if category::insert_if_absent(&mut tx, tenant_id, &template, account_id.as_deref(), now)
                .await?
            {
                report.categories_created.push(template.code);
            } else {
                report.categories_existing += 1;
            }
        }

        tx.commit().await?;

        info!(
            tenant_id,
            accounts_created = report.accounts_created.len(),
            categories_created = report.categories_created.len(),
            "Chart of accounts initialized"
        );
        Ok(report)
    }
}
