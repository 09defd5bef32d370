//! # Reference Sequences
//!
//! Allocates the `NNNN` part of `{PREFIX}-{YYYYMMDD}-{NNNN}` references.
//!
//! ## Allocation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  reference_sequences (tenant_id, prefix, day) ──► last_value            │
//! │                                                                         │
//! │  first use of a key:  last_value = COUNT(existing refs for key) + 1    │
//! │  later uses:          last_value = last_value + 1                      │
//! │                                                                         │
//! │  One INSERT .. ON CONFLICT DO UPDATE .. RETURNING inside the caller's  │
//! │  transaction. The counter row stays write-locked until commit, so two  │
//! │  postings can never read the same value.                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;
use sqlx::SqliteConnection;

use crate::error::DbResult;
use grandlivre_core::reference::{day_pattern, day_stamp, format_reference};

/// Which table's references a counter numbers. Used to seed a new counter
/// from rows written before the counter existed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Counter {
    JournalEntry,
    Expense,
}

impl Counter {
    const fn table(&self) -> &'static str {
        match self {
            Counter::JournalEntry => "journal_entries",
            Counter::Expense => "expenses",
        }
    }
}

/// Reserves the next sequence value for `(tenant, prefix, date)`.
pub(crate) async fn next_value(
    conn: &mut SqliteConnection,
    counter: Counter,
    tenant_id: &str,
    prefix: &str,
    date: NaiveDate,
) -> DbResult<i64> {
    let sql = format!(
        r#"
        INSERT INTO reference_sequences (tenant_id, prefix, day, last_value)
        VALUES (
            ?1, ?2, ?3,
            (SELECT COUNT(*) FROM {} WHERE tenant_id = ?1 AND reference LIKE ?4) + 1
        )
        ON CONFLICT (tenant_id, prefix, day) DO UPDATE SET last_value = last_value + 1
        RETURNING last_value
        "#,
        counter.table()
    );

    let value: i64 = sqlx::query_scalar(&sql)
        .bind(tenant_id)
        .bind(prefix)
        .bind(day_stamp(date))
        .bind(day_pattern(prefix, date))
        .fetch_one(&mut *conn)
        .await?;

    Ok(value)
}

/// Reserves and formats the next reference for `(tenant, prefix, date)`.
pub(crate) async fn next_reference(
    conn: &mut SqliteConnection,
    counter: Counter,
    tenant_id: &str,
    prefix: &str,
    date: NaiveDate,
) -> DbResult<String> {
    let value = next_value(conn, counter, tenant_id, prefix, date).await?;
    Ok(format_reference(prefix, date, value))
}
