//! # Journal Repository
//!
//! Reads and raw writes for journal entries and their lines. Status
//! transitions and balance effects belong to [`crate::engine`].
//!
//! ## Storage of the Source Link
//! ```text
//! SourceRef { kind: FuelLog, id: "f-1" }
//!        │
//!        ▼
//! journal_entries.source_kind = 'fuel_log'
//! journal_entries.source_id   = 'f-1'        (both NULL for manual entries)
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{SqliteConnection, SqlitePool};

use crate::error::DbResult;
use grandlivre_core::{JournalEntry, JournalEntryLine, JournalStatus, SourceKind, SourceRef};

const ENTRY_COLUMNS: &str = r#"
    id, tenant_id, reference, date, description, status,
    source_kind, source_id, total_debit_cents, total_credit_cents,
    shop_id, warehouse_id, created_by, posted_by, posted_at,
    voided_by, voided_at, notes, created_at
"#;

const LINE_COLUMNS: &str = "id, entry_id, account_id, debit_cents, credit_cents, description";

/// Flat row shape of `journal_entries`.
#[derive(Debug, sqlx::FromRow)]
struct JournalEntryRow {
    id: String,
    tenant_id: String,
    reference: String,
    date: NaiveDate,
    description: String,
    status: JournalStatus,
    source_kind: Option<SourceKind>,
    source_id: Option<String>,
    total_debit_cents: i64,
    total_credit_cents: i64,
    shop_id: Option<String>,
    warehouse_id: Option<String>,
    created_by: Option<String>,
    posted_by: Option<String>,
    posted_at: Option<DateTime<Utc>>,
    voided_by: Option<String>,
    voided_at: Option<DateTime<Utc>>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<JournalEntryRow> for JournalEntry {
    fn from(row: JournalEntryRow) -> Self {
        let source = match (row.source_kind, row.source_id) {
            (Some(kind), Some(id)) => Some(SourceRef { kind, id }),
            _ => None,
        };

        JournalEntry {
            id: row.id,
            tenant_id: row.tenant_id,
            reference: row.reference,
            date: row.date,
            description: row.description,
            status: row.status,
            source,
            total_debit_cents: row.total_debit_cents,
            total_credit_cents: row.total_credit_cents,
            shop_id: row.shop_id,
            warehouse_id: row.warehouse_id,
            created_by: row.created_by,
            posted_by: row.posted_by,
            posted_at: row.posted_at,
            voided_by: row.voided_by,
            voided_at: row.voided_at,
            notes: row.notes,
            created_at: row.created_at,
        }
    }
}

/// Repository for journal reads.
#[derive(Debug, Clone)]
pub struct JournalRepository {
    pool: SqlitePool,
}

impl JournalRepository {
    /// Creates a new JournalRepository.
    pub fn new(pool: SqlitePool) -> Self {
        JournalRepository { pool }
    }

    /// Gets an entry by ID within a tenant.
    pub async fn get(&self, tenant_id: &str, id: &str) -> DbResult<Option<JournalEntry>> {
        let sql = format!("SELECT {ENTRY_COLUMNS} FROM journal_entries WHERE tenant_id = ?1 AND id = ?2");
        let row = sqlx::query_as::<_, JournalEntryRow>(&sql)
            .bind(tenant_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(JournalEntry::from))
    }

    /// Gets an entry by its human-readable reference.
    pub async fn get_by_reference(
        &self,
        tenant_id: &str,
        reference: &str,
    ) -> DbResult<Option<JournalEntry>> {
        let sql = format!(
            "SELECT {ENTRY_COLUMNS} FROM journal_entries WHERE tenant_id = ?1 AND reference = ?2"
        );
        let row = sqlx::query_as::<_, JournalEntryRow>(&sql)
            .bind(tenant_id)
            .bind(reference)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(JournalEntry::from))
    }

    /// Lists a tenant's entries by date then reference, optionally by status.
    pub async fn list(
        &self,
        tenant_id: &str,
        status: Option<JournalStatus>,
    ) -> DbResult<Vec<JournalEntry>> {
        let sql = format!(
            "SELECT {ENTRY_COLUMNS} FROM journal_entries \
             WHERE tenant_id = ?1 AND (?2 IS NULL OR status = ?2) \
             ORDER BY date, reference"
        );
        let rows = sqlx::query_as::<_, JournalEntryRow>(&sql)
            .bind(tenant_id)
            .bind(status)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(JournalEntry::from).collect())
    }

    /// Entries produced by one business event, in creation order.
    pub async fn find_by_source(
        &self,
        tenant_id: &str,
        source: &SourceRef,
    ) -> DbResult<Vec<JournalEntry>> {
        let sql = format!(
            "SELECT {ENTRY_COLUMNS} FROM journal_entries \
             WHERE tenant_id = ?1 AND source_kind = ?2 AND source_id = ?3 \
             ORDER BY created_at, reference"
        );
        let rows = sqlx::query_as::<_, JournalEntryRow>(&sql)
            .bind(tenant_id)
            .bind(source.kind)
            .bind(&source.id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(JournalEntry::from).collect())
    }

    /// Lines of an entry in their original order.
    pub async fn lines(&self, entry_id: &str) -> DbResult<Vec<JournalEntryLine>> {
        let sql = format!(
            "SELECT {LINE_COLUMNS} FROM journal_entry_lines WHERE entry_id = ?1 ORDER BY line_no"
        );
        let lines = sqlx::query_as::<_, JournalEntryLine>(&sql)
            .bind(entry_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(lines)
    }

    /// Number of entries a tenant has, all statuses.
    pub async fn count(&self, tenant_id: &str) -> DbResult<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM journal_entries WHERE tenant_id = ?1")
            .bind(tenant_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Transaction-scoped statements
// =============================================================================

pub(crate) async fn insert_entry(conn: &mut SqliteConnection, entry: &JournalEntry) -> DbResult<()> {
    let (source_kind, source_id) = match &entry.source {
        Some(source) => (Some(source.kind), Some(source.id.as_str())),
        None => (None, None),
    };

    sqlx::query(
        r#"
        INSERT INTO journal_entries (
            id, tenant_id, reference, date, description, status,
            source_kind, source_id, total_debit_cents, total_credit_cents,
            shop_id, warehouse_id, created_by, posted_by, posted_at,
            voided_by, voided_at, notes, created_at
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5, ?6,
            ?7, ?8, ?9, ?10,
            ?11, ?12, ?13, ?14, ?15,
            ?16, ?17, ?18, ?19
        )
        "#,
    )
    .bind(&entry.id)
    .bind(&entry.tenant_id)
    .bind(&entry.reference)
    .bind(entry.date)
    .bind(&entry.description)
    .bind(entry.status)
    .bind(source_kind)
    .bind(source_id)
    .bind(entry.total_debit_cents)
    .bind(entry.total_credit_cents)
    .bind(&entry.shop_id)
    .bind(&entry.warehouse_id)
    .bind(&entry.created_by)
    .bind(&entry.posted_by)
    .bind(entry.posted_at)
    .bind(&entry.voided_by)
    .bind(entry.voided_at)
    .bind(&entry.notes)
    .bind(entry.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub(crate) async fn insert_line(
    conn: &mut SqliteConnection,
    line: &JournalEntryLine,
    line_no: i64,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO journal_entry_lines (
            id, entry_id, line_no, account_id, debit_cents, credit_cents, description
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(&line.id)
    .bind(&line.entry_id)
    .bind(line_no)
    .bind(&line.account_id)
    .bind(line.debit_cents)
    .bind(line.credit_cents)
    .bind(&line.description)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub(crate) async fn lines_in(conn: &mut SqliteConnection, entry_id: &str) -> DbResult<Vec<JournalEntryLine>> {
    let sql = format!(
        "SELECT {LINE_COLUMNS} FROM journal_entry_lines WHERE entry_id = ?1 ORDER BY line_no"
    );
    let lines = sqlx::query_as::<_, JournalEntryLine>(&sql)
        .bind(entry_id)
        .fetch_all(&mut *conn)
        .await?;

    Ok(lines)
}

pub(crate) async fn get_in(
    conn: &mut SqliteConnection,
    tenant_id: &str,
    id: &str,
) -> DbResult<Option<JournalEntry>> {
    let sql = format!("SELECT {ENTRY_COLUMNS} FROM journal_entries WHERE tenant_id = ?1 AND id = ?2");
    let row = sqlx::query_as::<_, JournalEntryRow>(&sql)
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(row.map(JournalEntry::from))
}

/// Non-voided entries already written for a source, counting any written
/// earlier in the same transaction.
pub(crate) async fn live_source_count_in(
    conn: &mut SqliteConnection,
    tenant_id: &str,
    source: &SourceRef,
) -> DbResult<i64> {
    let count = sqlx::query_scalar(
        "SELECT COUNT(*) FROM journal_entries \
         WHERE tenant_id = ?1 AND source_kind = ?2 AND source_id = ?3 AND status <> 'voided'",
    )
    .bind(tenant_id)
    .bind(source.kind)
    .bind(&source.id)
    .fetch_one(&mut *conn)
    .await?;

    Ok(count)
}
