//! Shared fixtures for the crate's tests.

use std::path::PathBuf;

use chrono::NaiveDate;

use crate::pool::{Database, DbConfig};
use grandlivre_core::{new_id, AccountCodes};

pub const TENANT: &str = "tenant-1";

pub fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
}

/// Fresh migrated in-memory database.
pub async fn setup() -> Database {
    Database::new(DbConfig::in_memory()).await.unwrap()
}

/// In-memory database with [`TENANT`]'s default chart of accounts.
pub async fn bootstrapped() -> Database {
    let db = setup().await;
    db.bootstrap(AccountCodes::default())
        .initialize_chart_of_accounts(TENANT, "admin")
        .await
        .unwrap();
    db
}

/// [`TENANT`]'s chart in a temporary database file served by several
/// connections, for tests where postings race each other. The caller
/// removes the file with [`remove_file_db`].
pub async fn bootstrapped_file(max_connections: u32) -> (Database, PathBuf) {
    let path = std::env::temp_dir().join(format!("grandlivre-{}.db", new_id()));
    let db = Database::new(DbConfig::new(&path).max_connections(max_connections))
        .await
        .unwrap();
    db.bootstrap(AccountCodes::default())
        .initialize_chart_of_accounts(TENANT, "admin")
        .await
        .unwrap();
    (db, path)
}

pub async fn remove_file_db(db: Database, path: PathBuf) {
    db.close().await;
    for suffix in ["", "-wal", "-shm"] {
        let mut file = path.clone().into_os_string();
        file.push(suffix);
        let _ = std::fs::remove_file(file);
    }
}

/// Balance of a [`TENANT`] account, in cents.
pub async fn balance(db: &Database, code: &str) -> i64 {
    db.accounts()
        .get_by_code(TENANT, code)
        .await
        .unwrap()
        .unwrap_or_else(|| panic!("no account {code}"))
        .balance_cents
}
