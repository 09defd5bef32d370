//! # Database Error Types
//!
//! Error types for ledger storage operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  sqlx::Error ──────────────► DbError::{NotFound, UniqueViolation, ...} │
//! │  CoreError (Unbalanced,                                                │
//! │   InvalidEntryStatus, ...) ─► DbError::Core                             │
//! │                                                                         │
//! │  Admin screens render DbError::Core as an explicit message.            │
//! │  Workflows calling record_* only ever see storage failures here.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use grandlivre_core::{CoreError, ValidationError};
use sqlx::error::ErrorKind;
use thiserror::Error;

/// Ledger storage errors.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// An account code, category code or reference already taken in the
    /// tenant.
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// A line, expense or category pointing at a row that does not exist.
    #[error("Dangling reference: {message}")]
    ForeignKeyViolation { message: String },

    /// A schema CHECK rejected the row, e.g. an entry whose stored totals
    /// differ or a negative line amount.
    #[error("Ledger constraint rejected the write: {message}")]
    CheckViolation { message: String },

    /// Accounting rule violation raised by the domain layer.
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Every pooled connection is busy. Posting transactions hold one for
    /// their whole duration.
    #[error("Connection pool exhausted")]
    PoolExhausted,

    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }

    /// The domain error, if this is one.
    pub fn as_core(&self) -> Option<&CoreError> {
        match self {
            DbError::Core(err) => Some(err),
            _ => None,
        }
    }

    /// Whether the write was refused by a schema constraint rather than
    /// failing for an operational reason.
    pub fn is_constraint(&self) -> bool {
        matches!(
            self,
            DbError::UniqueViolation { .. }
                | DbError::ForeignKeyViolation { .. }
                | DbError::CheckViolation { .. }
        )
    }
}

impl From<ValidationError> for DbError {
    fn from(err: ValidationError) -> Self {
        DbError::Core(CoreError::Validation(err))
    }
}

/// Columns named by a SQLite constraint message, e.g.
/// `UNIQUE constraint failed: accounts.tenant_id, accounts.code` gives
/// `accounts.tenant_id, accounts.code`.
fn constraint_target(message: &str) -> &str {
    message
        .split_once(": ")
        .map(|(_, target)| target)
        .unwrap_or(message)
}

/// ```text
/// RowNotFound                       → NotFound
/// Database, by ErrorKind            → UniqueViolation / ForeignKeyViolation /
///                                     CheckViolation / QueryFailed
/// PoolTimedOut                      → PoolExhausted
/// PoolClosed                        → ConnectionFailed
/// anything else                     → Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Row", "unknown"),

            sqlx::Error::Database(db_err) => {
                let message = db_err.message();
                match db_err.kind() {
                    ErrorKind::UniqueViolation => {
                        DbError::duplicate(constraint_target(message), "unknown")
                    }
                    ErrorKind::ForeignKeyViolation => DbError::ForeignKeyViolation {
                        message: message.to_string(),
                    },
                    ErrorKind::CheckViolation | ErrorKind::NotNullViolation => {
                        DbError::CheckViolation {
                            message: constraint_target(message).to_string(),
                        }
                    }
                    _ => DbError::QueryFailed(message.to_string()),
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,
            sqlx::Error::PoolClosed => DbError::ConnectionFailed("pool is closed".to_string()),
            other => DbError::Internal(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

pub type DbResult<T> = Result<T, DbError>;
