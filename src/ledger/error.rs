//! Ledger store error types

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum LedgerError {
    #[error("Database error: {0}")]
    Database(String),

    /// Optimistic-lock check failed: someone wrote the row since it was read
    #[error("Version conflict on account {account}: expected {expected}, found {found}")]
    VersionConflict {
        account: String,
        expected: i64,
        found: i64,
    },

    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("Ledger operation timed out: {0}")]
    Timeout(String),

    #[error("Corrupted row: {0}")]
    Corrupted(String),
}

impl From<sqlx::Error> for LedgerError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                LedgerError::UniqueViolation(db_err.message().to_string())
            }
            // 57014 query_canceled (statement_timeout), 55P03 lock_not_available (lock_timeout)
            sqlx::Error::Database(db_err)
                if matches!(db_err.code().as_deref(), Some("57014") | Some("55P03")) =>
            {
                LedgerError::Timeout(db_err.message().to_string())
            }
            sqlx::Error::PoolTimedOut => LedgerError::Timeout(e.to_string()),
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::ColumnNotFound(_) => {
                LedgerError::Corrupted(e.to_string())
            }
            _ => LedgerError::Database(e.to_string()),
        }
    }
}
