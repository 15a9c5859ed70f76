//! Transfer Error Types
//!
//! Callers branch on the variant, so validation failures never collapse into
//! a generic fault. `InsufficientFunds` keeps the decimal amounts it was
//! raised with.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::ledger::LedgerError;
use crate::lock::LockError;
use crate::money::{self, MoneyError};

/// Transfer error types
#[derive(Error, Debug, Clone)]
pub enum TransferError {
    // === Validation Errors (never persisted) ===
    /// Same-account transfer, non-positive amount, currency mismatch
    #[error("{0}")]
    InvalidTransfer(String),

    #[error("Account not found: {0}")]
    AccountNotFound(String),

    /// Build with [`TransferError::insufficient_funds`] so amounts render at scale 2
    #[error("Insufficient funds in account {account}. Required: {required}, Available: {available}")]
    InsufficientFunds {
        account: String,
        required: Decimal,
        available: Decimal,
    },

    // === Coordination Errors (retryable, never persisted) ===
    #[error("Unable to acquire lock for account: {0}")]
    LockUnavailable(String),

    // === System Errors ===
    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),

    #[error("Unit of work timed out after {0} ms")]
    Timeout(u64),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Internal system error: {0}")]
    SystemError(String),
}

impl TransferError {
    pub fn insufficient_funds(
        account: impl Into<String>,
        required: Decimal,
        available: Decimal,
    ) -> Self {
        let (mut required, mut available) = (required, available);
        required.rescale(money::SCALE);
        available.rescale(money::SCALE);
        TransferError::InsufficientFunds {
            account: account.into(),
            required,
            available,
        }
    }

    /// Get the error code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            TransferError::InvalidTransfer(_) => "INVALID_TRANSFER",
            TransferError::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            TransferError::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            TransferError::LockUnavailable(_) => "LOCK_UNAVAILABLE",
            TransferError::InvalidStateTransition(_) => "INVALID_STATE_TRANSITION",
            TransferError::Timeout(_) => "TIMEOUT",
            TransferError::Ledger(_) => "LEDGER_ERROR",
            TransferError::SystemError(_) => "SYSTEM_ERROR",
        }
    }

    /// Get HTTP status code suggestion
    pub fn http_status(&self) -> u16 {
        match self {
            TransferError::InvalidTransfer(_) => 400,
            TransferError::AccountNotFound(_) => 404,
            TransferError::InsufficientFunds { .. } => 422,
            TransferError::LockUnavailable(_)
            | TransferError::InvalidStateTransition(_)
            | TransferError::Timeout(_)
            | TransferError::Ledger(_)
            | TransferError::SystemError(_) => 500,
        }
    }

    /// Whether the same request may succeed if simply retried later
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TransferError::LockUnavailable(_)
                | TransferError::Timeout(_)
                | TransferError::Ledger(LedgerError::Timeout(_))
                | TransferError::Ledger(LedgerError::VersionConflict { .. })
        )
    }

    /// Caller-correctable errors detected before any record exists
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            TransferError::InvalidTransfer(_)
                | TransferError::AccountNotFound(_)
                | TransferError::InsufficientFunds { .. }
        )
    }
}

impl From<LockError> for TransferError {
    fn from(e: LockError) -> Self {
        match e {
            LockError::Unavailable { key, .. } => TransferError::LockUnavailable(key),
            LockError::Backend(msg) => TransferError::SystemError(msg),
        }
    }
}

impl From<MoneyError> for TransferError {
    fn from(e: MoneyError) -> Self {
        match e {
            MoneyError::Overflow => TransferError::SystemError(e.to_string()),
            other => TransferError::InvalidTransfer(other.to_string()),
        }
    }
}
