//! Transfer Query Service
//!
//! Read-only lookups straight from the ledger store. Never touches the lock
//! coordinator, so queries never wait on in-flight transfers.

use std::sync::Arc;
use tracing::debug;

use super::error::TransferError;
use super::types::{Transaction, TransactionId};
use crate::ledger::LedgerStore;

/// History size when the caller gives none
pub const DEFAULT_HISTORY_LIMIT: usize = 50;
/// Largest history page served
pub const MAX_HISTORY_LIMIT: usize = 100;

pub struct TransferQueryService {
    ledger: Arc<dyn LedgerStore>,
}

impl TransferQueryService {
    pub fn new(ledger: Arc<dyn LedgerStore>) -> Self {
        Self { ledger }
    }

    /// Look up one transaction; an unparseable id is simply not found
    pub async fn get_transaction(
        &self,
        transaction_id: &str,
    ) -> Result<Option<Transaction>, TransferError> {
        let Ok(id) = transaction_id.parse::<TransactionId>() else {
            debug!(transaction_id = %transaction_id, "Malformed transaction id");
            return Ok(None);
        };
        Ok(self.ledger.find_transaction(&id).await?)
    }

    /// Transactions sent or received by `account_number`, newest first
    pub async fn get_account_transactions(
        &self,
        account_number: &str,
        limit: Option<usize>,
    ) -> Result<Vec<Transaction>, TransferError> {
        let limit = clamp_limit(limit);
        Ok(self
            .ledger
            .find_transactions_for_account(account_number, limit)
            .await?)
    }
}

/// Default 50, bounded to `1..=100`
pub fn clamp_limit(limit: Option<usize>) -> usize {
    limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .clamp(1, MAX_HISTORY_LIMIT)
}
