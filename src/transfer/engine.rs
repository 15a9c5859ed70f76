//! Transfer Engine
//!
//! Drives one transfer from request to terminal record:
//!
//! ```text
//! validate → lock pair (sorted) → unit of work: lock rows, check, debit/credit,
//!            COMPLETED → commit → unlock
//!                          ↓ error after the record exists
//!            rollback → FAILED record in a fresh unit of work → unlock → re-raise
//! ```
//!
//! Errors detected before the transaction record is built never leave an
//! audit row. Locks are released on every path, after the unit of work ends.
//!
//! The `tx_timeout_ms` deadline covers row locks, checks and staged writes.
//! COMMIT itself is left to the store's own statement timeout; when it
//! reports an error the engine looks the record up before declaring failure.

use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use super::error::TransferError;
use super::state::TransactionStatus;
use super::types::{MAX_DESCRIPTION_LEN, Transaction, TransactionId, TransferRequest};
use crate::account::Account;
use crate::config::TransferConfig;
use crate::ledger::{LedgerStore, UnitOfWork};
use crate::lock::{self, LockCoordinator};
use crate::money;

pub struct TransferEngine {
    ledger: Arc<dyn LedgerStore>,
    locks: Arc<dyn LockCoordinator>,
    config: TransferConfig,
}

impl TransferEngine {
    pub fn new(
        ledger: Arc<dyn LedgerStore>,
        locks: Arc<dyn LockCoordinator>,
        config: TransferConfig,
    ) -> Self {
        Self {
            ledger,
            locks,
            config,
        }
    }

    /// Move `req.amount` from `req.from_account` to `req.to_account`
    ///
    /// Returns the completed transaction. On failure after the transaction
    /// was built, a `failed` record is persisted and the original error is
    /// returned.
    pub async fn transfer(&self, req: TransferRequest) -> Result<Transaction, TransferError> {
        let amount = Self::validate(&req)?;

        let handles = match lock::acquire_ordered(
            self.locks.as_ref(),
            &[req.from_account.as_str(), req.to_account.as_str()],
            self.config.lock_ttl(),
        )
        .await
        {
            Ok(handles) => handles,
            Err(e) => {
                warn!(
                    from = %req.from_account,
                    to = %req.to_account,
                    coordinator = self.locks.name(),
                    error = %e,
                    "Transfer rejected: account lock unavailable"
                );
                return Err(e.into());
            }
        };

        let result = self.execute(&req, amount).await;

        lock::release_all(self.locks.as_ref(), &handles).await;

        match &result {
            Ok(tx) => info!(
                transaction_id = %tx.transaction_id,
                from = %tx.from_account,
                to = %tx.to_account,
                amount = %money::format_amount(tx.amount),
                currency = %tx.currency,
                "Transfer completed"
            ),
            Err(e) if e.is_validation() => debug!(
                from = %req.from_account,
                to = %req.to_account,
                code = e.code(),
                "Transfer rejected: {}", e
            ),
            Err(e) => error!(
                from = %req.from_account,
                to = %req.to_account,
                code = e.code(),
                "Transfer failed: {}", e
            ),
        }
        result
    }

    /// Checks that need no lock: same account, amount, description
    fn validate(req: &TransferRequest) -> Result<Decimal, TransferError> {
        if req.from_account == req.to_account {
            return Err(TransferError::InvalidTransfer(
                "Cannot transfer to the same account".to_string(),
            ));
        }

        if req.amount.trunc_with_scale(money::SCALE) <= Decimal::ZERO {
            return Err(TransferError::InvalidTransfer(
                "Transfer amount must be positive".to_string(),
            ));
        }
        let amount = money::to_scale(req.amount)?;

        if let Some(description) = &req.description
            && description.chars().count() > MAX_DESCRIPTION_LEN
        {
            return Err(TransferError::InvalidTransfer(format!(
                "Description cannot exceed {} characters",
                MAX_DESCRIPTION_LEN
            )));
        }

        Ok(amount)
    }

    async fn execute(
        &self,
        req: &TransferRequest,
        amount: Decimal,
    ) -> Result<Transaction, TransferError> {
        let timeout = self.config.tx_timeout();
        let timeout_ms = self.config.tx_timeout_ms;
        let deadline = Instant::now() + timeout;

        let mut uow = self.ledger.begin(timeout).await?;

        let checked =
            tokio::time::timeout_at(deadline, Self::load_and_check(uow.as_mut(), req, amount))
                .await
                .unwrap_or(Err(TransferError::Timeout(timeout_ms)));

        let (mut from, mut to) = match checked {
            Ok(pair) => pair,
            Err(e) => {
                Self::rollback_quietly(uow).await;
                return Err(e);
            }
        };

        let pending = Transaction::new(&from, &to, amount, req.description.clone());
        debug!(transaction_id = %pending.transaction_id, "Transaction created");

        let staged = tokio::time::timeout_at(
            deadline,
            Self::stage(uow.as_mut(), &pending, &mut from, &mut to),
        )
        .await
        .unwrap_or(Err(TransferError::Timeout(timeout_ms)));

        let completed = match staged {
            Ok(completed) => completed,
            Err(e) => {
                Self::rollback_quietly(uow).await;
                self.record_failure(pending, &e).await;
                return Err(e);
            }
        };

        // COMMIT is bounded by the store (statement_timeout), never cancelled
        // here: a dropped in-flight COMMIT has an unknown outcome.
        match uow.commit().await {
            Ok(()) => Ok(completed),
            Err(e) => {
                let e = TransferError::from(e);
                if let Some(committed) = self.find_committed(&pending.transaction_id).await {
                    warn!(
                        transaction_id = %pending.transaction_id,
                        error = %e,
                        "Commit reported an error but the transfer is durable"
                    );
                    return Ok(committed);
                }
                self.record_failure(pending, &e).await;
                Err(e)
            }
        }
    }

    /// The completed record, if a commit with an error result went through
    async fn find_committed(&self, transaction_id: &TransactionId) -> Option<Transaction> {
        match self.ledger.find_transaction(transaction_id).await {
            Ok(Some(tx)) if tx.status == TransactionStatus::Completed => Some(tx),
            Ok(_) => None,
            Err(e) => {
                error!(
                    transaction_id = %transaction_id,
                    error = %e,
                    "Cannot determine commit outcome"
                );
                None
            }
        }
    }

    /// Row locks plus the checks that precede the transaction record
    async fn load_and_check(
        uow: &mut dyn UnitOfWork,
        req: &TransferRequest,
        amount: Decimal,
    ) -> Result<(Account, Account), TransferError> {
        let from = uow
            .lock_active_account(&req.from_account)
            .await?
            .ok_or_else(|| TransferError::AccountNotFound(req.from_account.clone()))?;

        let to = uow
            .lock_active_account(&req.to_account)
            .await?
            .ok_or_else(|| TransferError::AccountNotFound(req.to_account.clone()))?;

        if from.currency != to.currency {
            return Err(TransferError::InvalidTransfer(format!(
                "Currency mismatch: {} vs {}",
                from.currency, to.currency
            )));
        }

        if !from.has_minimum_balance(amount) {
            return Err(TransferError::insufficient_funds(
                from.account_number.clone(),
                amount,
                from.balance,
            ));
        }

        Ok((from, to))
    }

    /// Debit, credit, complete and save; nothing is durable until commit
    async fn stage(
        uow: &mut dyn UnitOfWork,
        pending: &Transaction,
        from: &mut Account,
        to: &mut Account,
    ) -> Result<Transaction, TransferError> {
        from.debit(pending.amount)?;
        to.credit(pending.amount)?;

        let mut completed = pending.clone();
        completed.mark_completed()?;

        uow.save_account(from).await?;
        uow.save_account(to).await?;
        uow.save_transaction(&completed).await?;
        Ok(completed)
    }

    /// Persist `pending` as failed; a failure here is logged, never returned
    async fn record_failure(&self, mut pending: Transaction, cause: &TransferError) {
        if let Err(e) = pending.mark_failed(cause.to_string()) {
            error!(
                transaction_id = %pending.transaction_id,
                error = %e,
                "Cannot mark transaction failed"
            );
            return;
        }

        let saved = async {
            let mut uow = self.ledger.begin(self.config.tx_timeout()).await?;
            uow.save_transaction(&pending).await?;
            uow.commit().await
        }
        .await;

        match saved {
            Ok(()) => warn!(
                transaction_id = %pending.transaction_id,
                reason = pending.failure_reason.as_deref().unwrap_or_default(),
                "Failed transaction recorded"
            ),
            Err(e) => error!(
                transaction_id = %pending.transaction_id,
                error = %e,
                "Failed to record failed transaction"
            ),
        }
    }

    async fn rollback_quietly(uow: Box<dyn UnitOfWork>) {
        if let Err(e) = uow.rollback().await {
            warn!(error = %e, "Rollback failed");
        }
    }
}
