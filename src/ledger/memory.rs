//! In-memory Ledger Store
//!
//! Single-process backend used by tests and by deployments without
//! PostgreSQL. Rows are locked individually (one `tokio::sync::Mutex` per
//! account number), so units of work on disjoint accounts never wait on each
//! other. Writes are staged in the unit of work and applied in one critical
//! section at commit, after version and uniqueness checks pass.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tokio::time::Instant;
use tracing::debug;

use super::{LedgerError, LedgerStore, UnitOfWork};
use crate::account::{Account, DEMO_ACCOUNTS};
use crate::money;
use crate::transfer::{Transaction, TransactionId};

#[derive(Default)]
struct LedgerState {
    accounts: HashMap<String, Account>,
    /// Commit order
    transactions: Vec<Transaction>,
    by_id: HashMap<TransactionId, usize>,
}

struct Inner {
    state: RwLock<LedgerState>,
    /// One entry per opened account; unknown numbers never get one
    row_locks: DashMap<String, Arc<Mutex<()>>>,
    next_account_id: AtomicI64,
}

/// In-memory ledger backend
#[derive(Clone)]
pub struct MemoryLedger {
    inner: Arc<Inner>,
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                state: RwLock::new(LedgerState::default()),
                row_locks: DashMap::new(),
                next_account_id: AtomicI64::new(1),
            }),
        }
    }

    /// Provision an active account at version 1
    pub async fn open_account(
        &self,
        account_number: &str,
        account_holder: &str,
        balance: Decimal,
        currency: &str,
    ) -> Result<Account, LedgerError> {
        let mut state = self.inner.state.write().await;
        if state.accounts.contains_key(account_number) {
            return Err(LedgerError::UniqueViolation(format!(
                "account_number {} already exists",
                account_number
            )));
        }

        let balance = money::to_scale(balance)
            .map_err(|e| LedgerError::Database(format!("invalid balance: {}", e)))?;
        if balance.is_sign_negative() {
            return Err(LedgerError::Database(
                "check constraint violated: balance >= 0".to_string(),
            ));
        }

        let now = Utc::now();
        let account = Account {
            id: self.inner.next_account_id.fetch_add(1, Ordering::SeqCst),
            account_number: account_number.to_string(),
            account_holder: account_holder.to_string(),
            balance,
            currency: currency.to_string(),
            is_active: true,
            version: 1,
            created_at: now,
            updated_at: now,
        };
        self.inner
            .row_locks
            .insert(account.account_number.clone(), Arc::new(Mutex::new(())));
        state
            .accounts
            .insert(account.account_number.clone(), account.clone());
        Ok(account)
    }

    /// Open every demo account not already present
    pub async fn seed_demo_accounts(&self) -> Result<usize, LedgerError> {
        let mut opened = 0;
        for demo in DEMO_ACCOUNTS.iter() {
            match self
                .open_account(
                    demo.account_number,
                    demo.account_holder,
                    demo.balance(),
                    demo.currency,
                )
                .await
            {
                Ok(_) => opened += 1,
                Err(LedgerError::UniqueViolation(_)) => {}
                Err(e) => return Err(e),
            }
        }
        debug!(opened, "demo accounts seeded");
        Ok(opened)
    }

    /// Soft-delete or re-activate an account
    pub async fn set_active(&self, account_number: &str, active: bool) -> Result<(), LedgerError> {
        let mut state = self.inner.state.write().await;
        let account = state.accounts.get_mut(account_number).ok_or_else(|| {
            LedgerError::Database(format!("account {} does not exist", account_number))
        })?;
        account.is_active = active;
        account.updated_at = Utc::now();
        Ok(())
    }

    /// Every committed transaction, in commit order
    pub async fn transactions(&self) -> Vec<Transaction> {
        self.inner.state.read().await.transactions.clone()
    }
}

#[async_trait]
impl LedgerStore for MemoryLedger {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn begin(&self, timeout: Duration) -> Result<Box<dyn UnitOfWork>, LedgerError> {
        Ok(Box::new(MemoryUnitOfWork {
            inner: self.inner.clone(),
            deadline: Instant::now() + timeout,
            row_guards: HashMap::new(),
            staged_accounts: HashMap::new(),
            staged_transactions: Vec::new(),
        }))
    }

    async fn find_account(&self, account_number: &str) -> Result<Option<Account>, LedgerError> {
        Ok(self
            .inner
            .state
            .read()
            .await
            .accounts
            .get(account_number)
            .cloned())
    }

    async fn find_transaction(
        &self,
        transaction_id: &TransactionId,
    ) -> Result<Option<Transaction>, LedgerError> {
        let state = self.inner.state.read().await;
        Ok(state
            .by_id
            .get(transaction_id)
            .and_then(|idx| state.transactions.get(*idx))
            .cloned())
    }

    async fn find_transactions_for_account(
        &self,
        account_number: &str,
        limit: usize,
    ) -> Result<Vec<Transaction>, LedgerError> {
        let state = self.inner.state.read().await;
        // Reverse commit order first so equal timestamps keep newest-first
        let mut matching: Vec<Transaction> = state
            .transactions
            .iter()
            .rev()
            .filter(|t| t.from_account == account_number || t.to_account == account_number)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        matching.truncate(limit);
        Ok(matching)
    }

    async fn health_check(&self) -> Result<(), LedgerError> {
        Ok(())
    }
}

/// Unit of work over a [`MemoryLedger`]
pub struct MemoryUnitOfWork {
    inner: Arc<Inner>,
    deadline: Instant,
    /// Held until the unit of work is committed, rolled back or dropped
    row_guards: HashMap<String, OwnedMutexGuard<()>>,
    staged_accounts: HashMap<String, Account>,
    staged_transactions: Vec<Transaction>,
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    async fn lock_active_account(
        &mut self,
        account_number: &str,
    ) -> Result<Option<Account>, LedgerError> {
        if !self.row_guards.contains_key(account_number) {
            let Some(row) = self
                .inner
                .row_locks
                .get(account_number)
                .map(|r| r.value().clone())
            else {
                return Ok(None);
            };

            let guard = tokio::time::timeout_at(self.deadline, row.lock_owned())
                .await
                .map_err(|_| {
                    LedgerError::Timeout(format!("row lock on account {}", account_number))
                })?;
            debug!(account = %account_number, "row locked");
            self.row_guards.insert(account_number.to_string(), guard);
        }

        if let Some(staged) = self.staged_accounts.get(account_number) {
            return Ok(Some(staged.clone()).filter(|a| a.is_active));
        }

        let state = self.inner.state.read().await;
        Ok(state
            .accounts
            .get(account_number)
            .filter(|a| a.is_active)
            .cloned())
    }

    async fn save_account(&mut self, account: &Account) -> Result<(), LedgerError> {
        self.staged_accounts
            .insert(account.account_number.clone(), account.clone());
        Ok(())
    }

    async fn save_transaction(&mut self, transaction: &Transaction) -> Result<(), LedgerError> {
        if self
            .staged_transactions
            .iter()
            .any(|t| t.transaction_id == transaction.transaction_id)
        {
            return Err(LedgerError::UniqueViolation(format!(
                "transaction_id {} already exists",
                transaction.transaction_id
            )));
        }
        self.staged_transactions.push(transaction.clone());
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), LedgerError> {
        let this = *self;
        let mut state = this.inner.state.write().await;

        // Check everything before touching anything
        for staged in this.staged_accounts.values() {
            let stored = state.accounts.get(&staged.account_number).ok_or_else(|| {
                LedgerError::Database(format!(
                    "account {} does not exist",
                    staged.account_number
                ))
            })?;
            if stored.version != staged.version {
                return Err(LedgerError::VersionConflict {
                    account: staged.account_number.clone(),
                    expected: staged.version,
                    found: stored.version,
                });
            }
            if staged.balance.is_sign_negative() {
                return Err(LedgerError::Database(format!(
                    "check constraint violated: balance >= 0 on account {}",
                    staged.account_number
                )));
            }
        }
        for tx in &this.staged_transactions {
            if state.by_id.contains_key(&tx.transaction_id) {
                return Err(LedgerError::UniqueViolation(format!(
                    "transaction_id {} already exists",
                    tx.transaction_id
                )));
            }
        }

        for staged in this.staged_accounts.into_values() {
            if let Some(stored) = state.accounts.get_mut(&staged.account_number) {
                stored.balance = staged.balance;
                stored.updated_at = staged.updated_at;
                stored.version += 1;
            }
        }
        for tx in this.staged_transactions {
            let idx = state.transactions.len();
            state.by_id.insert(tx.transaction_id, idx);
            state.transactions.push(tx);
        }

        // Row guards drop here, after the writes are visible
        drop(state);
        drop(this.row_guards);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), LedgerError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transfer::TransactionStatus;
    use std::str::FromStr;

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    async fn ledger_with_two() -> MemoryLedger {
        let ledger = MemoryLedger::new();
        ledger
            .open_account("ACC1000000001", "Aakash Patel", dec("10000.00"), "INR")
            .await
            .unwrap();
        ledger
            .open_account("ACC1000000002", "Ashish Bhatt", dec("5000.00"), "INR")
            .await
            .unwrap();
        ledger
    }

    #[tokio::test]
    async fn test_seed_demo_accounts_is_repeatable() {
        let ledger = MemoryLedger::new();
        assert_eq!(ledger.seed_demo_accounts().await.unwrap(), 5);
        assert_eq!(ledger.seed_demo_accounts().await.unwrap(), 0);

        let acc = ledger.find_account("ACC1000000003").await.unwrap().unwrap();
        assert_eq!(acc.balance, dec("15000.50"));
        assert_eq!(acc.currency, "INR");
        assert!(acc.is_active);
    }

    #[tokio::test]
    async fn test_open_account_rejects_duplicate_number() {
        let ledger = ledger_with_two().await;
        let err = ledger
            .open_account("ACC1000000001", "Someone", dec("1.00"), "INR")
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::UniqueViolation(_)));
    }

    #[tokio::test]
    async fn test_inactive_account_is_invisible_to_lock() {
        let ledger = ledger_with_two().await;
        ledger.set_active("ACC1000000002", false).await.unwrap();

        let mut uow = ledger.begin(TIMEOUT).await.unwrap();
        assert!(uow.lock_active_account("ACC1000000002").await.unwrap().is_none());
        assert!(uow.lock_active_account("ACC1000000001").await.unwrap().is_some());
        uow.rollback().await.unwrap();

        // Unlocked reads still see it
        let acc = ledger.find_account("ACC1000000002").await.unwrap().unwrap();
        assert!(!acc.is_active);
    }

    #[tokio::test]
    async fn test_commit_applies_writes_and_bumps_version() {
        let ledger = ledger_with_two().await;

        let mut uow = ledger.begin(TIMEOUT).await.unwrap();
        let mut from = uow.lock_active_account("ACC1000000001").await.unwrap().unwrap();
        from.debit(dec("1.00")).unwrap();
        uow.save_account(&from).await.unwrap();
        uow.commit().await.unwrap();

        let after = ledger.find_account("ACC1000000001").await.unwrap().unwrap();
        assert_eq!(after.balance, dec("9999.00"));
        assert_eq!(after.version, 2);
    }

    #[tokio::test]
    async fn test_rollback_discards_writes() {
        let ledger = ledger_with_two().await;

        let mut uow = ledger.begin(TIMEOUT).await.unwrap();
        let mut from = uow.lock_active_account("ACC1000000001").await.unwrap().unwrap();
        from.debit(dec("500.00")).unwrap();
        uow.save_account(&from).await.unwrap();
        uow.rollback().await.unwrap();

        let after = ledger.find_account("ACC1000000001").await.unwrap().unwrap();
        assert_eq!(after.balance, dec("10000.00"));
        assert_eq!(after.version, 1);
    }

    #[tokio::test]
    async fn test_stale_write_is_detected_by_version() {
        let ledger = ledger_with_two().await;

        // Two writers read the same version without taking the row lock
        let mut first = ledger.find_account("ACC1000000001").await.unwrap().unwrap();
        let mut second = first.clone();

        first.debit(dec("10.00")).unwrap();
        let mut uow = ledger.begin(TIMEOUT).await.unwrap();
        uow.save_account(&first).await.unwrap();
        uow.commit().await.unwrap();

        second.debit(dec("20.00")).unwrap();
        let mut uow = ledger.begin(TIMEOUT).await.unwrap();
        uow.save_account(&second).await.unwrap();
        let err = uow.commit().await.unwrap_err();
        assert!(matches!(
            err,
            LedgerError::VersionConflict {
                expected: 1,
                found: 2,
                ..
            }
        ));

        let after = ledger.find_account("ACC1000000001").await.unwrap().unwrap();
        assert_eq!(after.balance, dec("9990.00"));
    }

    #[tokio::test]
    async fn test_failed_commit_applies_nothing() {
        let ledger = ledger_with_two().await;
        let stale = ledger.find_account("ACC1000000002").await.unwrap().unwrap();

        // Bump ACC1000000002 so the stale copy conflicts
        let mut uow = ledger.begin(TIMEOUT).await.unwrap();
        let mut fresh = uow.lock_active_account("ACC1000000002").await.unwrap().unwrap();
        fresh.credit(dec("1.00")).unwrap();
        uow.save_account(&fresh).await.unwrap();
        uow.commit().await.unwrap();

        let mut uow = ledger.begin(TIMEOUT).await.unwrap();
        let mut from = uow.lock_active_account("ACC1000000001").await.unwrap().unwrap();
        from.debit(dec("100.00")).unwrap();
        let mut tx = Transaction::new(&from, &stale, dec("100.00"), None);
        tx.mark_completed().unwrap();
        uow.save_account(&from).await.unwrap();
        uow.save_account(&stale).await.unwrap();
        uow.save_transaction(&tx).await.unwrap();
        assert!(uow.commit().await.is_err());

        let from_after = ledger.find_account("ACC1000000001").await.unwrap().unwrap();
        assert_eq!(from_after.balance, dec("10000.00"));
        assert!(ledger.transactions().await.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_transaction_id_is_rejected() {
        let ledger = ledger_with_two().await;
        let from = ledger.find_account("ACC1000000001").await.unwrap().unwrap();
        let to = ledger.find_account("ACC1000000002").await.unwrap().unwrap();
        let mut tx = Transaction::new(&from, &to, dec("1.00"), None);
        tx.mark_failed("test").unwrap();

        let mut uow = ledger.begin(TIMEOUT).await.unwrap();
        uow.save_transaction(&tx).await.unwrap();
        uow.commit().await.unwrap();

        let mut uow = ledger.begin(TIMEOUT).await.unwrap();
        uow.save_transaction(&tx).await.unwrap();
        assert!(matches!(
            uow.commit().await,
            Err(LedgerError::UniqueViolation(_))
        ));

        let mut uow = ledger.begin(TIMEOUT).await.unwrap();
        let mut other = Transaction::new(&from, &to, dec("2.00"), None);
        other.mark_failed("test").unwrap();
        uow.save_transaction(&other).await.unwrap();
        assert!(matches!(
            uow.save_transaction(&other).await,
            Err(LedgerError::UniqueViolation(_))
        ));
    }

    #[tokio::test]
    async fn test_row_lock_times_out_at_deadline() {
        let ledger = ledger_with_two().await;

        let mut holder = ledger.begin(TIMEOUT).await.unwrap();
        holder.lock_active_account("ACC1000000001").await.unwrap();

        let mut waiter = ledger.begin(Duration::from_millis(50)).await.unwrap();
        let err = waiter.lock_active_account("ACC1000000001").await.unwrap_err();
        assert!(matches!(err, LedgerError::Timeout(_)));

        // Other rows stay available
        assert!(waiter.lock_active_account("ACC1000000002").await.is_ok());
        holder.rollback().await.unwrap();
    }

    #[tokio::test]
    async fn test_row_lock_released_on_drop() {
        let ledger = ledger_with_two().await;
        {
            let mut uow = ledger.begin(TIMEOUT).await.unwrap();
            uow.lock_active_account("ACC1000000001").await.unwrap();
        }
        let mut uow = ledger.begin(Duration::from_millis(50)).await.unwrap();
        assert!(uow.lock_active_account("ACC1000000001").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_unknown_accounts_leave_no_row_lock() {
        let ledger = ledger_with_two().await;

        for i in 0..1_000 {
            let mut uow = ledger.begin(TIMEOUT).await.unwrap();
            let missing = format!("ACC9{:09}", i);
            assert!(uow.lock_active_account(&missing).await.unwrap().is_none());
            uow.rollback().await.unwrap();
        }

        assert_eq!(ledger.inner.row_locks.len(), 2);
    }

    #[tokio::test]
    async fn test_history_is_newest_first_and_limited() {
        let ledger = ledger_with_two().await;
        let a = ledger.find_account("ACC1000000001").await.unwrap().unwrap();
        let b = ledger.find_account("ACC1000000002").await.unwrap().unwrap();

        for i in 1..=3 {
            let (from, to) = if i % 2 == 0 { (&b, &a) } else { (&a, &b) };
            let mut tx = Transaction::new(from, to, Decimal::from(i), None);
            tx.mark_completed().unwrap();
            let mut uow = ledger.begin(TIMEOUT).await.unwrap();
            uow.save_transaction(&tx).await.unwrap();
            uow.commit().await.unwrap();
        }

        let history = ledger
            .find_transactions_for_account("ACC1000000001", 10)
            .await
            .unwrap();
        let amounts: Vec<Decimal> = history.iter().map(|t| t.amount).collect();
        assert_eq!(amounts, vec![dec("3"), dec("2"), dec("1")]);
        assert!(history.iter().all(|t| t.status == TransactionStatus::Completed));

        let limited = ledger
            .find_transactions_for_account("ACC1000000002", 2)
            .await
            .unwrap();
        assert_eq!(limited.len(), 2);
        assert_eq!(limited[0].amount, dec("3"));

        assert!(
            ledger
                .find_transactions_for_account("ACC9999999999", 10)
                .await
                .unwrap()
                .is_empty()
        );
    }
}
