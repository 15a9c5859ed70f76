//! Ledger Store
//!
//! Durable storage of [`Account`] and [`Transaction`] records, seen by the
//! transfer engine only through two capability traits:
//!
//! - [`LedgerStore`]: opens units of work and serves unlocked reads
//! - [`UnitOfWork`]: exclusive row locks, staged writes, all-or-nothing commit
//!
//! # Guarantees required from every implementation
//!
//! 1. **Row locks**: `lock_active_account` holds the row exclusively until
//!    the unit of work commits or rolls back; inactive rows are invisible
//! 2. **Version CAS**: `save_account` succeeds only if the stored version
//!    still equals `account.version`, and bumps it
//! 3. **Write-once transactions**: `save_transaction` inserts; a duplicate
//!    `transaction_id` is a `UniqueViolation`
//! 4. **Atomic commit**: every write of the unit lands, or none does
//! 5. **Bounded**: waits inside a unit of work end at its deadline

pub mod error;
pub mod memory;
pub mod postgres;

pub use error::LedgerError;
pub use memory::MemoryLedger;
pub use postgres::PgLedger;

use async_trait::async_trait;
use std::time::Duration;

use crate::account::Account;
use crate::transfer::{Transaction, TransactionId};

/// Entry point to a ledger backend
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Backend name for logging
    fn name(&self) -> &'static str;

    /// Open a unit of work whose lock waits and statements end after `timeout`
    async fn begin(&self, timeout: Duration) -> Result<Box<dyn UnitOfWork>, LedgerError>;

    /// Read an account without locking (active or not)
    async fn find_account(&self, account_number: &str) -> Result<Option<Account>, LedgerError>;

    async fn find_transaction(
        &self,
        transaction_id: &TransactionId,
    ) -> Result<Option<Transaction>, LedgerError>;

    /// Transactions where the account is sender or receiver, newest first
    async fn find_transactions_for_account(
        &self,
        account_number: &str,
        limit: usize,
    ) -> Result<Vec<Transaction>, LedgerError>;

    async fn health_check(&self) -> Result<(), LedgerError>;
}

/// One atomic unit of work
///
/// Dropping a unit of work without committing discards its writes and
/// releases its row locks.
#[async_trait]
pub trait UnitOfWork: Send {
    /// Load an active account and hold its row exclusively
    async fn lock_active_account(
        &mut self,
        account_number: &str,
    ) -> Result<Option<Account>, LedgerError>;

    /// Write the account balance, checking and bumping `version`
    async fn save_account(&mut self, account: &Account) -> Result<(), LedgerError>;

    /// Insert a transaction record
    async fn save_transaction(&mut self, transaction: &Transaction) -> Result<(), LedgerError>;

    async fn commit(self: Box<Self>) -> Result<(), LedgerError>;

    async fn rollback(self: Box<Self>) -> Result<(), LedgerError>;
}
