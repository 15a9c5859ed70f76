//! Fund Transfer - exactly-once money movement between accounts
//!
//! # Modules
//!
//! - [`money`] - Scale-2 decimal parsing and formatting
//! - [`account`] - Account record and demo fixtures
//! - [`ledger`] - Ledger store capability (PostgreSQL and in-memory)
//! - [`lock`] - Lock coordinator (PostgreSQL lock table and in-process)
//! - [`transfer`] - Transfer engine, query service, transaction records
//! - [`gateway`] - HTTP surface
//! - [`db`] - PostgreSQL pool and schema bootstrap
//! - [`config`] / [`logging`] - YAML config and tracing setup

pub mod account;
pub mod config;
pub mod db;
pub mod gateway;
pub mod ledger;
pub mod lock;
pub mod logging;
pub mod money;
pub mod transfer;

// Convenient re-exports at crate root
pub use account::Account;
pub use ledger::{LedgerError, LedgerStore, MemoryLedger, PgLedger, UnitOfWork};
pub use lock::{InProcessLockCoordinator, LockCoordinator, LockError, PgLockCoordinator};
pub use transfer::{
    Transaction, TransactionId, TransactionStatus, TransferEngine, TransferError,
    TransferQueryService, TransferRequest,
};
