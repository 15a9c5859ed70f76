//! Account-to-account transfers
//!
//! # Flow
//!
//! ```text
//! request ─► TransferEngine ─► LockCoordinator (both accounts, sorted)
//!                 │
//!                 ▼
//!            LedgerStore unit of work: lock rows → check → debit/credit
//!                 │                     → save accounts + COMPLETED record
//!                 ▼
//!            commit ─► release locks
//! ```
//!
//! # Transaction states
//!
//! ```text
//! PENDING ──► COMPLETED
//!    └──────► FAILED
//! REVERSED (reserved, never produced)
//! ```
//!
//! # Invariants
//!
//! 1. **Conservation**: a completed transfer changes the sum of both balances by zero
//! 2. **Non-negative**: no committed balance is ever below zero
//! 3. **Deadlock-free**: account locks are always taken in ascending order
//! 4. **Audited**: every attempt that got as far as building a record ends
//!    with a terminal record in the store

pub mod engine;
pub mod error;
pub mod query;
pub mod state;
pub mod types;


pub use engine::TransferEngine;
pub use error::TransferError;
pub use query::{DEFAULT_HISTORY_LIMIT, MAX_HISTORY_LIMIT, TransferQueryService};
pub use state::TransactionStatus;
pub use types::{Direction, MAX_DESCRIPTION_LEN, Transaction, TransactionId, TransferRequest};
