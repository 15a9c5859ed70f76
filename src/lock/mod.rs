//! Lock Coordinator
//!
//! Named, time-bounded mutual exclusion across every engine instance that
//! shares a backend. A transfer holds one lock per account, named
//! `account_transfer_{account_number}`, taken in sorted order so that two
//! transfers over the same pair can never wait on each other in a cycle.
//!
//! A lock that is never released expires after its TTL and may then be taken
//! by another holder.

pub mod memory;
pub mod postgres;

pub use memory::InProcessLockCoordinator;
pub use postgres::PgLockCoordinator;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

/// Prefix of every account lock name
pub const ACCOUNT_LOCK_PREFIX: &str = "account_transfer_";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LockError {
    /// Still held by someone else when the wait budget ran out
    #[error("Lock {key} unavailable after {waited_ms} ms")]
    Unavailable { key: String, waited_ms: u64 },

    #[error("Lock backend error: {0}")]
    Backend(String),
}

impl From<sqlx::Error> for LockError {
    fn from(e: sqlx::Error) -> Self {
        LockError::Backend(e.to_string())
    }
}

/// Proof of ownership of one named lock
///
/// The token makes release a no-op for anyone but the current holder, so a
/// holder whose TTL lapsed cannot free a lock someone else now owns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockHandle {
    pub name: String,
    pub token: Uuid,
    pub ttl: Duration,
}

impl LockHandle {
    pub fn new(name: impl Into<String>, ttl: Duration) -> Self {
        Self {
            name: name.into(),
            token: Uuid::new_v4(),
            ttl,
        }
    }
}

#[async_trait]
pub trait LockCoordinator: Send + Sync {
    /// Backend name for logging
    fn name(&self) -> &'static str;

    /// Wait (bounded) until `name` is free or expired, then own it for `ttl`
    async fn acquire(&self, name: &str, ttl: Duration) -> Result<LockHandle, LockError>;

    /// Release a lock; releasing one already gone is not an error
    async fn release(&self, handle: &LockHandle) -> Result<(), LockError>;
}

pub fn lock_name(account_number: &str) -> String {
    format!("{}{}", ACCOUNT_LOCK_PREFIX, account_number)
}

/// Acquire the account locks for `accounts` in ascending account order
///
/// Duplicates are locked once. If any acquisition fails, the locks already
/// taken are released before returning, and an `Unavailable` error names the
/// account (not the lock).
pub async fn acquire_ordered(
    coordinator: &dyn LockCoordinator,
    accounts: &[&str],
    ttl: Duration,
) -> Result<Vec<LockHandle>, LockError> {
    let mut ordered: Vec<&str> = accounts.to_vec();
    ordered.sort_unstable();
    ordered.dedup();

    let mut held = Vec::with_capacity(ordered.len());
    for account in ordered {
        match coordinator.acquire(&lock_name(account), ttl).await {
            Ok(handle) => {
                debug!(lock = %handle.name, "lock acquired");
                held.push(handle);
            }
            Err(e) => {
                release_all(coordinator, &held).await;
                return Err(match e {
                    LockError::Unavailable { waited_ms, .. } => LockError::Unavailable {
                        key: account.to_string(),
                        waited_ms,
                    },
                    other => other,
                });
            }
        }
    }
    Ok(held)
}

/// Release `handles` in reverse acquisition order
///
/// Failures are logged and skipped: the TTL reclaims anything left behind.
pub async fn release_all(coordinator: &dyn LockCoordinator, handles: &[LockHandle]) {
    for handle in handles.iter().rev() {
        match coordinator.release(handle).await {
            Ok(()) => debug!(lock = %handle.name, "lock released"),
            Err(e) => warn!(lock = %handle.name, error = %e, "lock release failed"),
        }
    }
}
