//! In-process lock coordinator
//!
//! A `DashMap` of lock name to (token, expiry). Acquisition polls until the
//! entry is absent or expired, bounded by the configured wait.

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::time::Duration;
use tokio::time::Instant;

use super::{LockCoordinator, LockError, LockHandle};
use crate::config::TransferConfig;

#[derive(Debug, Clone, Copy)]
struct Held {
    token: uuid::Uuid,
    expires_at: Instant,
}

/// Lock coordinator for a single process
pub struct InProcessLockCoordinator {
    entries: DashMap<String, Held>,
    wait: Duration,
    retry_interval: Duration,
}

impl InProcessLockCoordinator {
    pub fn new(wait: Duration, retry_interval: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            wait,
            retry_interval: retry_interval.max(Duration::from_millis(1)),
        }
    }

    pub fn from_config(config: &TransferConfig) -> Self {
        Self::new(config.lock_wait(), config.lock_retry_interval())
    }

    /// Whether `name` is currently held and unexpired
    pub fn is_held(&self, name: &str) -> bool {
        self.entries
            .get(name)
            .is_some_and(|held| held.expires_at > Instant::now())
    }

    fn try_acquire(&self, name: &str, ttl: Duration) -> Option<LockHandle> {
        let now = Instant::now();
        let handle = LockHandle::new(name, ttl);
        let held = Held {
            token: handle.token,
            expires_at: now + ttl,
        };

        match self.entries.entry(name.to_string()) {
            Entry::Vacant(v) => {
                v.insert(held);
                Some(handle)
            }
            Entry::Occupied(mut o) if o.get().expires_at <= now => {
                tracing::warn!(lock = %name, "taking over expired lock");
                o.insert(held);
                Some(handle)
            }
            Entry::Occupied(_) => None,
        }
    }
}

impl Default for InProcessLockCoordinator {
    fn default() -> Self {
        Self::from_config(&TransferConfig::default())
    }
}

#[async_trait]
impl LockCoordinator for InProcessLockCoordinator {
    fn name(&self) -> &'static str {
        "in-process"
    }

    async fn acquire(&self, name: &str, ttl: Duration) -> Result<LockHandle, LockError> {
        let started = Instant::now();
        let deadline = started + self.wait;

        loop {
            if let Some(handle) = self.try_acquire(name, ttl) {
                return Ok(handle);
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(LockError::Unavailable {
                    key: name.to_string(),
                    waited_ms: now.duration_since(started).as_millis() as u64,
                });
            }
            tokio::time::sleep(self.retry_interval.min(deadline - now)).await;
        }
    }

    async fn release(&self, handle: &LockHandle) -> Result<(), LockError> {
        self.entries
            .remove_if(&handle.name, |_, held| held.token == handle.token);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn coordinator(wait_ms: u64) -> InProcessLockCoordinator {
        InProcessLockCoordinator::new(Duration::from_millis(wait_ms), Duration::from_millis(2))
    }

    #[tokio::test]
    async fn test_acquire_and_release() {
        let locks = coordinator(50);
        let handle = locks.acquire("a", Duration::from_secs(30)).await.unwrap();
        assert!(locks.is_held("a"));

        locks.release(&handle).await.unwrap();
        assert!(!locks.is_held("a"));
    }

    #[tokio::test]
    async fn test_held_lock_times_out() {
        let locks = coordinator(30);
        let _held = locks.acquire("a", Duration::from_secs(30)).await.unwrap();

        let err = locks.acquire("a", Duration::from_secs(30)).await.unwrap_err();
        match err {
            LockError::Unavailable { key, waited_ms } => {
                assert_eq!(key, "a");
                assert!(waited_ms >= 30);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        // Different names never contend
        assert!(locks.acquire("b", Duration::from_secs(30)).await.is_ok());
    }

    #[tokio::test]
    async fn test_waiter_gets_lock_after_release() {
        let locks = Arc::new(coordinator(2_000));
        let first = locks.acquire("a", Duration::from_secs(30)).await.unwrap();

        let waiter = {
            let locks = locks.clone();
            tokio::spawn(async move { locks.acquire("a", Duration::from_secs(30)).await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        locks.release(&first).await.unwrap();

        let second = waiter.await.unwrap().unwrap();
        assert_ne!(second.token, first.token);
    }

    #[tokio::test]
    async fn test_expired_lock_can_be_taken_over() {
        let locks = coordinator(500);
        let stale = locks.acquire("a", Duration::from_millis(20)).await.unwrap();

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(!locks.is_held("a"));
        let fresh = locks.acquire("a", Duration::from_secs(30)).await.unwrap();

        // The lapsed holder's release must not free the new owner's lock
        locks.release(&stale).await.unwrap();
        assert!(locks.is_held("a"));

        locks.release(&fresh).await.unwrap();
        assert!(!locks.is_held("a"));
    }

    #[tokio::test]
    async fn test_release_is_idempotent() {
        let locks = coordinator(50);
        let handle = locks.acquire("a", Duration::from_secs(30)).await.unwrap();
        locks.release(&handle).await.unwrap();
        locks.release(&handle).await.unwrap();
        assert!(!locks.is_held("a"));
    }
}
