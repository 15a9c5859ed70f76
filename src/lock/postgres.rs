//! PostgreSQL lock coordinator
//!
//! Locks are rows of `lock_keys`. Acquisition is a single upsert that only
//! overwrites an expired row, so at most one holder wins per name. Runs on
//! the pool outside any ledger transaction.

use async_trait::async_trait;
use sqlx::PgPool;
use std::time::Duration;
use tokio::time::Instant;

use super::{LockCoordinator, LockError, LockHandle};
use crate::config::TransferConfig;

pub struct PgLockCoordinator {
    pool: PgPool,
    wait: Duration,
    retry_interval: Duration,
}

impl PgLockCoordinator {
    pub fn new(pool: PgPool, config: &TransferConfig) -> Self {
        Self {
            pool,
            wait: config.lock_wait(),
            retry_interval: config.lock_retry_interval(),
        }
    }

    async fn try_acquire(&self, handle: &LockHandle) -> Result<bool, LockError> {
        let result = sqlx::query(
            r#"
            INSERT INTO lock_keys (key_id, key_token, key_expiration)
            VALUES ($1, $2, NOW() + make_interval(secs => $3))
            ON CONFLICT (key_id) DO UPDATE
                SET key_token = EXCLUDED.key_token,
                    key_expiration = EXCLUDED.key_expiration
                WHERE lock_keys.key_expiration <= NOW()
            "#,
        )
        .bind(&handle.name)
        .bind(handle.token.to_string())
        .bind(handle.ttl.as_secs_f64())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl LockCoordinator for PgLockCoordinator {
    fn name(&self) -> &'static str {
        "postgres"
    }

    async fn acquire(&self, name: &str, ttl: Duration) -> Result<LockHandle, LockError> {
        let handle = LockHandle::new(name, ttl);
        let started = Instant::now();
        let deadline = started + self.wait;

        loop {
            if self.try_acquire(&handle).await? {
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
        sqlx::query("DELETE FROM lock_keys WHERE key_id = $1 AND key_token = $2")
            .bind(&handle.name)
            .bind(handle.token.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
