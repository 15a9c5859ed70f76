use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::time::Duration;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub log_dir: String,
    pub log_file: String,
    pub use_json: bool,
    pub rotation: String,
    pub gateway: GatewayConfig,
    /// PostgreSQL connection URL. In-memory ledger and locks are used when absent.
    #[serde(default)]
    pub postgres_url: Option<String>,
    /// Open the demo accounts at startup (existing ones are left untouched)
    #[serde(default)]
    pub seed_demo_accounts: bool,
    #[serde(default)]
    pub transfer: TransferConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
}

/// Transfer engine tuning
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct TransferConfig {
    /// Auto-expiry of an account lock held by a crashed holder
    pub lock_ttl_secs: u64,
    /// Upper bound on waiting for a held account lock
    pub lock_wait_ms: u64,
    /// Poll interval while waiting for a held account lock
    pub lock_retry_interval_ms: u64,
    /// Upper bound on one unit of work against the ledger store
    pub tx_timeout_ms: u64,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            lock_ttl_secs: 30,
            lock_wait_ms: 5_000,
            lock_retry_interval_ms: 10,
            tx_timeout_ms: 10_000,
        }
    }
}

impl TransferConfig {
    pub fn lock_ttl(&self) -> Duration {
        Duration::from_secs(self.lock_ttl_secs)
    }

    pub fn lock_wait(&self) -> Duration {
        Duration::from_millis(self.lock_wait_ms)
    }

    pub fn lock_retry_interval(&self) -> Duration {
        Duration::from_millis(self.lock_retry_interval_ms.max(1))
    }

    pub fn tx_timeout(&self) -> Duration {
        Duration::from_millis(self.tx_timeout_ms)
    }

    /// A held account lock must outlive the longest transfer: the lock wait
    /// plus the transfer's unit of work plus the failure-record unit of work.
    pub fn validate(&self) -> anyhow::Result<()> {
        let longest = self.lock_wait() + self.tx_timeout() * 2;
        if longest >= self.lock_ttl() {
            anyhow::bail!(
                "transfer.lock_ttl_secs ({}s) must exceed lock_wait_ms + 2 * tx_timeout_ms ({}ms)",
                self.lock_ttl_secs,
                longest.as_millis()
            );
        }
        Ok(())
    }
}

impl AppConfig {
    pub fn load(env: &str) -> anyhow::Result<Self> {
        let config_path = format!("config/{}.yaml", env);
        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path))?;
        Self::from_yaml(&content).with_context(|| format!("Failed to parse {}", config_path))
    }

    pub fn from_yaml(content: &str) -> anyhow::Result<Self> {
        let config: Self = serde_yaml::from_str(content)?;
        config.transfer.validate()?;
        Ok(config)
    }
}
