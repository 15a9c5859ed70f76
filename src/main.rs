//! Fund Transfer service
//!
//! ```text
//! ┌──────────┐    ┌──────────┐    ┌──────────────┐    ┌──────────┐
//! │  Config  │───▶│ Gateway  │───▶│TransferEngine│───▶│  Ledger  │
//! │  (YAML)  │    │  (HTTP)  │    │ (lock+UoW)   │    │(PG / mem)│
//! └──────────┘    └──────────┘    └──────────────┘    └──────────┘
//! ```
//!
//! Usage: `fund_transfer [--env dev|prod] [--port 8080]`

use std::sync::Arc;

use anyhow::Context;

use fund_transfer::config::AppConfig;
use fund_transfer::db::Database;
use fund_transfer::gateway::{self, AppState};
use fund_transfer::ledger::{LedgerStore, MemoryLedger, PgLedger};
use fund_transfer::lock::{InProcessLockCoordinator, LockCoordinator, PgLockCoordinator};

fn arg_value(names: &[&str]) -> Option<String> {
    let args: Vec<String> = std::env::args().collect();
    args.iter()
        .position(|a| names.contains(&a.as_str()))
        .and_then(|i| args.get(i + 1).cloned())
}

fn get_env() -> String {
    arg_value(&["--env", "-e"]).unwrap_or_else(|| "dev".to_string())
}

/// Get port override from command line (--port argument)
fn get_port_override() -> Option<u16> {
    arg_value(&["--port"]).and_then(|p| p.parse().ok())
}

async fn build_state(config: &AppConfig) -> anyhow::Result<AppState> {
    let (ledger, locks): (Arc<dyn LedgerStore>, Arc<dyn LockCoordinator>) =
        match &config.postgres_url {
            Some(url) => {
                let db = Database::connect(url)
                    .await
                    .context("Failed to connect to PostgreSQL")?;
                db.init_schema().await.context("Failed to create schema")?;
                if config.seed_demo_accounts {
                    db.seed_demo_accounts()
                        .await
                        .context("Failed to seed demo accounts")?;
                    tracing::info!("Demo accounts seeded");
                }
                tracing::info!("Using PostgreSQL ledger and lock table");
                (
                    Arc::new(PgLedger::new(db.pool().clone())),
                    Arc::new(PgLockCoordinator::new(db.pool().clone(), &config.transfer)),
                )
            }
            None => {
                tracing::warn!(
                    "postgres_url not set: using in-memory ledger and in-process locks, nothing is persisted"
                );
                let ledger = MemoryLedger::new();
                if config.seed_demo_accounts {
                    let opened = ledger
                        .seed_demo_accounts()
                        .await
                        .context("Failed to seed demo accounts")?;
                    tracing::info!(opened, "Demo accounts seeded");
                }
                (
                    Arc::new(ledger),
                    Arc::new(InProcessLockCoordinator::from_config(&config.transfer)),
                )
            }
        };

    Ok(AppState::new(ledger, locks, config.transfer.clone()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = get_env();
    let mut app_config = AppConfig::load(&env)?;
    let _log_guard = fund_transfer::logging::init_logging(&app_config);

    if let Some(port) = get_port_override() {
        app_config.gateway.port = port;
    }

    tracing::info!(
        env = %env,
        lock_ttl_secs = app_config.transfer.lock_ttl_secs,
        lock_wait_ms = app_config.transfer.lock_wait_ms,
        tx_timeout_ms = app_config.transfer.tx_timeout_ms,
        "Starting fund transfer service"
    );

    let state = Arc::new(build_state(&app_config).await?);
    gateway::run_server(&app_config.gateway.host, app_config.gateway.port, state).await
}
