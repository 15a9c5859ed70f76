//! Database connection management

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

const SCHEMA_SQL: &str = include_str!("../../migrations/001_create_ledger_tables.sql");
const SEED_SQL: &str = include_str!("../../migrations/002_seed_demo_accounts.sql");

/// PostgreSQL database connection pool
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool
    pub async fn connect(database_url: &str) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(50)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await?;

        tracing::info!("PostgreSQL connection pool established");
        Ok(Self { pool })
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check database health
    pub async fn health_check(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Create ledger tables and indexes if missing
    pub async fn init_schema(&self) -> Result<(), sqlx::Error> {
        sqlx::raw_sql(SCHEMA_SQL).execute(&self.pool).await?;
        tracing::info!("Ledger schema ready");
        Ok(())
    }

    /// Insert the demo accounts, leaving existing ones untouched
    pub async fn seed_demo_accounts(&self) -> Result<(), sqlx::Error> {
        let result = sqlx::raw_sql(SEED_SQL).execute(&self.pool).await?;
        tracing::info!(inserted = result.rows_affected(), "Demo accounts seeded");
        Ok(())
    }
}
