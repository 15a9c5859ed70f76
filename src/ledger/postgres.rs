//! PostgreSQL Ledger Store
//!
//! One unit of work is one database transaction. Row locks are
//! `SELECT ... FOR UPDATE`; the version check is a compare-and-swap in the
//! `UPDATE` predicate. `statement_timeout` and `lock_timeout` are set locally
//! so no wait inside the transaction outlives its deadline.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row};
use std::time::Duration;

use super::{LedgerError, LedgerStore, UnitOfWork};
use crate::account::Account;
use crate::transfer::{Transaction, TransactionId, TransactionStatus};

const ACCOUNT_COLUMNS: &str = "id, account_number, account_holder, balance, currency, \
     is_active, version, created_at, updated_at";

const TRANSACTION_SELECT: &str = r#"
    SELECT t.transaction_id, t.from_account_id, fa.account_number AS from_account,
           t.to_account_id, ta.account_number AS to_account, t.amount, t.currency,
           t.status, t.description, t.failure_reason, t.created_at, t.completed_at
    FROM transactions t
    JOIN accounts fa ON fa.id = t.from_account_id
    JOIN accounts ta ON ta.id = t.to_account_id
"#;

/// PostgreSQL ledger backend
#[derive(Clone)]
pub struct PgLedger {
    pool: PgPool,
}

impl PgLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LedgerStore for PgLedger {
    fn name(&self) -> &'static str {
        "postgres"
    }

    async fn begin(&self, timeout: Duration) -> Result<Box<dyn UnitOfWork>, LedgerError> {
        let mut tx = self.pool.begin().await?;

        // set_config(.., true) is SET LOCAL: reverts at commit/rollback
        let millis = format!("{}ms", timeout.as_millis().max(1));
        sqlx::query(
            "SELECT set_config('statement_timeout', $1, true), set_config('lock_timeout', $1, true)",
        )
        .bind(&millis)
        .execute(&mut *tx)
        .await?;

        Ok(Box::new(PgUnitOfWork { tx }))
    }

    async fn find_account(&self, account_number: &str) -> Result<Option<Account>, LedgerError> {
        let sql = format!(
            "SELECT {} FROM accounts WHERE account_number = $1",
            ACCOUNT_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(account_number)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_account).transpose()
    }

    async fn find_transaction(
        &self,
        transaction_id: &TransactionId,
    ) -> Result<Option<Transaction>, LedgerError> {
        let sql = format!("{} WHERE t.transaction_id = $1", TRANSACTION_SELECT);
        let row = sqlx::query(&sql)
            .bind(transaction_id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_transaction).transpose()
    }

    async fn find_transactions_for_account(
        &self,
        account_number: &str,
        limit: usize,
    ) -> Result<Vec<Transaction>, LedgerError> {
        let sql = format!(
            "{} WHERE fa.account_number = $1 OR ta.account_number = $1 \
             ORDER BY t.created_at DESC, t.id DESC LIMIT $2",
            TRANSACTION_SELECT
        );
        let rows = sqlx::query(&sql)
            .bind(account_number)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_transaction).collect()
    }

    async fn health_check(&self) -> Result<(), LedgerError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Unit of work backed by one PostgreSQL transaction
pub struct PgUnitOfWork {
    tx: sqlx::Transaction<'static, Postgres>,
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn lock_active_account(
        &mut self,
        account_number: &str,
    ) -> Result<Option<Account>, LedgerError> {
        let sql = format!(
            "SELECT {} FROM accounts WHERE account_number = $1 AND is_active = TRUE FOR UPDATE",
            ACCOUNT_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(account_number)
            .fetch_optional(&mut *self.tx)
            .await?;
        row.as_ref().map(row_to_account).transpose()
    }

    async fn save_account(&mut self, account: &Account) -> Result<(), LedgerError> {
        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET balance = $1, updated_at = $2, version = version + 1
            WHERE account_number = $3 AND version = $4
            "#,
        )
        .bind(account.balance)
        .bind(account.updated_at)
        .bind(&account.account_number)
        .bind(account.version)
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() > 0 {
            return Ok(());
        }

        let found: Option<i64> =
            sqlx::query_scalar("SELECT version FROM accounts WHERE account_number = $1")
                .bind(&account.account_number)
                .fetch_optional(&mut *self.tx)
                .await?;

        match found {
            Some(found) => Err(LedgerError::VersionConflict {
                account: account.account_number.clone(),
                expected: account.version,
                found,
            }),
            None => Err(LedgerError::Database(format!(
                "account {} does not exist",
                account.account_number
            ))),
        }
    }

    async fn save_transaction(&mut self, transaction: &Transaction) -> Result<(), LedgerError> {
        sqlx::query(
            r#"
            INSERT INTO transactions
                (transaction_id, from_account_id, to_account_id, amount, currency, status,
                 description, failure_reason, created_at, completed_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(transaction.transaction_id.to_string())
        .bind(transaction.from_account_id)
        .bind(transaction.to_account_id)
        .bind(transaction.amount)
        .bind(&transaction.currency)
        .bind(transaction.status.as_str())
        .bind(&transaction.description)
        .bind(&transaction.failure_reason)
        .bind(transaction.created_at)
        .bind(transaction.completed_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), LedgerError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), LedgerError> {
        self.tx.rollback().await?;
        Ok(())
    }
}

fn row_to_account(row: &PgRow) -> Result<Account, LedgerError> {
    Ok(Account {
        id: row.try_get("id")?,
        account_number: row.try_get("account_number")?,
        account_holder: row.try_get("account_holder")?,
        balance: row.try_get("balance")?,
        currency: row.try_get("currency")?,
        is_active: row.try_get("is_active")?,
        version: row.try_get("version")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn row_to_transaction(row: &PgRow) -> Result<Transaction, LedgerError> {
    let id_text: String = row.try_get("transaction_id")?;
    let transaction_id: TransactionId = id_text
        .parse()
        .map_err(|_| LedgerError::Corrupted(format!("invalid transaction_id: {}", id_text)))?;

    let status_text: String = row.try_get("status")?;
    let status: TransactionStatus = status_text.parse().map_err(LedgerError::Corrupted)?;

    Ok(Transaction {
        transaction_id,
        from_account_id: row.try_get("from_account_id")?,
        from_account: row.try_get("from_account")?,
        to_account_id: row.try_get("to_account_id")?,
        to_account: row.try_get("to_account")?,
        amount: row.try_get("amount")?,
        currency: row.try_get("currency")?,
        status,
        description: row.try_get("description")?,
        failure_reason: row.try_get("failure_reason")?,
        created_at: row.try_get("created_at")?,
        completed_at: row.try_get("completed_at")?,
    })
}
