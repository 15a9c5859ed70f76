//! Transfer engine over the PostgreSQL ledger and lock table.
//!
//! Run with `DATABASE_URL=... cargo test --test postgres_engine -- --ignored`.

use std::str::FromStr;
use std::sync::Arc;

use futures::future::join_all;
use rust_decimal::Decimal;

use fund_transfer::config::TransferConfig;
use fund_transfer::db::Database;
use fund_transfer::ledger::{LedgerStore, PgLedger};
use fund_transfer::lock::PgLockCoordinator;
use fund_transfer::transfer::{
    TransactionStatus, TransferEngine, TransferError, TransferQueryService, TransferRequest,
};

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

struct PgHarness {
    db: Database,
    engine: Arc<TransferEngine>,
    ledger: Arc<PgLedger>,
}

impl PgHarness {
    async fn new() -> Self {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let db = Database::connect(&url).await.expect("Failed to connect");
        db.init_schema().await.expect("Failed to create schema");

        let config = TransferConfig::default();
        let ledger = Arc::new(PgLedger::new(db.pool().clone()));
        let locks = Arc::new(PgLockCoordinator::new(db.pool().clone(), &config));
        let engine = Arc::new(TransferEngine::new(ledger.clone(), locks, config));
        Self { db, engine, ledger }
    }

    /// Account number of the maximum accepted length (50 chars)
    fn long_number() -> String {
        let number = format!("PG{}{}", uuid::Uuid::new_v4().simple(), "0".repeat(16));
        assert_eq!(number.len(), 50);
        number
    }

    async fn open(&self, balance: &str) -> String {
        let number = Self::long_number();
        sqlx::query(
            "INSERT INTO accounts (account_number, account_holder, balance, currency) \
             VALUES ($1, 'Test Holder', $2, 'INR')",
        )
        .bind(&number)
        .bind(dec(balance))
        .execute(self.db.pool())
        .await
        .unwrap();
        number
    }

    async fn balance(&self, number: &str) -> Decimal {
        self.ledger.find_account(number).await.unwrap().unwrap().balance
    }
}

#[tokio::test]
#[ignore = "requires PostgreSQL database"]
async fn test_pg_transfer_between_long_account_numbers() {
    let h = PgHarness::new().await;
    let from = h.open("10000.00").await;
    let to = h.open("5000.00").await;

    let tx = h
        .engine
        .transfer(TransferRequest::new(&from, &to, dec("100.50")))
        .await
        .unwrap();
    assert_eq!(tx.status, TransactionStatus::Completed);
    assert_eq!(h.balance(&from).await, dec("9899.50"));
    assert_eq!(h.balance(&to).await, dec("5100.50"));

    let query = TransferQueryService::new(h.ledger.clone());
    let stored = query
        .get_transaction(&tx.transaction_id.to_string())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, TransactionStatus::Completed);
    assert_eq!(stored.amount.to_string(), "100.50");
}

#[tokio::test]
#[ignore = "requires PostgreSQL database"]
async fn test_pg_missing_long_account_is_not_found() {
    let h = PgHarness::new().await;
    let from = h.open("10.00").await;
    let missing = PgHarness::long_number();

    let err = h
        .engine
        .transfer(TransferRequest::new(&from, &missing, dec("1.00")))
        .await
        .unwrap_err();
    assert!(matches!(err, TransferError::AccountNotFound(ref n) if *n == missing));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore = "requires PostgreSQL database"]
async fn test_pg_no_double_spend() {
    const ATTEMPTS: usize = 10;
    const AFFORDABLE: usize = 4;
    let h = PgHarness::new().await;
    let from = h.open("100.00").await;
    let to = h.open("0.00").await;

    let handles = (0..ATTEMPTS).map(|_| {
        let engine = h.engine.clone();
        let req = TransferRequest::new(&from, &to, dec("25.00"));
        tokio::spawn(async move { engine.transfer(req).await })
    });
    let results: Vec<_> = join_all(handles)
        .await
        .into_iter()
        .map(|r| r.unwrap())
        .collect();

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), AFFORDABLE);
    assert_eq!(
        results
            .iter()
            .filter(|r| matches!(r, Err(TransferError::InsufficientFunds { .. })))
            .count(),
        ATTEMPTS - AFFORDABLE
    );
    assert_eq!(h.balance(&from).await, Decimal::ZERO);
    assert_eq!(h.balance(&to).await, dec("100.00"));

    let history = h
        .ledger
        .find_transactions_for_account(&from, 100)
        .await
        .unwrap();
    assert_eq!(history.len(), AFFORDABLE);
}
