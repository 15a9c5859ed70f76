//! Transfer Core Types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use super::error::TransferError;
use super::state::TransactionStatus;
use crate::account::Account;
use crate::money;

/// Maximum length of a transfer description
pub const MAX_DESCRIPTION_LEN: usize = 500;

/// Transaction ID - random UUID (v4)
///
/// Non-sequential so ids reveal nothing about volume or ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct TransactionId(uuid::Uuid);

impl TransactionId {
    /// Generate a new unique TransactionId
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<uuid::Uuid> for TransactionId {
    fn from(id: uuid::Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for TransactionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(uuid::Uuid::parse_str(s)?))
    }
}

/// Transfer request accepted by the engine
#[derive(Debug, Clone)]
pub struct TransferRequest {
    pub from_account: String,
    pub to_account: String,
    pub amount: Decimal,
    pub description: Option<String>,
}

impl TransferRequest {
    pub fn new(
        from_account: impl Into<String>,
        to_account: impl Into<String>,
        amount: Decimal,
    ) -> Self {
        Self {
            from_account: from_account.into(),
            to_account: to_account.into(),
            amount,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Side of a transaction as seen from one account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Debit,
    Credit,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Debit => "debit",
            Direction::Credit => "credit",
        }
    }
}

/// Audit record of one transfer attempt
///
/// References both accounts by store id and account number; it does not own
/// them. Once terminal, no field changes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    pub transaction_id: TransactionId,
    pub from_account_id: i64,
    pub from_account: String,
    pub to_account_id: i64,
    pub to_account: String,
    /// Scale 2, strictly positive
    pub amount: Decimal,
    /// Copied from the accounts at creation
    pub currency: String,
    pub status: TransactionStatus,
    pub description: Option<String>,
    /// Set only when `status == Failed`
    pub failure_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Set exactly once, on the terminal transition
    pub completed_at: Option<DateTime<Utc>>,
}

impl Transaction {
    /// Create a new pending transaction between two loaded accounts
    pub fn new(from: &Account, to: &Account, amount: Decimal, description: Option<String>) -> Self {
        let mut amount = amount;
        amount.rescale(money::SCALE);

        Self {
            transaction_id: TransactionId::new(),
            from_account_id: from.id,
            from_account: from.account_number.clone(),
            to_account_id: to.id,
            to_account: to.account_number.clone(),
            amount,
            currency: from.currency.clone(),
            status: TransactionStatus::Pending,
            description,
            failure_reason: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// PENDING → COMPLETED
    pub fn mark_completed(&mut self) -> Result<(), TransferError> {
        self.transition(TransactionStatus::Completed)?;
        Ok(())
    }

    /// PENDING → FAILED, recording why
    pub fn mark_failed(&mut self, reason: impl Into<String>) -> Result<(), TransferError> {
        self.transition(TransactionStatus::Failed)?;
        self.failure_reason = Some(reason.into());
        Ok(())
    }

    fn transition(&mut self, to: TransactionStatus) -> Result<(), TransferError> {
        if self.status != TransactionStatus::Pending {
            return Err(TransferError::InvalidStateTransition(format!(
                "transaction {} is {}, cannot become {}",
                self.transaction_id, self.status, to
            )));
        }
        self.status = to;
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    /// Classify this transaction for `account_number`
    pub fn direction_for(&self, account_number: &str) -> Direction {
        if self.from_account == account_number {
            Direction::Debit
        } else {
            Direction::Credit
        }
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Transaction[{}] {} -> {} amount={} {} status={}",
            self.transaction_id,
            self.from_account,
            self.to_account,
            money::format_amount(self.amount),
            self.currency,
            self.status
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(id: i64, number: &str) -> Account {
        Account {
            id,
            account_number: number.to_string(),
            account_holder: "Holder".to_string(),
            balance: Decimal::new(1_000_000, 2),
            currency: "INR".to_string(),
            is_active: true,
            version: 1,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn pending() -> Transaction {
        let from = account(1, "ACC1000000001");
        let to = account(2, "ACC1000000002");
        Transaction::new(&from, &to, Decimal::new(10050, 2), Some("rent".into()))
    }

    #[test]
    fn test_transaction_new() {
        let tx = pending();
        assert_eq!(tx.status, TransactionStatus::Pending);
        assert_eq!(tx.from_account, "ACC1000000001");
        assert_eq!(tx.to_account_id, 2);
        assert_eq!(tx.currency, "INR");
        assert_eq!(tx.amount.to_string(), "100.50");
        assert!(tx.completed_at.is_none());
        assert!(tx.failure_reason.is_none());
    }

    #[test]
    fn test_transaction_ids_are_unique() {
        assert_ne!(pending().transaction_id, pending().transaction_id);
    }

    #[test]
    fn test_transaction_id_roundtrip_text() {
        let id = TransactionId::new();
        let text = id.to_string();
        assert_eq!(text.len(), 36);
        assert_eq!(text.parse::<TransactionId>().unwrap(), id);
        assert!("not-a-uuid".parse::<TransactionId>().is_err());
    }

    #[test]
    fn test_mark_completed_sets_completed_at() {
        let mut tx = pending();
        tx.mark_completed().unwrap();
        assert_eq!(tx.status, TransactionStatus::Completed);
        assert!(tx.completed_at.is_some());
        assert!(tx.failure_reason.is_none());
    }

    #[test]
    fn test_mark_failed_records_reason() {
        let mut tx = pending();
        tx.mark_failed("disk full").unwrap();
        assert_eq!(tx.status, TransactionStatus::Failed);
        assert_eq!(tx.failure_reason.as_deref(), Some("disk full"));
        assert!(tx.completed_at.is_some());
    }

    #[test]
    fn test_terminal_transaction_is_frozen() {
        let mut tx = pending();
        tx.mark_completed().unwrap();
        let snapshot = tx.clone();

        assert!(matches!(
            tx.mark_failed("late"),
            Err(TransferError::InvalidStateTransition(_))
        ));
        assert!(matches!(
            tx.mark_completed(),
            Err(TransferError::InvalidStateTransition(_))
        ));
        assert_eq!(tx, snapshot);
    }

    #[test]
    fn test_direction_for() {
        let tx = pending();
        assert_eq!(tx.direction_for("ACC1000000001"), Direction::Debit);
        assert_eq!(tx.direction_for("ACC1000000002"), Direction::Credit);
        assert_eq!(Direction::Debit.as_str(), "debit");
    }
}
