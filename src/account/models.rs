//! Account data model

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::money;
use crate::transfer::TransferError;

/// Ledger account
///
/// `balance` is the only field the transfer engine mutates. `version` is the
/// value read from the store; the store bumps it when the account is saved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Account {
    /// Store-owned identifier
    pub id: i64,
    /// External identifier (10-50 chars, unique)
    pub account_number: String,
    pub account_holder: String,
    /// Scale 2, never negative once committed
    pub balance: Decimal,
    /// ISO 4217 code
    pub currency: String,
    /// Inactive accounts are invisible to the transfer path
    pub is_active: bool,
    /// Optimistic-concurrency counter
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Add `amount` to the balance
    pub fn credit(&mut self, amount: Decimal) -> Result<(), TransferError> {
        let balance = self
            .balance
            .checked_add(amount)
            .filter(|b| *b <= money::max_balance())
            .ok_or_else(|| {
                TransferError::SystemError(format!(
                    "Balance overflow on account {}",
                    self.account_number
                ))
            })?;
        self.set_balance(balance);
        Ok(())
    }

    /// Subtract `amount` from the balance, refusing to go below zero
    pub fn debit(&mut self, amount: Decimal) -> Result<(), TransferError> {
        if !self.has_minimum_balance(amount) {
            return Err(TransferError::insufficient_funds(
                self.account_number.clone(),
                amount,
                self.balance,
            ));
        }
        let balance = self.balance.checked_sub(amount).ok_or_else(|| {
            TransferError::SystemError(format!(
                "Balance underflow on account {}",
                self.account_number
            ))
        })?;
        self.set_balance(balance);
        Ok(())
    }

    /// Whether the balance covers `amount`
    pub fn has_minimum_balance(&self, amount: Decimal) -> bool {
        self.balance >= amount
    }

    fn set_balance(&mut self, mut balance: Decimal) {
        balance.rescale(money::SCALE);
        self.balance = balance;
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn account(balance: &str) -> Account {
        Account {
            id: 1,
            account_number: "ACC1000000001".to_string(),
            account_holder: "Aakash Patel".to_string(),
            balance: dec(balance),
            currency: "INR".to_string(),
            is_active: true,
            version: 1,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_credit_and_debit_are_exact() {
        let mut acc = account("10000.00");
        acc.debit(dec("100.50")).unwrap();
        assert_eq!(acc.balance.to_string(), "9899.50");

        acc.credit(dec("0.01")).unwrap();
        assert_eq!(acc.balance.to_string(), "9899.51");
    }

    #[test]
    fn test_debit_to_exactly_zero() {
        let mut acc = account("25.00");
        acc.debit(dec("25.00")).unwrap();
        assert_eq!(acc.balance, Decimal::ZERO);
        assert_eq!(acc.balance.to_string(), "0.00");
    }

    #[test]
    fn test_debit_refuses_overdraft() {
        let mut acc = account("0.00");
        let err = acc.debit(dec("100.00")).unwrap_err();
        match err {
            TransferError::InsufficientFunds {
                account,
                required,
                available,
            } => {
                assert_eq!(account, "ACC1000000001");
                assert_eq!(required.to_string(), "100.00");
                assert_eq!(available.to_string(), "0.00");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(acc.balance, Decimal::ZERO);
    }

    #[test]
    fn test_credit_refuses_column_overflow() {
        let mut acc = account("9999999999999.99");
        assert!(matches!(
            acc.credit(dec("0.01")),
            Err(TransferError::SystemError(_))
        ));
        assert_eq!(acc.balance, money::max_balance());
    }

    #[test]
    fn test_has_minimum_balance() {
        let acc = account("50.00");
        assert!(acc.has_minimum_balance(dec("50.00")));
        assert!(acc.has_minimum_balance(dec("49.99")));
        assert!(!acc.has_minimum_balance(dec("50.01")));
    }
}
