//! Transaction Status Definitions
//!
//! ```text
//! PENDING ──▶ COMPLETED
//!    │
//!    └──────▶ FAILED
//!
//! REVERSED: reserved for compensating transfers, never produced by the engine
//! ```
//!
//! Status strings match the `transactions.status` column.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle status of a [`Transaction`](super::types::Transaction)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    /// Built by the engine, in memory only until the unit of work concludes
    Pending,

    /// Terminal: both balances moved and the record committed
    Completed,

    /// Terminal: the attempt failed after the record was created
    Failed,

    /// Terminal: undone by a compensating transfer (reserved)
    Reversed,
}

impl TransactionStatus {
    /// Check if this is a terminal state (no more transitions possible)
    #[inline]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TransactionStatus::Pending)
    }

    /// Get the stored status name
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Completed => "completed",
            TransactionStatus::Failed => "failed",
            TransactionStatus::Reversed => "reversed",
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TransactionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TransactionStatus::Pending),
            "completed" => Ok(TransactionStatus::Completed),
            "failed" => Ok(TransactionStatus::Failed),
            "reversed" => Ok(TransactionStatus::Reversed),
            other => Err(format!("unknown transaction status: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(TransactionStatus::Completed.is_terminal());
        assert!(TransactionStatus::Failed.is_terminal());
        assert!(TransactionStatus::Reversed.is_terminal());

        assert!(!TransactionStatus::Pending.is_terminal());
    }

    #[test]
    fn test_parse_stored_names() {
        assert_eq!(
            "completed".parse::<TransactionStatus>(),
            Ok(TransactionStatus::Completed)
        );
        assert_eq!(
            "reversed".parse::<TransactionStatus>(),
            Ok(TransactionStatus::Reversed)
        );
        assert!("COMPLETED".parse::<TransactionStatus>().is_err());
        assert!("unknown".parse::<TransactionStatus>().is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(TransactionStatus::Pending.to_string(), "pending");
        assert_eq!(TransactionStatus::Failed.to_string(), "failed");
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&TransactionStatus::Completed).unwrap();
        assert_eq!(json, "\"completed\"");
    }
}
