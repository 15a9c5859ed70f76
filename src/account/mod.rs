//! Account model
//!
//! Accounts are provisioned outside this service and addressed by their
//! account number. The ledger store owns persistence.

pub mod demo;
pub mod models;

pub use demo::{DEMO_ACCOUNTS, DemoAccount};
pub use models::Account;
