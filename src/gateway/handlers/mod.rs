//! HTTP handlers

pub mod health;
pub mod transfer;

pub use health::health_check;
pub use transfer::{create_transfer, get_account_transfers, get_transfer};
