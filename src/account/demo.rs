//! Demo accounts for local runs and tests
//!
//! Mirrors `migrations/002_seed_demo_accounts.sql`.

use rust_decimal::Decimal;

#[derive(Debug, Clone, Copy)]
pub struct DemoAccount {
    pub account_number: &'static str,
    pub account_holder: &'static str,
    /// Opening balance in minor units
    pub balance_minor: i64,
    pub currency: &'static str,
}

impl DemoAccount {
    pub fn balance(&self) -> Decimal {
        Decimal::new(self.balance_minor, 2)
    }
}

pub const DEMO_ACCOUNTS: [DemoAccount; 5] = [
    DemoAccount {
        account_number: "ACC1000000001",
        account_holder: "Aakash Patel",
        balance_minor: 1_000_000,
        currency: "INR",
    },
    DemoAccount {
        account_number: "ACC1000000002",
        account_holder: "Ashish Bhatt",
        balance_minor: 500_000,
        currency: "INR",
    },
    DemoAccount {
        account_number: "ACC1000000003",
        account_holder: "Bhavin Garg",
        balance_minor: 1_500_050,
        currency: "INR",
    },
    DemoAccount {
        account_number: "ACC1000000004",
        account_holder: "Divyesh Mehta",
        balance_minor: 750_000,
        currency: "INR",
    },
    DemoAccount {
        account_number: "ACC1000000005",
        account_holder: "Gaurav Shah",
        balance_minor: 0,
        currency: "INR",
    },
];
