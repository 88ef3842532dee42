//! Seller bank accounts backing auction lots.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::OpenlotError;

/// A bank account that backs auction lots with coins, keyed by `bank_name`.
///
/// `coin_balance` funds approved bids and their yield. The fiat `balance` is
/// carried for the account book display and is never touched by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankAccount {
    pub bank_name: String,
    pub account_holder: String,
    pub account_number: String,
    pub branch_code: String,
    pub account_type: String,
    /// Fiat balance, display only.
    pub balance: Decimal,
    /// Coins available to back approvals and maturity yield.
    pub coin_balance: Decimal,
    pub created_at: DateTime<Utc>,
}

impl BankAccount {
    /// Open an empty account. Funding happens through admin coin adjustments
    /// so every coin entering the system is recorded.
    #[must_use]
    pub fn new(
        bank_name: impl Into<String>,
        account_holder: impl Into<String>,
        account_number: impl Into<String>,
        branch_code: impl Into<String>,
        account_type: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            bank_name: bank_name.into(),
            account_holder: account_holder.into(),
            account_number: account_number.into(),
            branch_code: branch_code.into(),
            account_type: account_type.into(),
            balance: Decimal::ZERO,
            coin_balance: Decimal::ZERO,
            created_at: now,
        }
    }

    /// Add coins to the account.
    pub fn credit_coins(&mut self, amount: Decimal) {
        self.coin_balance += amount;
    }

    /// Remove coins from the account, refusing to go negative.
    pub fn debit_coins(&mut self, amount: Decimal) -> crate::Result<()> {
        if amount > self.coin_balance {
            return Err(OpenlotError::BalanceUnderflow {
                account: self.bank_name.clone(),
                requested: amount,
                available: self.coin_balance,
            });
        }
        self.coin_balance -= amount;
        Ok(())
    }

    /// Construct a funded business account for tests.
    #[cfg(any(test, feature = "test-helpers"))]
    #[must_use]
    pub fn dummy(bank_name: &str, coin_balance: Decimal) -> Self {
        let mut bank = Self::new(
            bank_name,
            "Openpeer Digital SA",
            "62847291734",
            "250655",
            "Business",
            Utc::now(),
        );
        bank.coin_balance = coin_balance;
        bank
    }
}
