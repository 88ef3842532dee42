//! User accounts and their coin wallets.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Email, OpenlotError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserStatus {
    Active,
    Inactive,
}

impl std::fmt::Display for UserStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Active => "ACTIVE",
            Self::Inactive => "INACTIVE",
        };
        write!(f, "{s}")
    }
}

/// A registered user, keyed by normalized email.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub email: Email,
    pub full_name: String,
    pub phone: String,
    pub status: UserStatus,
    /// Spendable coins in the user's wallet.
    pub coin_balance: Decimal,
    /// Lifetime sum of matured investments, in original coins.
    pub total_invested: Decimal,
    /// Number of approved bids not yet matured.
    pub active_investments: u32,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Register a new account, crediting the welcome bonus.
    #[must_use]
    pub fn register(
        email: Email,
        full_name: impl Into<String>,
        phone: impl Into<String>,
        welcome_bonus: Decimal,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            email,
            full_name: full_name.into(),
            phone: phone.into(),
            status: UserStatus::Active,
            coin_balance: welcome_bonus,
            total_invested: Decimal::ZERO,
            active_investments: 0,
            is_verified: false,
            created_at: now,
        }
    }

    /// Add coins to the wallet.
    pub fn credit_coins(&mut self, amount: Decimal) {
        self.coin_balance += amount;
    }

    /// Remove coins from the wallet, refusing to go negative.
    pub fn debit_coins(&mut self, amount: Decimal) -> crate::Result<()> {
        if amount > self.coin_balance {
            return Err(OpenlotError::BalanceUnderflow {
                account: self.email.to_string(),
                requested: amount,
                available: self.coin_balance,
            });
        }
        self.coin_balance -= amount;
        Ok(())
    }

    /// Record a newly approved bid.
    pub fn open_investment(&mut self) {
        self.active_investments += 1;
    }

    /// Record a matured bid: one fewer active investment, `original_coins`
    /// added to the lifetime invested total.
    pub fn settle_investment(&mut self, original_coins: Decimal) -> crate::Result<()> {
        let Some(rest) = self.active_investments.checked_sub(1) else {
            return Err(OpenlotError::Internal(format!(
                "user {} settling with no active investments",
                self.email
            )));
        };
        self.active_investments = rest;
        self.total_invested += original_coins;
        Ok(())
    }

    /// Construct a verified account with a filled wallet for tests.
    #[cfg(any(test, feature = "test-helpers"))]
    #[must_use]
    pub fn dummy(email: &str) -> Self {
        let mut user = Self::register(
            Email::new(email),
            "John Smith",
            "+27831234567",
            Decimal::new(25_000, 0),
            Utc::now(),
        );
        user.is_verified = true;
        user
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_credits_the_welcome_bonus() {
        let user = User::register(
            Email::new("sarah.j@example.com"),
            "Sarah Johnson",
            "+27829876543",
            Decimal::new(1000, 0),
            Utc::now(),
        );
        assert_eq!(user.coin_balance, Decimal::new(1000, 0));
        assert_eq!(user.total_invested, Decimal::ZERO);
        assert_eq!(user.active_investments, 0);
        assert_eq!(user.status, UserStatus::Active);
        assert!(!user.is_verified);
    }

    #[test]
    fn debit_refuses_underflow() {
        let mut user = User::dummy("john@example.com");
        let err = user.debit_coins(Decimal::new(25_001, 0)).unwrap_err();
        assert!(matches!(
            err,
            OpenlotError::BalanceUnderflow { available, .. }
                if available == Decimal::new(25_000, 0)
        ));
        // Untouched on failure.
        assert_eq!(user.coin_balance, Decimal::new(25_000, 0));
    }

    #[test]
    fn investment_counters_round_trip() {
        let mut user = User::dummy("john@example.com");
        user.open_investment();
        user.open_investment();
        assert_eq!(user.active_investments, 2);

        user.settle_investment(Decimal::new(1000, 0)).unwrap();
        assert_eq!(user.active_investments, 1);
        assert_eq!(user.total_invested, Decimal::new(1000, 0));
    }

    #[test]
    fn settling_with_no_open_investment_is_a_breach() {
        let mut user = User::dummy("john@example.com");
        let err = user.settle_investment(Decimal::ONE).unwrap_err();
        assert!(matches!(err, OpenlotError::Internal(_)));
    }
}
