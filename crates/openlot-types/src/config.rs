//! Engine configuration.
//!
//! [`EngineConfig`] carries the business parameters of the bid lifecycle:
//! which holding terms are offered and at what multiplier, the registration
//! welcome bonus, and the operational retry and scheduling knobs. Defaults
//! reproduce the production parameters; deployments override per environment.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::constants::{
    DEFAULT_MAX_CAS_RETRIES, DEFAULT_SETTLEMENT_INTERVAL_SECS, DEFAULT_WELCOME_BONUS_COINS,
};
use crate::OpenlotError;

/// One offered holding term: park coins for `days`, get them back scaled by
/// `multiplier`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoldingTerm {
    pub days: u32,
    /// Payout multiplier applied to the original coins at maturity,
    /// e.g. `1.07` for a 7% yield.
    pub multiplier: Decimal,
}

impl HoldingTerm {
    #[must_use]
    pub fn new(days: u32, multiplier: Decimal) -> Self {
        Self { days, multiplier }
    }

    /// Coins paid out at maturity for `original` coins under this term.
    #[must_use]
    pub fn matured_coins(&self, original: Decimal) -> Decimal {
        original * self.multiplier
    }
}

/// Business and operational parameters of the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Offered holding terms. A bid's holding period must match one of these.
    pub holding_terms: Vec<HoldingTerm>,
    /// Coins credited to every newly registered user.
    pub welcome_bonus: Decimal,
    /// Optimistic-concurrency retries before an operation reports the store
    /// as unavailable.
    pub max_cas_retries: u32,
    /// Interval between scheduled settlement sweeps.
    pub settlement_interval: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            holding_terms: vec![
                HoldingTerm::new(5, Decimal::new(105, 2)),
                HoldingTerm::new(10, Decimal::new(107, 2)),
                HoldingTerm::new(20, Decimal::new(110, 2)),
            ],
            welcome_bonus: Decimal::new(DEFAULT_WELCOME_BONUS_COINS, 0),
            max_cas_retries: DEFAULT_MAX_CAS_RETRIES,
            settlement_interval: Duration::from_secs(DEFAULT_SETTLEMENT_INTERVAL_SECS),
        }
    }
}

impl EngineConfig {
    /// Look up the term offered for `days`, if any.
    #[must_use]
    pub fn term(&self, days: u32) -> Option<&HoldingTerm> {
        self.holding_terms.iter().find(|t| t.days == days)
    }

    /// Payout multiplier for `days`, if the term is offered.
    #[must_use]
    pub fn multiplier(&self, days: u32) -> Option<Decimal> {
        self.term(days).map(|t| t.multiplier)
    }

    #[must_use]
    pub fn is_offered_period(&self, days: u32) -> bool {
        self.term(days).is_some()
    }

    /// Check the config for values that would corrupt the books at runtime.
    pub fn validate(&self) -> crate::Result<()> {
        if self.holding_terms.is_empty() {
            return Err(OpenlotError::Internal(
                "config offers no holding terms".into(),
            ));
        }
        for term in &self.holding_terms {
            if term.days == 0 {
                return Err(OpenlotError::Internal("zero-day holding term".into()));
            }
            if term.multiplier < Decimal::ONE {
                return Err(OpenlotError::Internal(format!(
                    "term {} days has sub-par multiplier {}",
                    term.days, term.multiplier
                )));
            }
        }
        if self.welcome_bonus < Decimal::ZERO {
            return Err(OpenlotError::Internal("negative welcome bonus".into()));
        }
        if self.max_cas_retries == 0 {
            return Err(OpenlotError::Internal("max_cas_retries must be > 0".into()));
        }
        Ok(())
    }
}

/// Auction-cycle parameters shown on the dashboard and edited by admins.
///
/// The engine stores and serves this record; the auction scheduler owns its
/// meaning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuctionConfig {
    /// `None` until the scheduler announces the next auction.
    pub next_auction_time: Option<DateTime<Utc>>,
    pub auction_frequency: String,
    pub coins_per_auction: Decimal,
    pub max_lots_per_auction: u32,
    pub total_coins_in_system: Decimal,
    pub available_coins_to_auction: Decimal,
    pub auction_status: String,
    pub current_auction_id: String,
}

impl Default for AuctionConfig {
    fn default() -> Self {
        Self {
            next_auction_time: None,
            auction_frequency: "daily".to_string(),
            coins_per_auction: Decimal::new(150_000, 0),
            max_lots_per_auction: 20,
            total_coins_in_system: Decimal::new(2_500_000, 0),
            available_coins_to_auction: Decimal::new(180_000, 0),
            auction_status: "scheduled".to_string(),
            current_auction_id: "AUC001".to_string(),
        }
    }
}
