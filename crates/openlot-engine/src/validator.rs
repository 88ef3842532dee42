//! Pre-placement bid validation.
//!
//! Every bid passes through [`BidValidator::validate`] before it touches the
//! store. Checks run in a fixed order and fail fast, so a bid with several
//! problems always reports the same one.

use rust_decimal::Decimal;

use openlot_types::{AuctionLot, EngineConfig, HoldingTerm, LotNumber, OpenlotError, Result};

/// Stateless validation of bid requests against a lot and the offered terms.
#[derive(Debug, Clone)]
pub struct BidValidator {
    holding_terms: Vec<HoldingTerm>,
}

impl BidValidator {
    #[must_use]
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            holding_terms: config.holding_terms.clone(),
        }
    }

    /// Validate a bid request. `lot` is `None` when `lot_number` matched
    /// nothing in the catalog.
    ///
    /// Check order is part of the contract:
    ///
    /// 1. amount is positive
    /// 2. lot exists and is open for bidding
    /// 3. amount sits inside the lot's bid range
    /// 4. amount fits the lot's remaining capacity
    /// 5. holding period is an offered term
    pub fn validate(
        &self,
        lot_number: &LotNumber,
        amount: Decimal,
        lot: Option<&AuctionLot>,
        holding_period: u32,
    ) -> Result<()> {
        // 1. Amount must be positive.
        if amount <= Decimal::ZERO {
            return Err(OpenlotError::InvalidAmount { amount });
        }

        // 2. Lot must exist and be open for bidding.
        let Some(lot) = lot.filter(|l| l.is_active()) else {
            return Err(OpenlotError::LotUnavailable(lot_number.clone()));
        };

        // 3. Amount must sit inside the lot's bid range.
        if !lot.bid_range.contains(amount) {
            return Err(OpenlotError::AmountOutOfRange {
                amount,
                min: lot.bid_range.min,
                max: lot.bid_range.max,
            });
        }

        // 4. Amount must fit the remaining capacity.
        let remaining = lot.remaining();
        if amount > remaining {
            return Err(OpenlotError::InsufficientLotCapacity {
                requested: amount,
                remaining,
            });
        }

        // 5. Holding period must be an offered term.
        if !self.holding_terms.iter().any(|t| t.days == holding_period) {
            return Err(OpenlotError::InvalidHoldingPeriod {
                days: holding_period,
            });
        }

        Ok(())
    }
}
