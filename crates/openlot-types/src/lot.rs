//! Auction lots: parcels of coins published for bidding.
//!
//! A lot carries a fixed coin capacity and a per-lot bid range. Placing a bid
//! reserves part of the capacity; rejecting the bid releases it again. A lot
//! whose capacity is fully reserved shows as `Sold`, and an admin can close a
//! lot to further bidding at any time.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{LotNumber, OpenlotError};

/// Catalog state of a lot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LotStatus {
    /// Open for bidding.
    Active,
    /// Capacity fully reserved. Flips back to `Active` if a rejection
    /// releases capacity.
    Sold,
    /// Withdrawn by an admin. Never reopens.
    Closed,
}

impl std::fmt::Display for LotStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Active => "ACTIVE",
            Self::Sold => "SOLD",
            Self::Closed => "CLOSED",
        };
        write!(f, "{s}")
    }
}

/// Inclusive bid amount band for a lot, e.g. `R100 - R1000`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BidRange {
    pub min: Decimal,
    pub max: Decimal,
}

impl BidRange {
    #[must_use]
    pub fn new(min: Decimal, max: Decimal) -> Self {
        Self { min, max }
    }

    /// Whether `amount` falls inside the band, bounds included.
    #[must_use]
    pub fn contains(&self, amount: Decimal) -> bool {
        self.min <= amount && amount <= self.max
    }

    /// The four standard bands lots are published with.
    #[must_use]
    pub fn catalog() -> [Self; 4] {
        [
            Self::new(Decimal::new(100, 0), Decimal::new(1000, 0)),
            Self::new(Decimal::new(1000, 0), Decimal::new(5000, 0)),
            Self::new(Decimal::new(5000, 0), Decimal::new(10_000, 0)),
            Self::new(Decimal::new(10_000, 0), Decimal::new(15_000, 0)),
        ]
    }
}

impl std::fmt::Display for BidRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "R{} - R{}", self.min, self.max)
    }
}

/// A parcel of coins offered at auction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuctionLot {
    /// Identifier assigned by the auction scheduler.
    pub lot_number: LotNumber,
    /// Bank account backing this lot's coins.
    pub bank_name: String,
    /// Total coin capacity of the lot.
    pub coin_amount: Decimal,
    /// Advertised per-lot price. Display only; never read by settlement.
    pub going_price: Decimal,
    /// Accepted bid amounts for this lot.
    pub bid_range: BidRange,
    /// Capacity currently held by live bids.
    pub reserved_coins: Decimal,
    pub status: LotStatus,
    pub created_at: DateTime<Utc>,
}

impl AuctionLot {
    #[must_use]
    pub fn new(
        lot_number: LotNumber,
        bank_name: impl Into<String>,
        coin_amount: Decimal,
        going_price: Decimal,
        bid_range: BidRange,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            lot_number,
            bank_name: bank_name.into(),
            coin_amount,
            going_price,
            bid_range,
            reserved_coins: Decimal::ZERO,
            status: LotStatus::Active,
            created_at: now,
        }
    }

    /// Capacity still open to new bids.
    #[must_use]
    pub fn remaining(&self) -> Decimal {
        self.coin_amount - self.reserved_coins
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == LotStatus::Active
    }

    /// Reserve `amount` of capacity for a new bid.
    ///
    /// Only `Active` lots accept reservations. A lot whose last coin is
    /// reserved flips to `Sold`.
    pub fn reserve(&mut self, amount: Decimal) -> crate::Result<()> {
        if !self.is_active() {
            return Err(OpenlotError::LotUnavailable(self.lot_number.clone()));
        }
        let remaining = self.remaining();
        if amount > remaining {
            return Err(OpenlotError::InsufficientLotCapacity {
                requested: amount,
                remaining,
            });
        }
        self.reserved_coins += amount;
        if self.remaining() == Decimal::ZERO {
            self.status = LotStatus::Sold;
        }
        Ok(())
    }

    /// Return `amount` of reserved capacity after a bid is rejected.
    ///
    /// A `Sold` lot reopens; a `Closed` lot stays closed.
    pub fn release(&mut self, amount: Decimal) -> crate::Result<()> {
        if amount > self.reserved_coins {
            return Err(OpenlotError::Internal(format!(
                "lot {} releasing {} with only {} reserved",
                self.lot_number, amount, self.reserved_coins
            )));
        }
        self.reserved_coins -= amount;
        if self.status == LotStatus::Sold && self.remaining() > Decimal::ZERO {
            self.status = LotStatus::Active;
        }
        Ok(())
    }

    /// Withdraw the lot from further bidding.
    pub fn close(&mut self) {
        self.status = LotStatus::Closed;
    }

    /// Construct an active throwaway lot for tests.
    #[cfg(any(test, feature = "test-helpers"))]
    #[must_use]
    pub fn dummy(lot_number: &str, coin_amount: Decimal, min: Decimal, max: Decimal) -> Self {
        Self::new(
            LotNumber::new(lot_number),
            "FNB RSA",
            coin_amount,
            Decimal::ONE,
            BidRange::new(min, max),
            Utc::now(),
        )
    }
}
