//! Bids: the fundamental lifecycle primitive.
//!
//! A bid is created against an auction lot, claims a payment, passes (or
//! fails) manual approval, and finally matures with yield. Every transition
//! is checked against the state machine below; anything else is rejected with
//! `InvalidTransition`:
//!
//! ```text
//!   PendingPayment ──► AwaitingApproval ──► Approved ──► Matured
//!                             │
//!                             └──────────► Rejected
//! ```
//!
//! `Matured` and `Rejected` are terminal.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{AuctionLot, BidNumber, Email, LotNumber, OpenlotError, ReferenceNumber};

/// Lifecycle state of a bid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BidStatus {
    /// Created, waiting for the user to pay and claim the payment.
    PendingPayment,
    /// Payment claimed, queued for manual review.
    AwaitingApproval,
    /// Approved by an admin; coins are locked until maturity.
    Approved,
    /// Matured and credited with yield. Terminal.
    Matured,
    /// Rejected by an admin; lot capacity was released. Terminal.
    Rejected,
}

impl BidStatus {
    /// Whether the state machine permits moving from `self` to `target`.
    #[must_use]
    pub fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::PendingPayment, Self::AwaitingApproval)
                | (Self::AwaitingApproval, Self::Approved | Self::Rejected)
                | (Self::Approved, Self::Matured)
        )
    }

    /// Terminal states admit no further transitions.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Matured | Self::Rejected)
    }
}

impl std::fmt::Display for BidStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::PendingPayment => "PENDING_PAYMENT",
            Self::AwaitingApproval => "AWAITING_APPROVAL",
            Self::Approved => "APPROVED",
            Self::Matured => "MATURED",
            Self::Rejected => "REJECTED",
        };
        write!(f, "{s}")
    }
}

/// A user's bid on an auction lot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bid {
    /// Customer-facing primary key.
    pub bid_number: BidNumber,
    /// Reference the payer must quote on their transfer.
    pub reference_number: ReferenceNumber,
    /// Owner of the bid.
    pub user_email: Email,
    /// Lot this bid reserves capacity on.
    pub lot_number: LotNumber,
    /// Bank account holding the lot's coins, copied from the lot at placement.
    pub seller_bank: String,
    /// Amount the user entered on the bid form.
    pub amount: Decimal,
    /// Coins reserved against the lot. Equals `amount` at placement; kept as
    /// its own field because settlement rewrites coin fields only.
    pub original_coins: Decimal,
    /// Coins credited at maturity (`original_coins` times the term
    /// multiplier). `None` until the bid matures.
    pub matured_coins: Option<Decimal>,
    /// Holding period in days.
    pub holding_period: u32,
    /// Current lifecycle state.
    pub status: BidStatus,
    /// Set when an admin approves the bid.
    pub purchase_date: Option<DateTime<Utc>>,
    /// `purchase_date` plus the holding period.
    pub maturity_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Bid {
    /// Create a freshly placed bid against `lot`.
    #[must_use]
    pub fn place(
        bid_number: BidNumber,
        reference_number: ReferenceNumber,
        user_email: Email,
        lot: &AuctionLot,
        amount: Decimal,
        holding_period: u32,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            bid_number,
            reference_number,
            user_email,
            lot_number: lot.lot_number.clone(),
            seller_bank: lot.bank_name.clone(),
            amount,
            original_coins: amount,
            matured_coins: None,
            holding_period,
            status: BidStatus::PendingPayment,
            purchase_date: None,
            maturity_date: None,
            created_at: now,
        }
    }

    fn transition(&mut self, target: BidStatus) -> crate::Result<()> {
        if !self.status.can_transition_to(target) {
            return Err(OpenlotError::InvalidTransition {
                bid: self.bid_number.clone(),
                from: self.status,
                to: target,
            });
        }
        self.status = target;
        Ok(())
    }

    /// Record that the payment was claimed and the bid entered review.
    pub fn mark_awaiting_approval(&mut self) -> crate::Result<()> {
        self.transition(BidStatus::AwaitingApproval)
    }

    /// Approve the bid at `now`, fixing the purchase and maturity dates.
    pub fn mark_approved(&mut self, now: DateTime<Utc>) -> crate::Result<()> {
        self.transition(BidStatus::Approved)?;
        self.purchase_date = Some(now);
        self.maturity_date = Some(now + Duration::days(i64::from(self.holding_period)));
        Ok(())
    }

    /// Reject the bid during review.
    pub fn mark_rejected(&mut self) -> crate::Result<()> {
        self.transition(BidStatus::Rejected)
    }

    /// Mature the bid, recording the credited coin quantity.
    pub fn mark_matured(&mut self, matured_coins: Decimal) -> crate::Result<()> {
        self.transition(BidStatus::Matured)?;
        self.matured_coins = Some(matured_coins);
        Ok(())
    }

    /// Whether this bid is approved and its maturity date has passed.
    #[must_use]
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.status == BidStatus::Approved
            && self.maturity_date.is_some_and(|due| due <= now)
    }

    /// Construct a throwaway pending bid for tests.
    #[cfg(any(test, feature = "test-helpers"))]
    #[must_use]
    pub fn dummy(lot: &AuctionLot, amount: Decimal, holding_period: u32) -> Self {
        Self::place(
            BidNumber::from_index(rand::random::<u32>()),
            ReferenceNumber::derive(uuid::Uuid::now_v7(), 0),
            Email::new("bidder@example.com"),
            lot,
            amount,
            holding_period,
            Utc::now(),
        )
    }
}
