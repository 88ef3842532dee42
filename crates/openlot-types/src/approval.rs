//! Payment approvals: the manual review step between a claimed payment and a
//! live investment.
//!
//! When a user claims to have paid, the gate files a [`PendingApproval`] for
//! an admin to review. Deciding it stamps a [`Resolution`] onto the record
//! rather than deleting it, so a second decision attempt can be told apart
//! from an approval that never existed.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{ApprovalId, BidNumber, Email, LotNumber, OpenlotError, ReferenceNumber};

/// An admin's verdict on a claimed payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    Approve,
    Reject,
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Approve => "APPROVE",
            Self::Reject => "REJECT",
        };
        write!(f, "{s}")
    }
}

/// How and by whom an approval was decided.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    pub decision: Decision,
    /// Admin identity as reported by the calling surface.
    pub admin: String,
    pub resolved_at: DateTime<Utc>,
}

/// A claimed payment queued for manual review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingApproval {
    pub id: ApprovalId,
    /// Bid whose payment is being reviewed.
    pub bid_number: BidNumber,
    /// Reference quoted by the payer, already matched against the bid.
    pub reference_number: ReferenceNumber,
    /// Address the payer gave when claiming, not necessarily the bid owner.
    pub payer_email: Email,
    pub amount: Decimal,
    pub lot_number: LotNumber,
    /// Link to uploaded proof of payment, if any.
    pub payment_proof: Option<String>,
    /// `None` while the approval is open.
    pub resolution: Option<Resolution>,
    pub created_at: DateTime<Utc>,
}

impl PendingApproval {
    /// File a new approval for the given claimed payment.
    #[must_use]
    pub fn file(
        bid_number: BidNumber,
        reference_number: ReferenceNumber,
        payer_email: Email,
        amount: Decimal,
        lot_number: LotNumber,
        payment_proof: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ApprovalId::new(),
            bid_number,
            reference_number,
            payer_email,
            amount,
            lot_number,
            payment_proof,
            resolution: None,
            created_at: now,
        }
    }

    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.resolution.is_some()
    }

    /// Stamp a decision onto the approval. Each approval is decided once.
    pub fn resolve(
        &mut self,
        decision: Decision,
        admin: impl Into<String>,
        now: DateTime<Utc>,
    ) -> crate::Result<()> {
        if self.is_resolved() {
            return Err(OpenlotError::AlreadyDecided(self.id));
        }
        self.resolution = Some(Resolution {
            decision,
            admin: admin.into(),
            resolved_at: now,
        });
        Ok(())
    }
}
