//! Payment claims and the manual approval step.
//!
//! [`ApprovalGate`] owns the review side of the lifecycle. A user who has
//! paid claims their payment, which files a [`PendingApproval`] and parks the
//! bid in `AwaitingApproval`. An admin then decides each approval exactly
//! once:
//!
//! - **approve** commits one atomic batch: bid to `Approved` with purchase
//!   and maturity dates, the owner gains an active investment, the seller
//!   bank's coins move into the locked term, and the approval is stamped
//!   resolved.
//! - **reject** commits bid to `Rejected`, hands the reserved capacity back
//!   to the lot, and stamps the approval.
//!
//! Either everything in the batch lands or none of it does.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use openlot_store::{CommitBatch, Ledger};
use openlot_types::{
    ApprovalId, Bid, BidNumber, BidStatus, Decision, Email, EngineConfig, OpenlotError,
    PendingApproval, ReferenceNumber, Result,
};

use crate::gate_inbox::{BidCreated, GateInbox};
use crate::retries_exhausted;

/// The review plane of the engine.
pub struct ApprovalGate<L> {
    ledger: Arc<L>,
    config: EngineConfig,
    inbox: Arc<GateInbox>,
}

impl<L: Ledger> ApprovalGate<L> {
    /// `inbox` is the one handed out by the bid engine announcing placements.
    #[must_use]
    pub fn new(ledger: Arc<L>, config: EngineConfig, inbox: Arc<GateInbox>) -> Self {
        Self {
            ledger,
            config,
            inbox,
        }
    }

    /// Claim the payment for a bid, filing it for manual review.
    ///
    /// The caller proves they hold the bid slip by quoting its payment
    /// reference. `payer_email` is recorded as given; paying from a different
    /// address than the bid owner is normal.
    pub fn claim_payment(
        &self,
        bid_number: &BidNumber,
        reference: &ReferenceNumber,
        payer_email: &Email,
        payment_proof: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<PendingApproval> {
        for _ in 0..self.config.max_cas_retries {
            let Some(bid_row) = self.ledger.bid(bid_number)? else {
                return Err(OpenlotError::BidNotFound(bid_number.clone()));
            };

            let version = bid_row.version;
            let mut bid = bid_row.row;
            if bid.status == BidStatus::AwaitingApproval {
                return Err(OpenlotError::AlreadyClaimed(bid_number.clone()));
            }
            if bid.reference_number != *reference {
                return Err(OpenlotError::ReferenceMismatch {
                    bid: bid_number.clone(),
                });
            }
            bid.mark_awaiting_approval()?;

            let approval = PendingApproval::file(
                bid_number.clone(),
                reference.clone(),
                payer_email.clone(),
                bid.amount,
                bid.lot_number.clone(),
                payment_proof.clone(),
                now,
            );

            let mut batch = CommitBatch::new();
            batch
                .update_bid(version, bid)
                .insert_approval(approval.clone());
            match self.ledger.commit(batch) {
                Ok(()) => {
                    self.inbox.acknowledge(bid_number);
                    tracing::info!(
                        bid = %bid_number,
                        approval = %approval.id,
                        payer = %payer_email,
                        "Payment claimed, queued for review"
                    );
                    return Ok(approval);
                }
                Err(OpenlotError::VersionConflict { .. }) => continue,
                Err(other) => return Err(other),
            }
        }
        Err(retries_exhausted("claim_payment"))
    }

    /// Decide an open approval. Returns the bid as committed.
    pub fn decide(
        &self,
        approval_id: &ApprovalId,
        decision: Decision,
        admin: &str,
        now: DateTime<Utc>,
    ) -> Result<Bid> {
        for _ in 0..self.config.max_cas_retries {
            let Some(approval_row) = self.ledger.approval(approval_id)? else {
                return Err(OpenlotError::ApprovalNotFound(*approval_id));
            };
            if approval_row.row.is_resolved() {
                return Err(OpenlotError::AlreadyDecided(*approval_id));
            }
            let approval_version = approval_row.version;
            let mut approval = approval_row.row;

            let Some(bid_row) = self.ledger.bid(&approval.bid_number)? else {
                return Err(OpenlotError::Internal(format!(
                    "approval {} references missing bid {}",
                    approval_id, approval.bid_number
                )));
            };
            let bid_version = bid_row.version;
            let mut bid = bid_row.row;
            if bid.status != BidStatus::AwaitingApproval {
                return Err(OpenlotError::BidNotAwaitingApproval(bid.bid_number.clone()));
            }

            approval.resolve(decision, admin, now)?;
            let mut batch = CommitBatch::new();

            match decision {
                Decision::Approve => {
                    bid.mark_approved(now)?;

                    let Some(user_row) = self.ledger.user(&bid.user_email)? else {
                        return Err(OpenlotError::UserNotFound(bid.user_email.clone()));
                    };
                    let user_version = user_row.version;
                    let mut user = user_row.row;
                    user.open_investment();

                    let Some(bank_row) = self.ledger.bank(&bid.seller_bank)? else {
                        return Err(OpenlotError::BankNotFound(bid.seller_bank.clone()));
                    };
                    let bank_version = bank_row.version;
                    let mut bank = bank_row.row;
                    // Moves the coins from the bank reserve into the locked
                    // term of the census. Fails the decision, and leaves the
                    // approval open, if the bank cannot cover the bid.
                    bank.debit_coins(bid.original_coins)?;

                    batch
                        .update_bid(bid_version, bid.clone())
                        .update_user(user_version, user)
                        .update_bank(bank_version, bank)
                        .update_approval(approval_version, approval);
                }
                Decision::Reject => {
                    bid.mark_rejected()?;

                    let Some(lot_row) = self.ledger.lot(&bid.lot_number)? else {
                        return Err(OpenlotError::Internal(format!(
                            "bid {} references missing lot {}",
                            bid.bid_number, bid.lot_number
                        )));
                    };
                    let lot_version = lot_row.version;
                    let mut lot = lot_row.row;
                    lot.release(bid.original_coins)?;

                    batch
                        .update_bid(bid_version, bid.clone())
                        .update_lot(lot_version, lot)
                        .update_approval(approval_version, approval);
                }
            }

            match self.ledger.commit(batch) {
                Ok(()) => {
                    tracing::info!(
                        approval = %approval_id,
                        bid = %bid.bid_number,
                        decision = %decision,
                        admin,
                        "Approval decided"
                    );
                    return Ok(bid);
                }
                // Somebody raced us; re-read. A competing decision surfaces
                // as AlreadyDecided on the next pass.
                Err(OpenlotError::VersionConflict { .. }) => continue,
                Err(other) => return Err(other),
            }
        }
        Err(retries_exhausted("decide"))
    }

    /// Approvals still waiting for a decision, oldest first.
    pub fn open_approvals(&self) -> Result<Vec<PendingApproval>> {
        self.ledger.open_approvals()
    }

    /// Placed bids whose payment has not been claimed yet.
    #[must_use]
    pub fn unclaimed_bids(&self) -> Vec<BidCreated> {
        self.inbox.snapshot()
    }
}
