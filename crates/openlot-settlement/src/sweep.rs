//! The maturity sweep.
//!
//! [`SettlementSweep::mature_due`] finds approved bids whose maturity date
//! has passed and commits one batch per bid: the bid turns `Matured`, the
//! owner's wallet gains `original_coins` times the term multiplier, their
//! investment counters move, and the seller bank funds the yield on top of
//! the already-locked principal. The sweep is idempotent; running it twice,
//! or on nothing, is a no-op.
//!
//! Per-bid anomalies (raced bids, an underfunded bank) are logged and
//! skipped so one bad bid cannot wedge the sweep. Store failures abort it.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use openlot_store::{CommitBatch, Ledger};
use openlot_types::constants::MATURITY_GUARD_CACHE_SIZE;
use openlot_types::{BidNumber, BidStatus, Email, EngineConfig, OpenlotError, Result};

use crate::maturity_guard::MaturityGuard;

/// One bid matured by a sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct MaturedBid {
    pub bid_number: BidNumber,
    pub user_email: Email,
    pub original_coins: Decimal,
    pub matured_coins: Decimal,
}

/// What a sweep did.
#[derive(Debug, Clone, Default)]
pub struct SweepReport {
    pub matured: Vec<MaturedBid>,
    /// Due bids left for a later sweep (raced away or unfundable).
    pub skipped: usize,
}

impl SweepReport {
    /// Coins credited to users by this sweep.
    #[must_use]
    pub fn total_payout(&self) -> Decimal {
        self.matured.iter().map(|m| m.matured_coins).sum()
    }
}

/// The settlement plane of the engine.
pub struct SettlementSweep<L> {
    ledger: Arc<L>,
    config: EngineConfig,
    guard: MaturityGuard,
}

impl<L: Ledger> SettlementSweep<L> {
    #[must_use]
    pub fn new(ledger: Arc<L>, config: EngineConfig) -> Self {
        Self {
            ledger,
            config,
            guard: MaturityGuard::new(MATURITY_GUARD_CACHE_SIZE),
        }
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Mature every approved bid whose maturity date is at or before `now`.
    pub fn mature_due(&mut self, now: DateTime<Utc>) -> Result<SweepReport> {
        let due: Vec<BidNumber> = self
            .ledger
            .bids_with_status(BidStatus::Approved)?
            .into_iter()
            .filter(|bid| bid.is_due(now))
            .map(|bid| bid.bid_number)
            .collect();

        let mut report = SweepReport::default();
        for bid_number in due {
            match self.mature_one(&bid_number, now)? {
                Some(matured) => report.matured.push(matured),
                None => report.skipped += 1,
            }
        }

        if !report.matured.is_empty() || report.skipped > 0 {
            tracing::info!(
                matured = report.matured.len(),
                skipped = report.skipped,
                payout = %report.total_payout(),
                "Settlement sweep complete"
            );
        }
        Ok(report)
    }

    /// Mature a single due bid. `Ok(None)` means the bid was skipped and a
    /// later sweep may pick it up.
    fn mature_one(
        &mut self,
        bid_number: &BidNumber,
        now: DateTime<Utc>,
    ) -> Result<Option<MaturedBid>> {
        for _ in 0..self.config.max_cas_retries {
            let Some(bid_row) = self.ledger.bid(bid_number)? else {
                tracing::warn!(bid = %bid_number, "Due bid vanished from the store, skipping");
                return Ok(None);
            };
            let bid_version = bid_row.version;
            let mut bid = bid_row.row;

            // Raced by another writer since listing.
            if !bid.is_due(now) {
                return Ok(None);
            }
            if self.guard.is_matured(bid_number) {
                tracing::warn!(bid = %bid_number, "Guard blocked a repeat maturation");
                return Ok(None);
            }

            let Some(term) = self.config.term(bid.holding_period) else {
                tracing::warn!(
                    bid = %bid_number,
                    days = bid.holding_period,
                    "No term on file for bid, skipping"
                );
                return Ok(None);
            };
            let matured_coins = term.matured_coins(bid.original_coins);
            let yield_coins = matured_coins - bid.original_coins;

            let Some(user_row) = self.ledger.user(&bid.user_email)? else {
                tracing::warn!(bid = %bid_number, user = %bid.user_email, "Bid owner missing, skipping");
                return Ok(None);
            };
            let user_version = user_row.version;
            let mut user = user_row.row;
            user.credit_coins(matured_coins);
            if let Err(err) = user.settle_investment(bid.original_coins) {
                tracing::warn!(bid = %bid_number, %err, "Investment counters off, skipping");
                return Ok(None);
            }

            let Some(bank_row) = self.ledger.bank(&bid.seller_bank)? else {
                tracing::warn!(bid = %bid_number, bank = %bid.seller_bank, "Seller bank missing, skipping");
                return Ok(None);
            };
            let bank_version = bank_row.version;
            let mut bank = bank_row.row;
            if let Err(err) = bank.debit_coins(yield_coins) {
                tracing::warn!(
                    bid = %bid_number,
                    bank = %bid.seller_bank,
                    %err,
                    "Bank cannot fund the yield, deferring maturation"
                );
                return Ok(None);
            }

            bid.mark_matured(matured_coins)?;

            let mut batch = CommitBatch::new();
            batch
                .update_bid(bid_version, bid.clone())
                .update_user(user_version, user)
                .update_bank(bank_version, bank);
            match self.ledger.commit(batch) {
                Ok(()) => {
                    if let Err(err) = self.guard.mark_matured(bid_number) {
                        tracing::warn!(bid = %bid_number, %err, "Guard already held a fresh maturation");
                    }
                    tracing::info!(
                        bid = %bid_number,
                        user = %bid.user_email,
                        original = %bid.original_coins,
                        matured = %matured_coins,
                        "Bid matured"
                    );
                    return Ok(Some(MaturedBid {
                        bid_number: bid_number.clone(),
                        user_email: bid.user_email,
                        original_coins: bid.original_coins,
                        matured_coins,
                    }));
                }
                Err(OpenlotError::VersionConflict { .. }) => continue,
                Err(other) => return Err(other),
            }
        }

        tracing::warn!(bid = %bid_number, "Giving up on bid after repeated version conflicts");
        Err(OpenlotError::StoreUnavailable)
    }
}
