//! In-memory ledger backing the engine.
//!
//! [`MemoryLedger`] keeps one versioned `HashMap` per entity behind
//! `parking_lot` locks. Reads take a single collection lock; a commit takes
//! write locks on *every* collection in one fixed order, validates all of its
//! version checks against the live state, and only then applies. Holding all
//! write locks across validate-and-apply is what makes a batch atomic: by the
//! time any reader gets a lock back, either the whole batch is visible or
//! none of it is.
//!
//! The fixed acquisition order (users, lots, bids, banks, approvals, chats,
//! books) plus single-lock readers rules out deadlock.

use std::collections::HashMap;

use parking_lot::RwLock;
use rust_decimal::Decimal;

#[cfg(any(test, feature = "test-helpers"))]
use std::sync::atomic::{AtomicU32, Ordering};

use openlot_types::{
    ApprovalId, AuctionConfig, AuctionLot, BankAccount, Bid, BidNumber, BidStatus, ChatId, Email,
    LotNumber, LotStatus, OpenlotError, PendingApproval, ReferenceNumber, Result, SupportChat,
    User,
};

use crate::repository::{
    ApprovalStore, BankStore, BidStore, ChatStore, Commit, CommitBatch, CommitOp, ConfigStore,
    IssuanceStore, LotStore, UserStore,
};
use crate::row::VersionedRow;

/// Running totals of coins that entered and left the system.
#[derive(Debug, Default)]
struct IssuanceBooks {
    issued: Decimal,
    retired: Decimal,
}

/// Thread-safe in-memory implementation of the full ledger surface.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    users: RwLock<HashMap<Email, VersionedRow<User>>>,
    lots: RwLock<HashMap<LotNumber, VersionedRow<AuctionLot>>>,
    bids: RwLock<HashMap<BidNumber, VersionedRow<Bid>>>,
    banks: RwLock<HashMap<String, VersionedRow<BankAccount>>>,
    approvals: RwLock<HashMap<ApprovalId, VersionedRow<PendingApproval>>>,
    chats: RwLock<HashMap<ChatId, VersionedRow<SupportChat>>>,
    auction_config: RwLock<AuctionConfig>,
    books: RwLock<IssuanceBooks>,
    /// Remaining operations to fail with `StoreUnavailable`, for outage
    /// drills.
    #[cfg(any(test, feature = "test-helpers"))]
    fail_remaining: AtomicU32,
}

impl MemoryLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `n` store operations fail with `StoreUnavailable`.
    #[cfg(any(test, feature = "test-helpers"))]
    pub fn fail_next_ops(&self, n: u32) {
        self.fail_remaining.store(n, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<()> {
        #[cfg(any(test, feature = "test-helpers"))]
        {
            if self
                .fail_remaining
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(OpenlotError::StoreUnavailable);
            }
        }
        Ok(())
    }
}

fn duplicate(collection: &str, key: &dyn std::fmt::Display) -> OpenlotError {
    OpenlotError::DuplicateKey {
        collection: collection.to_string(),
        key: key.to_string(),
    }
}

fn check_version<T>(
    stored: Option<&VersionedRow<T>>,
    expect: u64,
    collection: &str,
    key: &dyn std::fmt::Display,
) -> Result<()> {
    match stored {
        None => Err(OpenlotError::Internal(format!(
            "update of missing {collection} row {key}"
        ))),
        Some(row) if row.version != expect => {
            tracing::debug!(
                collection,
                key = %key,
                stored = row.version,
                expect,
                "commit rejected on version conflict"
            );
            Err(OpenlotError::VersionConflict {
                collection: collection.to_string(),
                key: key.to_string(),
            })
        }
        Some(_) => Ok(()),
    }
}

impl Commit for MemoryLedger {
    fn commit(&self, batch: CommitBatch) -> Result<()> {
        self.check_available()?;

        // Lock order matters; see the module doc.
        let mut users = self.users.write();
        let mut lots = self.lots.write();
        let mut bids = self.bids.write();
        let mut banks = self.banks.write();
        let mut approvals = self.approvals.write();
        let mut chats = self.chats.write();
        let mut books = self.books.write();

        // Pass 1: every check against live state, touching nothing.
        for op in batch.ops() {
            match op {
                CommitOp::InsertBid(bid) => {
                    if bids.contains_key(&bid.bid_number) {
                        tracing::debug!(bid = %bid.bid_number, "commit rejected: bid number taken");
                        return Err(duplicate("bids", &bid.bid_number));
                    }
                }
                CommitOp::UpdateBid { expect, bid } => {
                    check_version(bids.get(&bid.bid_number), *expect, "bids", &bid.bid_number)?;
                }
                CommitOp::UpdateLot { expect, lot } => {
                    check_version(lots.get(&lot.lot_number), *expect, "lots", &lot.lot_number)?;
                }
                CommitOp::UpdateUser { expect, user } => {
                    check_version(users.get(&user.email), *expect, "users", &user.email)?;
                }
                CommitOp::UpdateBank { expect, bank } => {
                    check_version(banks.get(&bank.bank_name), *expect, "banks", &bank.bank_name)?;
                }
                CommitOp::InsertApproval(approval) => {
                    if approvals.contains_key(&approval.id) {
                        return Err(duplicate("approvals", &approval.id));
                    }
                }
                CommitOp::UpdateApproval { expect, approval } => {
                    check_version(approvals.get(&approval.id), *expect, "approvals", &approval.id)?;
                }
                CommitOp::UpdateChat { expect, chat } => {
                    check_version(chats.get(&chat.id), *expect, "chats", &chat.id)?;
                }
                CommitOp::RecordIssuance(amount) | CommitOp::RecordRetirement(amount) => {
                    if *amount < Decimal::ZERO {
                        return Err(OpenlotError::Internal(format!(
                            "negative conservation record {amount}"
                        )));
                    }
                }
            }
        }

        // Pass 2: apply. Nothing below can fail.
        for op in batch.into_ops() {
            match op {
                CommitOp::InsertBid(bid) => {
                    bids.insert(bid.bid_number.clone(), VersionedRow::new(bid));
                }
                CommitOp::UpdateBid { expect, bid } => {
                    bids.insert(
                        bid.bid_number.clone(),
                        VersionedRow {
                            version: expect + 1,
                            row: bid,
                        },
                    );
                }
                CommitOp::UpdateLot { expect, lot } => {
                    lots.insert(
                        lot.lot_number.clone(),
                        VersionedRow {
                            version: expect + 1,
                            row: lot,
                        },
                    );
                }
                CommitOp::UpdateUser { expect, user } => {
                    users.insert(
                        user.email.clone(),
                        VersionedRow {
                            version: expect + 1,
                            row: user,
                        },
                    );
                }
                CommitOp::UpdateBank { expect, bank } => {
                    banks.insert(
                        bank.bank_name.clone(),
                        VersionedRow {
                            version: expect + 1,
                            row: bank,
                        },
                    );
                }
                CommitOp::InsertApproval(approval) => {
                    approvals.insert(approval.id, VersionedRow::new(approval));
                }
                CommitOp::UpdateApproval { expect, approval } => {
                    approvals.insert(
                        approval.id,
                        VersionedRow {
                            version: expect + 1,
                            row: approval,
                        },
                    );
                }
                CommitOp::UpdateChat { expect, chat } => {
                    chats.insert(
                        chat.id,
                        VersionedRow {
                            version: expect + 1,
                            row: chat,
                        },
                    );
                }
                CommitOp::RecordIssuance(amount) => books.issued += amount,
                CommitOp::RecordRetirement(amount) => books.retired += amount,
            }
        }

        Ok(())
    }
}

impl UserStore for MemoryLedger {
    fn user(&self, email: &Email) -> Result<Option<VersionedRow<User>>> {
        self.check_available()?;
        Ok(self.users.read().get(email).cloned())
    }

    fn insert_user(&self, user: User) -> Result<()> {
        self.check_available()?;
        let mut users = self.users.write();
        if users.contains_key(&user.email) {
            return Err(duplicate("users", &user.email));
        }
        if user.coin_balance > Decimal::ZERO {
            self.books.write().issued += user.coin_balance;
        }
        users.insert(user.email.clone(), VersionedRow::new(user));
        Ok(())
    }

    fn total_user_coins(&self) -> Result<Decimal> {
        self.check_available()?;
        Ok(self.users.read().values().map(|v| v.row.coin_balance).sum())
    }
}

impl LotStore for MemoryLedger {
    fn lot(&self, number: &LotNumber) -> Result<Option<VersionedRow<AuctionLot>>> {
        self.check_available()?;
        Ok(self.lots.read().get(number).cloned())
    }

    fn insert_lot(&self, lot: AuctionLot) -> Result<()> {
        self.check_available()?;
        let mut lots = self.lots.write();
        if lots.contains_key(&lot.lot_number) {
            return Err(duplicate("lots", &lot.lot_number));
        }
        lots.insert(lot.lot_number.clone(), VersionedRow::new(lot));
        Ok(())
    }

    fn lots_with_status(&self, status: LotStatus) -> Result<Vec<AuctionLot>> {
        self.check_available()?;
        let mut lots: Vec<_> = self
            .lots
            .read()
            .values()
            .filter(|v| v.row.status == status)
            .map(|v| v.row.clone())
            .collect();
        lots.sort_by(|a, b| a.lot_number.cmp(&b.lot_number));
        Ok(lots)
    }
}

impl BidStore for MemoryLedger {
    fn bid(&self, number: &BidNumber) -> Result<Option<VersionedRow<Bid>>> {
        self.check_available()?;
        Ok(self.bids.read().get(number).cloned())
    }

    fn bids_for_user(&self, email: &Email) -> Result<Vec<Bid>> {
        self.check_available()?;
        let mut bids: Vec<_> = self
            .bids
            .read()
            .values()
            .filter(|v| v.row.user_email == *email)
            .map(|v| v.row.clone())
            .collect();
        bids.sort_by_key(|b| b.created_at);
        Ok(bids)
    }

    fn bids_with_status(&self, status: BidStatus) -> Result<Vec<Bid>> {
        self.check_available()?;
        let mut bids: Vec<_> = self
            .bids
            .read()
            .values()
            .filter(|v| v.row.status == status)
            .map(|v| v.row.clone())
            .collect();
        bids.sort_by_key(|b| b.created_at);
        Ok(bids)
    }

    fn reference_in_use(&self, reference: &ReferenceNumber) -> Result<bool> {
        self.check_available()?;
        Ok(self
            .bids
            .read()
            .values()
            .any(|v| v.row.reference_number == *reference))
    }

    fn locked_bid_coins(&self) -> Result<Decimal> {
        self.check_available()?;
        Ok(self
            .bids
            .read()
            .values()
            .filter(|v| v.row.status == BidStatus::Approved)
            .map(|v| v.row.original_coins)
            .sum())
    }
}

impl BankStore for MemoryLedger {
    fn bank(&self, name: &str) -> Result<Option<VersionedRow<BankAccount>>> {
        self.check_available()?;
        Ok(self.banks.read().get(name).cloned())
    }

    fn insert_bank(&self, bank: BankAccount) -> Result<()> {
        self.check_available()?;
        let mut banks = self.banks.write();
        if banks.contains_key(&bank.bank_name) {
            return Err(duplicate("banks", &bank.bank_name));
        }
        if bank.coin_balance > Decimal::ZERO {
            self.books.write().issued += bank.coin_balance;
        }
        banks.insert(bank.bank_name.clone(), VersionedRow::new(bank));
        Ok(())
    }

    fn total_bank_coins(&self) -> Result<Decimal> {
        self.check_available()?;
        Ok(self.banks.read().values().map(|v| v.row.coin_balance).sum())
    }
}

impl ApprovalStore for MemoryLedger {
    fn approval(&self, id: &ApprovalId) -> Result<Option<VersionedRow<PendingApproval>>> {
        self.check_available()?;
        Ok(self.approvals.read().get(id).cloned())
    }

    fn open_approvals(&self) -> Result<Vec<PendingApproval>> {
        self.check_available()?;
        let mut open: Vec<_> = self
            .approvals
            .read()
            .values()
            .filter(|v| !v.row.is_resolved())
            .map(|v| v.row.clone())
            .collect();
        // ApprovalIds are v7, so this is oldest-first.
        open.sort_by_key(|a| a.id);
        Ok(open)
    }
}

impl ChatStore for MemoryLedger {
    fn chat(&self, id: &ChatId) -> Result<Option<VersionedRow<SupportChat>>> {
        self.check_available()?;
        Ok(self.chats.read().get(id).cloned())
    }

    fn insert_chat(&self, chat: SupportChat) -> Result<()> {
        self.check_available()?;
        let mut chats = self.chats.write();
        if chats.contains_key(&chat.id) {
            return Err(duplicate("chats", &chat.id));
        }
        chats.insert(chat.id, VersionedRow::new(chat));
        Ok(())
    }

    fn chats_for_user(&self, email: &Email) -> Result<Vec<SupportChat>> {
        self.check_available()?;
        let mut chats: Vec<_> = self
            .chats
            .read()
            .values()
            .filter(|v| v.row.user_email == *email)
            .map(|v| v.row.clone())
            .collect();
        chats.sort_by_key(|c| c.id);
        Ok(chats)
    }
}

impl ConfigStore for MemoryLedger {
    fn auction_config(&self) -> Result<AuctionConfig> {
        self.check_available()?;
        Ok(self.auction_config.read().clone())
    }

    fn put_auction_config(&self, config: AuctionConfig) -> Result<()> {
        self.check_available()?;
        *self.auction_config.write() = config;
        Ok(())
    }
}

impl IssuanceStore for MemoryLedger {
    fn issued_total(&self) -> Result<Decimal> {
        self.check_available()?;
        Ok(self.books.read().issued)
    }

    fn retired_total(&self) -> Result<Decimal> {
        self.check_available()?;
        Ok(self.books.read().retired)
    }
}
