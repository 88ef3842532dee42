//! Repository traits and the commit batch.
//!
//! Each entity gets a narrow read/insert trait; every state *mutation* rides
//! a [`CommitBatch`] through [`Commit::commit`], which applies all of its
//! operations or none of them. The [`Ledger`] supertrait bundles the lot for
//! engine code.
//!
//! Two bookkeeping rules keep coin conservation checkable:
//!
//! - Inserting a user or bank account records its initial `coin_balance` as
//!   issuance (the welcome bonus and seeded accounts enter the books there).
//! - Commits that mint or burn coins must say so with
//!   [`CommitBatch::record_issuance`] / [`CommitBatch::record_retirement`].
//!   All other commits must leave the coin census unchanged.

use rust_decimal::Decimal;

use openlot_types::{
    ApprovalId, AuctionConfig, AuctionLot, BankAccount, Bid, BidNumber, BidStatus, ChatId, Email,
    LotNumber, LotStatus, PendingApproval, ReferenceNumber, Result, SupportChat, User,
};

use crate::row::VersionedRow;

// ---------------------------------------------------------------------------
// Commit batch
// ---------------------------------------------------------------------------

/// One operation inside a [`CommitBatch`].
///
/// `expect` carries the row version the writer read; the commit fails with
/// `VersionConflict` if the stored version differs.
#[derive(Debug, Clone)]
pub enum CommitOp {
    InsertBid(Bid),
    UpdateBid { expect: u64, bid: Bid },
    UpdateLot { expect: u64, lot: AuctionLot },
    UpdateUser { expect: u64, user: User },
    UpdateBank { expect: u64, bank: BankAccount },
    InsertApproval(PendingApproval),
    UpdateApproval { expect: u64, approval: PendingApproval },
    UpdateChat { expect: u64, chat: SupportChat },
    /// Declare that this batch mints `0` or more coins into the census.
    RecordIssuance(Decimal),
    /// Declare that this batch burns `0` or more coins from the census.
    RecordRetirement(Decimal),
}

/// An ordered set of row operations applied atomically.
///
/// A batch must touch each row at most once; the version checks assume every
/// `expect` was read from the store as it stands when the batch commits.
#[derive(Debug, Clone, Default)]
pub struct CommitBatch {
    ops: Vec<CommitOp>,
}

impl CommitBatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_bid(&mut self, bid: Bid) -> &mut Self {
        self.ops.push(CommitOp::InsertBid(bid));
        self
    }

    pub fn update_bid(&mut self, expect: u64, bid: Bid) -> &mut Self {
        self.ops.push(CommitOp::UpdateBid { expect, bid });
        self
    }

    pub fn update_lot(&mut self, expect: u64, lot: AuctionLot) -> &mut Self {
        self.ops.push(CommitOp::UpdateLot { expect, lot });
        self
    }

    pub fn update_user(&mut self, expect: u64, user: User) -> &mut Self {
        self.ops.push(CommitOp::UpdateUser { expect, user });
        self
    }

    pub fn update_bank(&mut self, expect: u64, bank: BankAccount) -> &mut Self {
        self.ops.push(CommitOp::UpdateBank { expect, bank });
        self
    }

    pub fn insert_approval(&mut self, approval: PendingApproval) -> &mut Self {
        self.ops.push(CommitOp::InsertApproval(approval));
        self
    }

    pub fn update_approval(&mut self, expect: u64, approval: PendingApproval) -> &mut Self {
        self.ops.push(CommitOp::UpdateApproval { expect, approval });
        self
    }

    pub fn update_chat(&mut self, expect: u64, chat: SupportChat) -> &mut Self {
        self.ops.push(CommitOp::UpdateChat { expect, chat });
        self
    }

    pub fn record_issuance(&mut self, amount: Decimal) -> &mut Self {
        self.ops.push(CommitOp::RecordIssuance(amount));
        self
    }

    pub fn record_retirement(&mut self, amount: Decimal) -> &mut Self {
        self.ops.push(CommitOp::RecordRetirement(amount));
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    #[must_use]
    pub fn ops(&self) -> &[CommitOp] {
        &self.ops
    }

    #[must_use]
    pub fn into_ops(self) -> Vec<CommitOp> {
        self.ops
    }
}

// ---------------------------------------------------------------------------
// Per-entity repositories
// ---------------------------------------------------------------------------

pub trait UserStore {
    fn user(&self, email: &Email) -> Result<Option<VersionedRow<User>>>;

    /// Insert a new account, recording its initial coins as issuance.
    fn insert_user(&self, user: User) -> Result<()>;

    /// Sum of all user `coin_balance` fields.
    fn total_user_coins(&self) -> Result<Decimal>;
}

pub trait LotStore {
    fn lot(&self, number: &LotNumber) -> Result<Option<VersionedRow<AuctionLot>>>;

    fn insert_lot(&self, lot: AuctionLot) -> Result<()>;

    fn lots_with_status(&self, status: LotStatus) -> Result<Vec<AuctionLot>>;
}

pub trait BidStore {
    fn bid(&self, number: &BidNumber) -> Result<Option<VersionedRow<Bid>>>;

    fn bids_for_user(&self, email: &Email) -> Result<Vec<Bid>>;

    fn bids_with_status(&self, status: BidStatus) -> Result<Vec<Bid>>;

    /// Whether any bid already carries this payment reference. Linear scan;
    /// called at placement rate only.
    fn reference_in_use(&self, reference: &ReferenceNumber) -> Result<bool>;

    /// Sum of `original_coins` over approved bids: the locked term of the
    /// coin census.
    fn locked_bid_coins(&self) -> Result<Decimal>;
}

pub trait BankStore {
    fn bank(&self, name: &str) -> Result<Option<VersionedRow<BankAccount>>>;

    /// Insert a new account, recording its initial coins as issuance.
    fn insert_bank(&self, bank: BankAccount) -> Result<()>;

    /// Sum of all bank `coin_balance` fields.
    fn total_bank_coins(&self) -> Result<Decimal>;
}

pub trait ApprovalStore {
    fn approval(&self, id: &ApprovalId) -> Result<Option<VersionedRow<PendingApproval>>>;

    /// Approvals not yet decided, oldest first.
    fn open_approvals(&self) -> Result<Vec<PendingApproval>>;
}

pub trait ChatStore {
    fn chat(&self, id: &ChatId) -> Result<Option<VersionedRow<SupportChat>>>;

    fn insert_chat(&self, chat: SupportChat) -> Result<()>;

    fn chats_for_user(&self, email: &Email) -> Result<Vec<SupportChat>>;
}

/// The auction-cycle singleton. Plain last-write-wins; admins are the only
/// writers and the engine never reads it on the bid path.
pub trait ConfigStore {
    fn auction_config(&self) -> Result<AuctionConfig>;

    fn put_auction_config(&self, config: AuctionConfig) -> Result<()>;
}

/// Running issuance/retirement totals, fed by account inserts and explicit
/// `Record*` commit ops.
pub trait IssuanceStore {
    fn issued_total(&self) -> Result<Decimal>;

    fn retired_total(&self) -> Result<Decimal>;
}

pub trait Commit {
    /// Apply every operation in `batch` or none of them.
    ///
    /// Readers never observe a partially applied batch.
    fn commit(&self, batch: CommitBatch) -> Result<()>;
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// Everything the engines need from a backing store.
pub trait Ledger:
    UserStore
    + LotStore
    + BidStore
    + BankStore
    + ApprovalStore
    + ChatStore
    + ConfigStore
    + IssuanceStore
    + Commit
    + Send
    + Sync
{
    /// Every coin the store knows about: user wallets, bank reserves, and
    /// coins locked in approved bids.
    ///
    /// Meaningful on a quiescent store; concurrent commits between the three
    /// component reads can skew the sum.
    fn coin_census(&self) -> Result<Decimal> {
        Ok(self.total_user_coins()? + self.total_bank_coins()? + self.locked_bid_coins()?)
    }
}

impl<T> Ledger for T where
    T: UserStore
        + LotStore
        + BidStore
        + BankStore
        + ApprovalStore
        + ChatStore
        + ConfigStore
        + IssuanceStore
        + Commit
        + Send
        + Sync
{
}
