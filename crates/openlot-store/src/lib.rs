//! # openlot-store
//!
//! The storage plane of the OpenLot engine: versioned rows, narrow
//! per-entity repository traits, and an atomic commit primitive, plus the
//! in-memory implementation the engine runs on today.
//!
//! Engine crates are generic over [`Ledger`], so a persistent backend can
//! slot in later without touching lifecycle code. The concurrency contract
//! is optimistic: writers commit with the row versions they read and retry
//! on [`VersionConflict`](openlot_types::OpenlotError::VersionConflict).
//!
//! ## Architecture
//!
//! - [`row`]: [`VersionedRow`], the unit of optimistic concurrency
//! - [`repository`]: entity traits, [`CommitBatch`], and the [`Ledger`]
//!   supertrait with the coin census
//! - [`memory`]: [`MemoryLedger`], lock-per-collection with all-or-nothing
//!   commits

pub mod memory;
pub mod repository;
pub mod row;

pub use memory::MemoryLedger;
pub use repository::{
    ApprovalStore, BankStore, BidStore, ChatStore, Commit, CommitBatch, CommitOp, ConfigStore,
    IssuanceStore, Ledger, LotStore, UserStore,
};
pub use row::VersionedRow;
