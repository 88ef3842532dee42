//! # openlot-engine
//!
//! The lifecycle plane of OpenLot: bid placement with ordered validation,
//! payment claims, and the manual approval gate, plus the admin operations
//! around them (accounts, lot catalog, coin adjustments, support chats).
//!
//! ## Flow
//!
//! ```text
//!   place_bid ──► [PendingPayment] ──claim_payment──► [AwaitingApproval]
//!                                                          │ decide
//!                                              approve ◄───┴───► reject
//! ```
//!
//! Everything is generic over [`openlot_store::Ledger`]; writes go through
//! commit batches and retry on version conflicts.
//!
//! ## Architecture
//!
//! - [`validator`]: the five ordered placement checks
//! - [`bid_engine`]: placement, accounts, catalog, chats
//! - [`approval_gate`]: claims and decisions
//! - [`gate_inbox`]: bid-created events for review staff

pub mod approval_gate;
pub mod bid_engine;
pub mod gate_inbox;
pub mod validator;

pub use approval_gate::ApprovalGate;
pub use bid_engine::BidEngine;
pub use gate_inbox::{BidCreated, GateInbox};
pub use validator::BidValidator;

use openlot_types::OpenlotError;

/// Terminal error for a write that kept losing optimistic races.
pub(crate) fn retries_exhausted(op: &str) -> OpenlotError {
    tracing::warn!(op, "Giving up after repeated version conflicts");
    OpenlotError::StoreUnavailable
}
