//! # openlot-types
//!
//! Shared type definitions for the OpenLot bid lifecycle and settlement
//! engine. Every other crate in the workspace depends on this one and on
//! nothing else internal.
//!
//! ## Contents
//!
//! - [`ids`]: strongly-typed identifiers ([`BidNumber`], [`ReferenceNumber`],
//!   [`LotNumber`], [`Email`], [`ApprovalId`], [`ChatId`])
//! - [`bid`]: the [`Bid`] entity and its lifecycle state machine
//! - [`lot`]: auction lots, bid ranges, capacity accounting
//! - [`user`] / [`bank`]: the two coin-holding account kinds
//! - [`approval`]: pending payment approvals and their resolutions
//! - [`chat`]: support conversations
//! - [`config`]: engine and auction-cycle configuration
//! - [`error`]: the `OL_ERR_`-coded error taxonomy and [`Result`] alias
//! - [`constants`]: identifier formats and hard limits

pub mod approval;
pub mod bank;
pub mod bid;
pub mod chat;
pub mod config;
pub mod constants;
pub mod error;
pub mod ids;
pub mod lot;
pub mod user;

pub use approval::{Decision, PendingApproval, Resolution};
pub use bank::BankAccount;
pub use bid::{Bid, BidStatus};
pub use chat::{ChatMessage, ChatStatus, SupportChat};
pub use config::{AuctionConfig, EngineConfig, HoldingTerm};
pub use error::{OpenlotError, Result};
pub use ids::{ApprovalId, BidNumber, ChatId, Email, LotNumber, ReferenceNumber};
pub use lot::{AuctionLot, BidRange, LotStatus};
pub use user::{User, UserStatus};
