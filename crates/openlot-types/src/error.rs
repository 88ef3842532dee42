//! Error types for the OpenLot engine.
//!
//! Every variant renders with an `OL_ERR_` prefix and a numeric code grouped
//! by subsystem, so operators can grep logs and support staff can quote a
//! stable code to users:
//!
//! - `1xx` bid validation
//! - `2xx` lot catalog and capacity
//! - `3xx` approvals and bid lifecycle
//! - `4xx` settlement
//! - `5xx` store
//! - `6xx` accounts and support
//! - `9xx` internal

use rust_decimal::Decimal;
use thiserror::Error;

use crate::{ApprovalId, BidNumber, BidStatus, ChatId, Email, LotNumber};

/// Convenience alias used across all OpenLot crates.
pub type Result<T> = std::result::Result<T, OpenlotError>;

#[derive(Debug, Error)]
pub enum OpenlotError {
    // =========================================================================
    // Bid validation (100-199)
    // =========================================================================
    #[error("OL_ERR_100: bid amount must be positive (got {amount})")]
    InvalidAmount { amount: Decimal },

    #[error("OL_ERR_101: bid amount {amount} outside lot range {min}..={max}")]
    AmountOutOfRange {
        amount: Decimal,
        min: Decimal,
        max: Decimal,
    },

    #[error("OL_ERR_102: holding period {days} days is not an offered term")]
    InvalidHoldingPeriod { days: u32 },

    #[error("OL_ERR_103: reference number does not match bid {bid}")]
    ReferenceMismatch { bid: BidNumber },

    // =========================================================================
    // Lot catalog (200-299)
    // =========================================================================
    #[error("OL_ERR_200: lot {0} does not exist or is not open for bidding")]
    LotUnavailable(LotNumber),

    #[error("OL_ERR_201: bid {requested} exceeds remaining lot capacity {remaining}")]
    InsufficientLotCapacity {
        requested: Decimal,
        remaining: Decimal,
    },

    #[error("OL_ERR_202: lot {0} is already published")]
    DuplicateLot(LotNumber),

    // =========================================================================
    // Approvals and bid lifecycle (300-399)
    // =========================================================================
    #[error("OL_ERR_300: approval {0} does not exist")]
    ApprovalNotFound(ApprovalId),

    #[error("OL_ERR_301: approval {0} has already been decided")]
    AlreadyDecided(ApprovalId),

    #[error("OL_ERR_302: payment for bid {0} has already been claimed")]
    AlreadyClaimed(BidNumber),

    #[error("OL_ERR_303: bid {0} is not awaiting approval")]
    BidNotAwaitingApproval(BidNumber),

    #[error("OL_ERR_304: bid {bid} cannot move from {from} to {to}")]
    InvalidTransition {
        bid: BidNumber,
        from: BidStatus,
        to: BidStatus,
    },

    #[error("OL_ERR_305: bid {0} does not exist")]
    BidNotFound(BidNumber),

    // =========================================================================
    // Settlement (400-499)
    // =========================================================================
    #[error("OL_ERR_400: bid {0} has already matured")]
    BidAlreadyMatured(BidNumber),

    #[error("OL_ERR_401: coin conservation violated: {reason}")]
    ConservationViolation { reason: String },

    // =========================================================================
    // Store (500-599)
    // =========================================================================
    #[error("OL_ERR_500: store unavailable, no changes were applied")]
    StoreUnavailable,

    #[error("OL_ERR_501: version conflict on {collection} row {key}")]
    VersionConflict { collection: String, key: String },

    #[error("OL_ERR_502: duplicate key in {collection}: {key}")]
    DuplicateKey { collection: String, key: String },

    // =========================================================================
    // Accounts and support (600-699)
    // =========================================================================
    #[error("OL_ERR_600: no user registered as {0}")]
    UserNotFound(Email),

    #[error("OL_ERR_601: user {0} is already registered")]
    UserAlreadyRegistered(Email),

    #[error("OL_ERR_602: no bank account named {0}")]
    BankNotFound(String),

    #[error("OL_ERR_603: insufficient coins on {account}: requested {requested}, available {available}")]
    BalanceUnderflow {
        account: String,
        requested: Decimal,
        available: Decimal,
    },

    #[error("OL_ERR_604: support chat {0} does not exist")]
    ChatNotFound(ChatId),

    #[error("OL_ERR_605: support chat {0} is resolved and no longer accepts messages")]
    ChatClosed(ChatId),

    // =========================================================================
    // Internal (900-999)
    // =========================================================================
    #[error("OL_ERR_900: internal invariant violated: {0}")]
    Internal(String),

    #[error("OL_ERR_901: could not find a free {kind} after repeated draws")]
    IdentifierSpaceExhausted { kind: &'static str },

    #[error("OL_ERR_902: io error: {0}")]
    Io(String),
}

impl From<std::io::Error> for OpenlotError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
