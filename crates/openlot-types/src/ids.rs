//! Strongly-typed identifiers.
//!
//! Two families live here:
//!
//! - **Opaque ids** ([`ApprovalId`], [`ChatId`]): newtypes over UUIDv7 so the
//!   compiler rejects cross-domain mixups and ids sort by creation time.
//! - **Customer-facing numbers** ([`BidNumber`], [`ReferenceNumber`],
//!   [`LotNumber`], [`Email`]): short strings that users read aloud to support
//!   staff or type into a payment form. These are newtypes over `String` with
//!   a fixed derivation, not free-form text.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::constants::{BID_NUMBER_SPACE, REFERENCE_DOMAIN_TAG, REFERENCE_NUMBER_LEN};

// ---------------------------------------------------------------------------
// ApprovalId
// ---------------------------------------------------------------------------

/// Unique identifier for a pending payment approval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ApprovalId(pub Uuid);

impl ApprovalId {
    /// Generate a fresh time-ordered id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Milliseconds since the Unix epoch, extracted from the v7 timestamp bits.
    #[must_use]
    pub fn timestamp_ms(&self) -> u64 {
        let bytes = self.0.as_bytes();
        (u64::from(bytes[0]) << 40)
            | (u64::from(bytes[1]) << 32)
            | (u64::from(bytes[2]) << 24)
            | (u64::from(bytes[3]) << 16)
            | (u64::from(bytes[4]) << 8)
            | u64::from(bytes[5])
    }
}

impl Default for ApprovalId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ApprovalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "apv:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// ChatId
// ---------------------------------------------------------------------------

/// Unique identifier for a support chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChatId(pub Uuid);

impl ChatId {
    /// Generate a fresh time-ordered id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for ChatId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ChatId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "chat:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// BidNumber
// ---------------------------------------------------------------------------

/// Six-digit customer-facing bid number, e.g. `"042517"`.
///
/// The number is the primary key of a bid. It is drawn at random from a
/// 10^6 space, so the engine checks the store for collisions and redraws on a
/// hit rather than assuming uniqueness.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BidNumber(pub String);

impl BidNumber {
    /// Format an index in `0..BID_NUMBER_SPACE` as a zero-padded bid number.
    /// Indices outside the space wrap around.
    #[must_use]
    pub fn from_index(index: u32) -> Self {
        Self(format!("{:06}", index % BID_NUMBER_SPACE))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BidNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// ReferenceNumber
// ---------------------------------------------------------------------------

/// Payment reference number: ten uppercase hex characters the payer quotes on
/// their bank transfer, e.g. `"7F03A21C9B"`.
///
/// Derived by hashing a per-bid seed under a domain-separation tag, so the
/// value is unguessable from the bid number, stable for a given
/// `(seed, attempt)` pair, and cheap to redraw when the store reports a
/// collision (bump `attempt`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ReferenceNumber(pub String);

impl ReferenceNumber {
    /// Derive the reference number for `seed` at the given collision-retry
    /// `attempt`.
    #[must_use]
    pub fn derive(seed: Uuid, attempt: u32) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(REFERENCE_DOMAIN_TAG);
        hasher.update(seed.as_bytes());
        hasher.update(attempt.to_le_bytes());
        let digest = hasher.finalize();

        // 10 hex chars = 5 digest bytes.
        let hex = hex::encode(&digest[..REFERENCE_NUMBER_LEN / 2]);
        Self(hex.to_uppercase())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ReferenceNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// LotNumber
// ---------------------------------------------------------------------------

/// Identifier of an auction lot as published by the auction scheduler,
/// e.g. `"13878"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LotNumber(pub String);

impl LotNumber {
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for LotNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Email
// ---------------------------------------------------------------------------

/// Normalized email address used as the primary key of a user account.
///
/// Construction trims surrounding whitespace and lowercases, so lookups are
/// insensitive to how the address was typed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Email(String);

impl Email {
    #[must_use]
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().trim().to_lowercase())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Email {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
