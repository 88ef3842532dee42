//! # openlot-settlement
//!
//! **Settlement plane**: maturity sweeps, interval scheduling, and coin
//! conservation auditing.
//!
//! ## Architecture
//!
//! The settlement plane watches bids the approval gate moved into `Approved`
//! and, once their maturity date passes:
//! 1. Computes the payout (`original_coins` times the term multiplier)
//! 2. Credits the owner's wallet and moves their investment counters
//! 3. Charges the seller bank for the yield on top of the locked principal
//! 4. Marks the bid `Matured` — all in one atomic commit per bid
//!
//! Idempotency is layered: the status gate in the store makes re-sweeping a
//! no-op, and [`MaturityGuard`] blocks a repeat credit even off a stale read.
//! [`conservation::audit`] cross-checks the whole ledger against the
//! issuance books after any sequence of operations.

pub mod conservation;
pub mod maturity_guard;
pub mod sweep;
pub mod ticker;

pub use conservation::{ConservationReport, audit};
pub use maturity_guard::MaturityGuard;
pub use sweep::{MaturedBid, SettlementSweep, SweepReport};
pub use ticker::SettlementTicker;
