//! Engine-wide constants.
//!
//! Fixed identifier formats and hard process limits live here. Tunable
//! business parameters (holding terms, welcome bonus, retry budgets) live in
//! [`crate::EngineConfig`] so deployments can override them; the defaults in
//! that config are derived from the `DEFAULT_*` values below.

/// Number of decimal digits in a bid number ("000000".."999999").
pub const BID_NUMBER_DIGITS: usize = 6;

/// Size of the bid-number space. Bid numbers are drawn uniformly from
/// `0..BID_NUMBER_SPACE` and zero-padded to [`BID_NUMBER_DIGITS`].
pub const BID_NUMBER_SPACE: u32 = 1_000_000;

/// Length of a payment reference number in uppercase hex characters.
pub const REFERENCE_NUMBER_LEN: usize = 10;

/// Domain-separation tag for reference-number derivation.
pub const REFERENCE_DOMAIN_TAG: &[u8] = b"openlot:reference:v1:";

/// How many fresh candidates an identifier generator tries before giving up
/// with `IdentifierSpaceExhausted`. Collisions are rare until the store holds
/// a large fraction of the 10^6 bid-number space, so a small cap suffices.
pub const MAX_IDENTIFIER_ATTEMPTS: u32 = 32;

// ---------------------------------------------------------------------------
// Config defaults
// ---------------------------------------------------------------------------

/// Default number of optimistic-concurrency retries before an operation
/// reports the store as unavailable.
pub const DEFAULT_MAX_CAS_RETRIES: u32 = 16;

/// Default welcome bonus (in coins) credited to a newly registered user.
pub const DEFAULT_WELCOME_BONUS_COINS: i64 = 1000;

/// Default interval between scheduled settlement sweeps, in seconds.
pub const DEFAULT_SETTLEMENT_INTERVAL_SECS: u64 = 60;

/// Maximum number of bid numbers remembered by the settlement maturity guard.
pub const MATURITY_GUARD_CACHE_SIZE: usize = 100_000;

/// Maximum number of undrained bid-created events held by the approval-gate
/// inbox before the oldest are evicted.
pub const GATE_INBOX_CAPACITY: usize = 10_000;
