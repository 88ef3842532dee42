//! Coin conservation auditing.
//!
//! Coins enter the system through account seeding, welcome bonuses, and
//! positive admin adjustments, and leave only through negative adjustments.
//! Everything in between (approval, rejection, maturation) moves coins
//! between user wallets, bank reserves, and the locked term of approved bids
//! without changing the total. The ledger records entries and exits as
//! issuance and retirement; [`audit`] recomputes the census and compares.

use rust_decimal::Decimal;

use openlot_store::Ledger;
use openlot_types::{OpenlotError, Result};

/// Snapshot of the books at audit time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConservationReport {
    pub issued: Decimal,
    pub retired: Decimal,
    /// `issued - retired`: every coin the census should contain.
    pub expected: Decimal,
    /// The census as counted: user wallets + bank reserves + locked bids.
    pub actual: Decimal,
}

/// Verify that the coin census matches the issuance books.
///
/// Call between operations; the census reads are not atomic against
/// concurrent commits.
pub fn audit<L: Ledger>(ledger: &L) -> Result<ConservationReport> {
    let issued = ledger.issued_total()?;
    let retired = ledger.retired_total()?;
    let expected = issued - retired;
    let actual = ledger.coin_census()?;

    if actual != expected {
        return Err(OpenlotError::ConservationViolation {
            reason: format!(
                "census holds {actual} coins but the books expect {expected} \
                 ({issued} issued, {retired} retired)"
            ),
        });
    }

    Ok(ConservationReport {
        issued,
        retired,
        expected,
        actual,
    })
}
