//! Interval scheduling for the maturity sweep.
//!
//! [`SettlementTicker`] wraps a [`SettlementSweep`] and decides, per tick,
//! whether enough time has passed since the last sweep to run another. The
//! caller drives it with an explicit clock — a runtime loop passes wall time,
//! tests pass whatever instant they want — so maturation timing is fully
//! scriptable and the crate needs no timer of its own.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use openlot_store::Ledger;
use openlot_types::{EngineConfig, Result};

use crate::sweep::{SettlementSweep, SweepReport};

/// Caller-driven scheduler around the settlement sweep.
pub struct SettlementTicker<L> {
    sweep: SettlementSweep<L>,
    interval: Duration,
    last_sweep: Option<DateTime<Utc>>,
}

impl<L: Ledger> SettlementTicker<L> {
    #[must_use]
    pub fn new(ledger: Arc<L>, config: EngineConfig) -> Self {
        // Out-of-range intervals clamp rather than panic; the gate then only
        // opens through `run_now`.
        let interval = Duration::from_std(config.settlement_interval).unwrap_or(Duration::MAX);
        Self {
            sweep: SettlementSweep::new(ledger, config),
            interval,
            last_sweep: None,
        }
    }

    /// When the previous sweep ran, if any has.
    #[must_use]
    pub fn last_sweep(&self) -> Option<DateTime<Utc>> {
        self.last_sweep
    }

    /// Whether a tick at `now` would sweep. The first tick always does.
    #[must_use]
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        match self.last_sweep {
            None => true,
            Some(last) => now - last >= self.interval,
        }
    }

    /// Run the sweep if the interval has elapsed.
    ///
    /// Returns `Ok(None)` when the gate is still closed. A failed sweep does
    /// not advance the gate, so the next tick retries immediately.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Result<Option<SweepReport>> {
        if !self.is_due(now) {
            return Ok(None);
        }
        self.run_now(now).map(Some)
    }

    /// Run the sweep regardless of the interval and restart the gate from
    /// `now`. This is the on-demand entry point for admin tooling and tests.
    pub fn run_now(&mut self, now: DateTime<Utc>) -> Result<SweepReport> {
        let report = self.sweep.mature_due(now)?;
        self.last_sweep = Some(now);
        Ok(report)
    }
}
