//! End-to-end integration tests across the whole bid lifecycle.
//!
//! These tests drive the three planes together on one shared in-memory
//! ledger: Bid Engine (placement) -> Approval Gate (claim + decision) ->
//! Settlement (maturity sweep).
//!
//! They verify the lifecycle in realistic scenarios: capacity racing,
//! decision racing, idempotent sweeps, maturity timing, store outages, and
//! the coin conservation invariant after every sequence of operations.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;

use openlot_engine::{ApprovalGate, BidEngine};
use openlot_settlement::{SettlementSweep, SettlementTicker, SweepReport, conservation};
use openlot_store::{BankStore, BidStore, Ledger, LotStore, MemoryLedger, UserStore};
use openlot_types::*;

/// Helper: the full lifecycle pipeline — place, claim, decide, mature.
struct AuctionPipeline {
    ledger: Arc<MemoryLedger>,
    engine: BidEngine<MemoryLedger>,
    gate: ApprovalGate<MemoryLedger>,
    sweep: SettlementSweep<MemoryLedger>,
}

impl AuctionPipeline {
    /// One seller bank with 500,000 coins and one lot of 10,145 coins
    /// accepting bids of 100..=15,000.
    fn new() -> Self {
        let ledger = Arc::new(MemoryLedger::new());
        ledger
            .insert_bank(BankAccount::dummy("FNB RSA", Decimal::new(500_000, 0)))
            .unwrap();
        ledger
            .insert_lot(AuctionLot::dummy(
                "13878",
                Decimal::new(10_145, 0),
                Decimal::new(100, 0),
                Decimal::new(15_000, 0),
            ))
            .unwrap();

        let engine = BidEngine::new(Arc::clone(&ledger), EngineConfig::default());
        let gate = ApprovalGate::new(
            Arc::clone(&ledger),
            EngineConfig::default(),
            engine.inbox(),
        );
        let sweep = SettlementSweep::new(Arc::clone(&ledger), EngineConfig::default());
        Self {
            ledger,
            engine,
            gate,
            sweep,
        }
    }

    fn register(&self, email: &str) -> User {
        self.engine
            .register_user(&Email::new(email), "Test Bidder", "+27830000000", Utc::now())
            .unwrap()
    }

    fn place(&self, email: &str, amount: i64, days: u32, now: DateTime<Utc>) -> Bid {
        self.engine
            .place_bid(
                &Email::new(email),
                &LotNumber::new("13878"),
                Decimal::new(amount, 0),
                days,
                now,
            )
            .unwrap()
    }

    fn claim(&self, bid: &Bid, now: DateTime<Utc>) -> PendingApproval {
        self.gate
            .claim_payment(
                &bid.bid_number,
                &bid.reference_number,
                &bid.user_email,
                None,
                now,
            )
            .unwrap()
    }

    fn approve(&self, approval: &PendingApproval, now: DateTime<Utc>) -> Bid {
        self.gate
            .decide(&approval.id, Decision::Approve, "admin@openlot", now)
            .unwrap()
    }

    fn reject(&self, approval: &PendingApproval, now: DateTime<Utc>) -> Bid {
        self.gate
            .decide(&approval.id, Decision::Reject, "admin@openlot", now)
            .unwrap()
    }

    /// Place, claim, and approve in one go.
    fn invest(&self, email: &str, amount: i64, days: u32, now: DateTime<Utc>) -> Bid {
        let bid = self.place(email, amount, days, now);
        let approval = self.claim(&bid, now);
        self.approve(&approval, now)
    }

    fn mature(&mut self, now: DateTime<Utc>) -> SweepReport {
        self.sweep.mature_due(now).unwrap()
    }

    fn user_balance(&self, email: &str) -> Decimal {
        self.ledger
            .user(&Email::new(email))
            .unwrap()
            .unwrap()
            .row
            .coin_balance
    }

    fn bank_balance(&self) -> Decimal {
        self.ledger.bank("FNB RSA").unwrap().unwrap().row.coin_balance
    }

    fn lot_remaining(&self) -> Decimal {
        self.ledger
            .lot(&LotNumber::new("13878"))
            .unwrap()
            .unwrap()
            .row
            .remaining()
    }

    fn bid_status(&self, number: &BidNumber) -> BidStatus {
        self.ledger.bid(number).unwrap().unwrap().row.status
    }

    /// Assert the coin census matches the issuance books.
    fn audit(&self) {
        conservation::audit(self.ledger.as_ref()).unwrap();
    }
}

// =============================================================================
// Test: Full happy path — place, claim, approve, mature
// =============================================================================
#[test]
fn e2e_full_lifecycle() {
    let mut pipeline = AuctionPipeline::new();
    pipeline.register("john@example.com");
    let t0 = Utc::now();

    // Place: capacity reserved, wallet untouched (payment happens off-system).
    let bid = pipeline.place("john@example.com", 1000, 10, t0);
    assert_eq!(bid.status, BidStatus::PendingPayment);
    assert_eq!(pipeline.lot_remaining(), Decimal::new(9145, 0));
    assert_eq!(
        pipeline.user_balance("john@example.com"),
        Decimal::new(1000, 0),
        "placement must not touch the wallet"
    );
    assert_eq!(pipeline.gate.unclaimed_bids().len(), 1);
    pipeline.audit();

    // Claim: filed for review, pulled off the unclaimed inbox.
    let approval = pipeline.claim(&bid, t0);
    assert!(!approval.is_resolved());
    assert!(pipeline.gate.unclaimed_bids().is_empty());
    assert_eq!(pipeline.bid_status(&bid.bid_number), BidStatus::AwaitingApproval);
    pipeline.audit();

    // Approve: dates fixed, principal locked out of the bank reserve.
    let approved = pipeline.approve(&approval, t0);
    assert_eq!(approved.status, BidStatus::Approved);
    assert_eq!(approved.purchase_date, Some(t0));
    assert_eq!(approved.maturity_date, Some(t0 + Duration::days(10)));
    assert_eq!(pipeline.bank_balance(), Decimal::new(499_000, 0));
    let user = pipeline
        .ledger
        .user(&Email::new("john@example.com"))
        .unwrap()
        .unwrap()
        .row;
    assert_eq!(user.active_investments, 1);
    pipeline.audit();

    // Mature: 1000 @ 10 days pays 1070 into the wallet.
    let report = pipeline.mature(t0 + Duration::days(10));
    assert_eq!(report.matured.len(), 1);
    assert_eq!(report.total_payout(), Decimal::new(1070, 0));
    assert_eq!(
        pipeline.user_balance("john@example.com"),
        Decimal::new(2070, 0)
    );
    assert_eq!(pipeline.bank_balance(), Decimal::new(498_930, 0));

    let user = pipeline
        .ledger
        .user(&Email::new("john@example.com"))
        .unwrap()
        .unwrap()
        .row;
    assert_eq!(user.active_investments, 0);
    assert_eq!(user.total_invested, Decimal::new(1000, 0));

    let stored = pipeline.ledger.bid(&bid.bid_number).unwrap().unwrap().row;
    assert_eq!(stored.status, BidStatus::Matured);
    assert_eq!(stored.matured_coins, Some(Decimal::new(1070, 0)));
    pipeline.audit();
}

// =============================================================================
// Test: Racing placements never over-allocate a lot
// =============================================================================
#[test]
fn e2e_placement_race_never_overallocates() {
    let pipeline = AuctionPipeline::new();
    pipeline.register("racer@example.com");
    pipeline
        .engine
        .publish_lot(AuctionLot::dummy(
            "11528",
            Decimal::new(5500, 0),
            Decimal::new(100, 0),
            Decimal::new(5000, 0),
        ))
        .unwrap();

    let now = Utc::now();
    let email = Email::new("racer@example.com");
    let lot = LotNumber::new("11528");

    // Six threads race 1000-coin bids at 5500 coins of capacity.
    let results: Vec<Result<Bid>> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..6)
            .map(|_| {
                let engine = &pipeline.engine;
                let email = &email;
                let lot = &lot;
                s.spawn(move || engine.place_bid(email, lot, Decimal::new(1000, 0), 5, now))
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let winners = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 5, "exactly the capacity's worth of bids must land");

    let losers: Vec<_> = results.iter().filter_map(|r| r.as_ref().err()).collect();
    assert_eq!(losers.len(), 1);
    assert!(matches!(
        losers[0],
        OpenlotError::InsufficientLotCapacity { .. }
    ));

    let stored = pipeline.ledger.lot(&lot).unwrap().unwrap().row;
    assert_eq!(stored.reserved_coins, Decimal::new(5000, 0));
    assert_eq!(stored.remaining(), Decimal::new(500, 0));
    pipeline.audit();
}

// =============================================================================
// Test: Racing decisions admit exactly one winner
// =============================================================================
#[test]
fn e2e_racing_decisions_admit_one_winner() {
    let pipeline = AuctionPipeline::new();
    pipeline.register("john@example.com");
    let now = Utc::now();
    let bid = pipeline.place("john@example.com", 1000, 10, now);
    let approval = pipeline.claim(&bid, now);

    let decisions = [Decision::Approve, Decision::Reject];
    let results: Vec<Result<Bid>> = std::thread::scope(|s| {
        let handles: Vec<_> = decisions
            .iter()
            .map(|decision| {
                let gate = &pipeline.gate;
                let id = &approval.id;
                s.spawn(move || gate.decide(id, *decision, "admin@openlot", now))
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let winners = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1, "exactly one of two racing decisions may land");
    // Depending on when the loser re-reads, it sees either the resolved
    // approval or the already-moved bid.
    assert!(results.iter().any(|r| matches!(
        r,
        Err(OpenlotError::AlreadyDecided(_) | OpenlotError::BidNotAwaitingApproval(_))
    )));

    // The bid sits in exactly one decided state and the books still balance.
    let status = pipeline.bid_status(&bid.bid_number);
    assert!(matches!(status, BidStatus::Approved | BidStatus::Rejected));
    pipeline.audit();
}

// =============================================================================
// Test: Sweeping twice credits the user exactly once
// =============================================================================
#[test]
fn e2e_sweep_is_idempotent() {
    let mut pipeline = AuctionPipeline::new();
    pipeline.register("john@example.com");
    let t0 = Utc::now();
    pipeline.invest("john@example.com", 1000, 10, t0);

    let due = t0 + Duration::days(10);
    let first = pipeline.mature(due);
    assert_eq!(first.matured.len(), 1);
    let balance = pipeline.user_balance("john@example.com");
    assert_eq!(balance, Decimal::new(2070, 0));

    let second = pipeline.mature(due);
    assert!(second.matured.is_empty());
    assert_eq!(second.skipped, 0);
    assert_eq!(pipeline.user_balance("john@example.com"), balance);
    pipeline.audit();
}

// =============================================================================
// Test: Capacity accounting on a 10,145-coin lot
// =============================================================================
#[test]
fn e2e_capacity_scenario() {
    let pipeline = AuctionPipeline::new();
    pipeline.register("john@example.com");
    let now = Utc::now();

    // A 6000-coin bid goes all the way to approval.
    let a = pipeline.place("john@example.com", 6000, 10, now);
    let approval = pipeline.claim(&a, now);
    pipeline.approve(&approval, now);
    assert_eq!(pipeline.lot_remaining(), Decimal::new(4145, 0));

    // 5000 no longer fits.
    let err = pipeline
        .engine
        .place_bid(
            &Email::new("john@example.com"),
            &LotNumber::new("13878"),
            Decimal::new(5000, 0),
            10,
            now,
        )
        .unwrap_err();
    assert!(matches!(
        err,
        OpenlotError::InsufficientLotCapacity { requested, remaining }
            if requested == Decimal::new(5000, 0) && remaining == Decimal::new(4145, 0)
    ));

    // The exact remainder does.
    pipeline.place("john@example.com", 4145, 5, now);
    assert_eq!(pipeline.lot_remaining(), Decimal::ZERO);
    pipeline.audit();
}

// =============================================================================
// Test: A bid matures on its maturity date, not a day before
// =============================================================================
#[test]
fn e2e_maturity_boundary() {
    let mut pipeline = AuctionPipeline::new();
    pipeline.register("john@example.com");
    let t0 = Utc::now();
    let bid = pipeline.invest("john@example.com", 1000, 5, t0);

    let early = pipeline.mature(t0 + Duration::days(4));
    assert!(early.matured.is_empty());
    assert_eq!(pipeline.bid_status(&bid.bid_number), BidStatus::Approved);
    assert_eq!(
        pipeline.user_balance("john@example.com"),
        Decimal::new(1000, 0)
    );

    let on_time = pipeline.mature(t0 + Duration::days(5));
    assert_eq!(on_time.matured.len(), 1);
    assert_eq!(pipeline.bid_status(&bid.bid_number), BidStatus::Matured);
    assert_eq!(
        pipeline.user_balance("john@example.com"),
        Decimal::new(2050, 0)
    );
    pipeline.audit();
}

// =============================================================================
// Test: Each holding term pays its configured multiplier
// =============================================================================
#[test]
fn e2e_terms_pay_configured_multipliers() {
    let mut pipeline = AuctionPipeline::new();
    pipeline.register("john@example.com");
    let t0 = Utc::now();
    pipeline.invest("john@example.com", 1000, 5, t0);
    pipeline.invest("john@example.com", 1000, 10, t0);
    pipeline.invest("john@example.com", 1000, 20, t0);

    let report = pipeline.mature(t0 + Duration::days(20));
    assert_eq!(report.matured.len(), 3);

    let mut payouts: Vec<Decimal> = report.matured.iter().map(|m| m.matured_coins).collect();
    payouts.sort();
    assert_eq!(
        payouts,
        vec![
            Decimal::new(1050, 0),
            Decimal::new(1070, 0),
            Decimal::new(1100, 0)
        ]
    );

    // 1000 welcome bonus + 3220 in payouts.
    assert_eq!(
        pipeline.user_balance("john@example.com"),
        Decimal::new(4220, 0)
    );
    let user = pipeline
        .ledger
        .user(&Email::new("john@example.com"))
        .unwrap()
        .unwrap()
        .row;
    assert_eq!(user.total_invested, Decimal::new(3000, 0));
    assert_eq!(user.active_investments, 0);
    pipeline.audit();
}

// =============================================================================
// Test: Coin conservation across the whole lifecycle
// =============================================================================
#[test]
fn e2e_conservation_holds_across_the_lifecycle() {
    let mut pipeline = AuctionPipeline::new();
    assert_eq!(
        pipeline.ledger.coin_census().unwrap(),
        Decimal::new(500_000, 0)
    );

    // Registration is issuance: two welcome bonuses enter the books.
    pipeline.register("john@example.com");
    pipeline.register("sarah.j@example.com");
    assert_eq!(
        pipeline.ledger.coin_census().unwrap(),
        Decimal::new(502_000, 0)
    );
    pipeline.audit();

    // A full approve-and-mature plus a rejection move plenty of coins
    // around, but never in or out.
    let t0 = Utc::now();
    pipeline.invest("john@example.com", 2000, 10, t0);
    let dropped_bid = pipeline.place("sarah.j@example.com", 800, 5, t0);
    let dropped = pipeline.claim(&dropped_bid, t0);
    pipeline.reject(&dropped, t0);
    pipeline.mature(t0 + Duration::days(10));

    assert_eq!(
        pipeline.ledger.coin_census().unwrap(),
        Decimal::new(502_000, 0),
        "lifecycle operations must conserve coins"
    );
    pipeline.audit();

    // Admin edits shift the total by exactly the recorded amount.
    pipeline
        .engine
        .adjust_user_coins(
            &Email::new("john@example.com"),
            Decimal::new(500, 0),
            "admin@openlot",
            "promo",
        )
        .unwrap();
    assert_eq!(
        pipeline.ledger.coin_census().unwrap(),
        Decimal::new(502_500, 0)
    );
    pipeline.audit();

    pipeline
        .engine
        .adjust_bank_coins(
            "FNB RSA",
            Decimal::new(-2500, 0),
            "admin@openlot",
            "sweep to treasury",
        )
        .unwrap();
    assert_eq!(
        pipeline.ledger.coin_census().unwrap(),
        Decimal::new(500_000, 0)
    );
    pipeline.audit();
}

// =============================================================================
// Test: Lifecycle order is enforced at every step
// =============================================================================
#[test]
fn e2e_lifecycle_order_is_enforced() {
    let pipeline = AuctionPipeline::new();
    pipeline.register("john@example.com");
    let now = Utc::now();
    let bid = pipeline.place("john@example.com", 1000, 10, now);
    let approval = pipeline.claim(&bid, now);

    // Claiming again while queued for review.
    let err = pipeline
        .gate
        .claim_payment(
            &bid.bid_number,
            &bid.reference_number,
            &bid.user_email,
            None,
            now,
        )
        .unwrap_err();
    assert!(matches!(err, OpenlotError::AlreadyClaimed(_)));

    pipeline.approve(&approval, now);

    // Claiming an approved bid: the state machine rejects the move.
    let err = pipeline
        .gate
        .claim_payment(
            &bid.bid_number,
            &bid.reference_number,
            &bid.user_email,
            None,
            now,
        )
        .unwrap_err();
    assert!(matches!(
        err,
        OpenlotError::InvalidTransition {
            from: BidStatus::Approved,
            to: BidStatus::AwaitingApproval,
            ..
        }
    ));

    // Re-deciding the consumed approval.
    let err = pipeline
        .gate
        .decide(&approval.id, Decision::Reject, "admin@openlot", now)
        .unwrap_err();
    assert!(matches!(err, OpenlotError::AlreadyDecided(_)));
}

// =============================================================================
// Test: A store outage fails operations cleanly, with no partial writes
// =============================================================================
#[test]
fn e2e_store_outage_leaves_no_partial_writes() {
    let pipeline = AuctionPipeline::new();
    pipeline.register("john@example.com");
    let now = Utc::now();
    let remaining_before = pipeline.lot_remaining();

    pipeline.ledger.fail_next_ops(1);
    let err = pipeline
        .engine
        .place_bid(
            &Email::new("john@example.com"),
            &LotNumber::new("13878"),
            Decimal::new(1000, 0),
            10,
            now,
        )
        .unwrap_err();
    assert!(matches!(err, OpenlotError::StoreUnavailable));

    // Nothing changed while the store was down.
    assert_eq!(pipeline.lot_remaining(), remaining_before);
    assert!(pipeline
        .ledger
        .bids_for_user(&Email::new("john@example.com"))
        .unwrap()
        .is_empty());

    // Back up: the same call goes through.
    let bid = pipeline.place("john@example.com", 1000, 10, now);

    // An outage during a claim leaves the bid and the queue untouched.
    pipeline.ledger.fail_next_ops(1);
    let err = pipeline
        .gate
        .claim_payment(
            &bid.bid_number,
            &bid.reference_number,
            &bid.user_email,
            None,
            now,
        )
        .unwrap_err();
    assert!(matches!(err, OpenlotError::StoreUnavailable));
    assert_eq!(pipeline.bid_status(&bid.bid_number), BidStatus::PendingPayment);
    assert!(pipeline.gate.open_approvals().unwrap().is_empty());

    pipeline.claim(&bid, now);
    pipeline.audit();
}

// =============================================================================
// Test: The ticker drives sweeps on its interval
// =============================================================================
#[test]
fn e2e_ticker_drives_scheduled_sweeps() {
    let pipeline = AuctionPipeline::new();
    pipeline.register("john@example.com");
    let t0 = Utc::now();
    pipeline.invest("john@example.com", 1000, 5, t0);

    let mut ticker = SettlementTicker::new(Arc::clone(&pipeline.ledger), EngineConfig::default());

    // First tick sweeps immediately; the bid is not due yet.
    let report = ticker.tick(t0).unwrap().unwrap();
    assert!(report.matured.is_empty());

    // Inside the interval the gate stays closed.
    assert!(ticker.tick(t0 + Duration::seconds(30)).unwrap().is_none());

    // Day four: a sweep runs, the bid still is not due.
    let report = ticker.tick(t0 + Duration::days(4)).unwrap().unwrap();
    assert!(report.matured.is_empty());

    // Day five: the sweep pays out.
    let report = ticker.tick(t0 + Duration::days(5)).unwrap().unwrap();
    assert_eq!(report.matured.len(), 1);
    assert_eq!(
        pipeline.user_balance("john@example.com"),
        Decimal::new(2050, 0)
    );
    pipeline.audit();
}

// =============================================================================
// Test: A sold-out lot reopens when a rejection frees capacity
// =============================================================================
#[test]
fn e2e_sold_out_lot_reopens_on_rejection() {
    let pipeline = AuctionPipeline::new();
    pipeline.register("john@example.com");
    let now = Utc::now();

    // Fill the lot exactly: 6000 + 4145 = 10,145.
    pipeline.place("john@example.com", 6000, 10, now);
    let second = pipeline.place("john@example.com", 4145, 5, now);

    let stored = pipeline
        .ledger
        .lot(&LotNumber::new("13878"))
        .unwrap()
        .unwrap()
        .row;
    assert_eq!(stored.status, LotStatus::Sold);

    // Sold lots turn bidders away.
    let err = pipeline
        .engine
        .place_bid(
            &Email::new("john@example.com"),
            &LotNumber::new("13878"),
            Decimal::new(100, 0),
            5,
            now,
        )
        .unwrap_err();
    assert!(matches!(err, OpenlotError::LotUnavailable(_)));

    // Rejecting the second bid reopens the lot at its freed capacity.
    let approval = pipeline.claim(&second, now);
    pipeline.reject(&approval, now);

    let stored = pipeline
        .ledger
        .lot(&LotNumber::new("13878"))
        .unwrap()
        .unwrap()
        .row;
    assert_eq!(stored.status, LotStatus::Active);
    assert_eq!(stored.remaining(), Decimal::new(4145, 0));

    // And the freed capacity is biddable again.
    pipeline.place("john@example.com", 4000, 20, now);
    pipeline.audit();
}
