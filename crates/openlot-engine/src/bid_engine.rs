//! Bid placement and account-facing operations.
//!
//! [`BidEngine`] is the write path for everything a user or admin does
//! outside payment review: placing bids, registering, publishing and closing
//! lots, adjusting coin supplies, and support chats. Every mutation follows
//! the same optimistic pattern: read versioned rows, validate, build a
//! [`CommitBatch`], commit, and retry from a fresh read on version conflict.
//! After `max_cas_retries` conflicts the operation reports the store as
//! unavailable rather than spinning.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use uuid::Uuid;

use openlot_store::{CommitBatch, Ledger, VersionedRow};
use openlot_types::constants::{BID_NUMBER_SPACE, GATE_INBOX_CAPACITY, MAX_IDENTIFIER_ATTEMPTS};
use openlot_types::{
    AuctionConfig, AuctionLot, BankAccount, Bid, BidNumber, BidStatus, ChatId, Email,
    EngineConfig, LotNumber, LotStatus, OpenlotError, ReferenceNumber, Result, SupportChat, User,
};

use crate::gate_inbox::{BidCreated, GateInbox};
use crate::retries_exhausted;
use crate::validator::BidValidator;

/// The placement and account plane of the engine.
pub struct BidEngine<L> {
    ledger: Arc<L>,
    config: EngineConfig,
    validator: BidValidator,
    inbox: Arc<GateInbox>,
}

impl<L: Ledger> BidEngine<L> {
    #[must_use]
    pub fn new(ledger: Arc<L>, config: EngineConfig) -> Self {
        let validator = BidValidator::new(&config);
        Self {
            ledger,
            config,
            validator,
            inbox: Arc::new(GateInbox::new(GATE_INBOX_CAPACITY)),
        }
    }

    /// The inbox this engine announces placed bids on. Hand it to the
    /// approval gate.
    #[must_use]
    pub fn inbox(&self) -> Arc<GateInbox> {
        Arc::clone(&self.inbox)
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Bid placement
    // -----------------------------------------------------------------------

    /// Place a bid on a lot.
    ///
    /// On success the bid is `PendingPayment`, its amount is reserved against
    /// the lot, and a bid-created event sits in the gate inbox.
    pub fn place_bid(
        &self,
        user_email: &Email,
        lot_number: &LotNumber,
        amount: Decimal,
        holding_period: u32,
        now: DateTime<Utc>,
    ) -> Result<Bid> {
        for _ in 0..self.config.max_cas_retries {
            let lot_row = self.ledger.lot(lot_number)?;
            self.validator.validate(
                lot_number,
                amount,
                lot_row.as_ref().map(|v| &v.row),
                holding_period,
            )?;
            let Some(lot_row) = lot_row else {
                return Err(OpenlotError::LotUnavailable(lot_number.clone()));
            };

            if self.ledger.user(user_email)?.is_none() {
                return Err(OpenlotError::UserNotFound(user_email.clone()));
            }

            let (bid_number, reference_number) = self.fresh_identifiers()?;
            let bid = Bid::place(
                bid_number,
                reference_number,
                user_email.clone(),
                &lot_row.row,
                amount,
                holding_period,
                now,
            );

            let lot_version = lot_row.version;
            let mut lot = lot_row.row;
            lot.reserve(amount)?;

            let mut batch = CommitBatch::new();
            batch.update_lot(lot_version, lot).insert_bid(bid.clone());
            match self.ledger.commit(batch) {
                Ok(()) => {
                    self.inbox.push(BidCreated {
                        bid_number: bid.bid_number.clone(),
                        lot_number: bid.lot_number.clone(),
                        user_email: bid.user_email.clone(),
                        amount: bid.amount,
                        created_at: now,
                    });
                    tracing::info!(
                        bid = %bid.bid_number,
                        lot = %bid.lot_number,
                        user = %bid.user_email,
                        amount = %bid.amount,
                        period = bid.holding_period,
                        "Bid placed"
                    );
                    return Ok(bid);
                }
                // Lot raced: re-read and re-validate against fresh capacity.
                Err(OpenlotError::VersionConflict { .. }) => continue,
                // Bid number raced a concurrent placement: redraw.
                Err(OpenlotError::DuplicateKey { .. }) => continue,
                Err(other) => return Err(other),
            }
        }
        Err(retries_exhausted("place_bid"))
    }

    /// Draw a bid number and payment reference not yet present in the store.
    fn fresh_identifiers(&self) -> Result<(BidNumber, ReferenceNumber)> {
        let mut rng = rand::thread_rng();

        let mut bid_number = None;
        for _ in 0..MAX_IDENTIFIER_ATTEMPTS {
            let candidate = BidNumber::from_index(rng.gen_range(0..BID_NUMBER_SPACE));
            if self.ledger.bid(&candidate)?.is_none() {
                bid_number = Some(candidate);
                break;
            }
        }
        let Some(bid_number) = bid_number else {
            return Err(OpenlotError::IdentifierSpaceExhausted { kind: "bid number" });
        };

        let seed = Uuid::now_v7();
        for attempt in 0..MAX_IDENTIFIER_ATTEMPTS {
            let candidate = ReferenceNumber::derive(seed, attempt);
            if !self.ledger.reference_in_use(&candidate)? {
                return Ok((bid_number, candidate));
            }
        }
        Err(OpenlotError::IdentifierSpaceExhausted {
            kind: "reference number",
        })
    }

    // -----------------------------------------------------------------------
    // Accounts
    // -----------------------------------------------------------------------

    /// Register a user and credit the welcome bonus.
    pub fn register_user(
        &self,
        email: &Email,
        full_name: &str,
        phone: &str,
        now: DateTime<Utc>,
    ) -> Result<User> {
        if self.ledger.user(email)?.is_some() {
            return Err(OpenlotError::UserAlreadyRegistered(email.clone()));
        }
        let user = User::register(email.clone(), full_name, phone, self.config.welcome_bonus, now);
        match self.ledger.insert_user(user.clone()) {
            Ok(()) => {
                tracing::info!(
                    user = %email,
                    bonus = %self.config.welcome_bonus,
                    "User registered"
                );
                Ok(user)
            }
            // Lost a registration race after the existence check.
            Err(OpenlotError::DuplicateKey { .. }) => {
                Err(OpenlotError::UserAlreadyRegistered(email.clone()))
            }
            Err(other) => Err(other),
        }
    }

    /// Add a seller bank account to the book.
    pub fn add_bank(&self, bank: BankAccount) -> Result<()> {
        let name = bank.bank_name.clone();
        self.ledger.insert_bank(bank)?;
        tracing::info!(bank = %name, "Bank account added");
        Ok(())
    }

    /// Mint or burn coins on a user wallet. Positive `delta` issues coins,
    /// negative retires them.
    pub fn adjust_user_coins(
        &self,
        email: &Email,
        delta: Decimal,
        admin: &str,
        reason: &str,
    ) -> Result<User> {
        for _ in 0..self.config.max_cas_retries {
            let Some(row) = self.ledger.user(email)? else {
                return Err(OpenlotError::UserNotFound(email.clone()));
            };
            if delta == Decimal::ZERO {
                return Ok(row.into_row());
            }

            let version = row.version;
            let mut user = row.row;
            let mut batch = CommitBatch::new();
            if delta > Decimal::ZERO {
                user.credit_coins(delta);
                batch.record_issuance(delta);
            } else {
                user.debit_coins(-delta)?;
                batch.record_retirement(-delta);
            }
            batch.update_user(version, user.clone());

            match self.ledger.commit(batch) {
                Ok(()) => {
                    tracing::info!(
                        user = %email,
                        delta = %delta,
                        admin,
                        reason,
                        "User coin balance adjusted"
                    );
                    return Ok(user);
                }
                Err(OpenlotError::VersionConflict { .. }) => continue,
                Err(other) => return Err(other),
            }
        }
        Err(retries_exhausted("adjust_user_coins"))
    }

    /// Mint or burn coins on a bank account. Positive `delta` issues coins,
    /// negative retires them.
    pub fn adjust_bank_coins(
        &self,
        bank_name: &str,
        delta: Decimal,
        admin: &str,
        reason: &str,
    ) -> Result<BankAccount> {
        for _ in 0..self.config.max_cas_retries {
            let Some(row) = self.ledger.bank(bank_name)? else {
                return Err(OpenlotError::BankNotFound(bank_name.to_string()));
            };
            if delta == Decimal::ZERO {
                return Ok(row.into_row());
            }

            let version = row.version;
            let mut bank = row.row;
            let mut batch = CommitBatch::new();
            if delta > Decimal::ZERO {
                bank.credit_coins(delta);
                batch.record_issuance(delta);
            } else {
                bank.debit_coins(-delta)?;
                batch.record_retirement(-delta);
            }
            batch.update_bank(version, bank.clone());

            match self.ledger.commit(batch) {
                Ok(()) => {
                    tracing::info!(
                        bank = %bank_name,
                        delta = %delta,
                        admin,
                        reason,
                        "Bank coin balance adjusted"
                    );
                    return Ok(bank);
                }
                Err(OpenlotError::VersionConflict { .. }) => continue,
                Err(other) => return Err(other),
            }
        }
        Err(retries_exhausted("adjust_bank_coins"))
    }

    // -----------------------------------------------------------------------
    // Lot catalog
    // -----------------------------------------------------------------------

    /// Publish a lot to the catalog.
    pub fn publish_lot(&self, lot: AuctionLot) -> Result<()> {
        let number = lot.lot_number.clone();
        match self.ledger.insert_lot(lot) {
            Ok(()) => {
                tracing::info!(lot = %number, "Lot published");
                Ok(())
            }
            Err(OpenlotError::DuplicateKey { .. }) => Err(OpenlotError::DuplicateLot(number)),
            Err(other) => Err(other),
        }
    }

    /// Withdraw an active lot from bidding. Bids already placed are
    /// unaffected.
    pub fn close_lot(&self, lot_number: &LotNumber) -> Result<AuctionLot> {
        for _ in 0..self.config.max_cas_retries {
            let Some(row) = self.ledger.lot(lot_number)? else {
                return Err(OpenlotError::LotUnavailable(lot_number.clone()));
            };
            if !row.row.is_active() {
                return Err(OpenlotError::LotUnavailable(lot_number.clone()));
            }

            let version = row.version;
            let mut lot = row.row;
            lot.close();

            let mut batch = CommitBatch::new();
            batch.update_lot(version, lot.clone());
            match self.ledger.commit(batch) {
                Ok(()) => {
                    tracing::info!(lot = %lot_number, "Lot closed");
                    return Ok(lot);
                }
                Err(OpenlotError::VersionConflict { .. }) => continue,
                Err(other) => return Err(other),
            }
        }
        Err(retries_exhausted("close_lot"))
    }

    // -----------------------------------------------------------------------
    // Support chats
    // -----------------------------------------------------------------------

    /// Open a support chat, optionally linked to one of the user's bids.
    pub fn open_chat(
        &self,
        user_email: &Email,
        issue: &str,
        bid_number: Option<BidNumber>,
        now: DateTime<Utc>,
    ) -> Result<SupportChat> {
        if self.ledger.user(user_email)?.is_none() {
            return Err(OpenlotError::UserNotFound(user_email.clone()));
        }
        if let Some(ref number) = bid_number {
            if self.ledger.bid(number)?.is_none() {
                return Err(OpenlotError::BidNotFound(number.clone()));
            }
        }

        let chat = SupportChat::open(user_email.clone(), issue, bid_number, now);
        self.ledger.insert_chat(chat.clone())?;
        tracing::info!(chat = %chat.id, user = %user_email, "Support chat opened");
        Ok(chat)
    }

    /// Append a message to an open chat.
    pub fn post_chat_message(
        &self,
        chat_id: &ChatId,
        sender: &str,
        body: &str,
        now: DateTime<Utc>,
    ) -> Result<SupportChat> {
        for _ in 0..self.config.max_cas_retries {
            let Some(row) = self.ledger.chat(chat_id)? else {
                return Err(OpenlotError::ChatNotFound(*chat_id));
            };

            let version = row.version;
            let mut chat = row.row;
            chat.post(sender, body, now)?;

            let mut batch = CommitBatch::new();
            batch.update_chat(version, chat.clone());
            match self.ledger.commit(batch) {
                Ok(()) => return Ok(chat),
                Err(OpenlotError::VersionConflict { .. }) => continue,
                Err(other) => return Err(other),
            }
        }
        Err(retries_exhausted("post_chat_message"))
    }

    /// Close a chat to further messages.
    pub fn resolve_chat(&self, chat_id: &ChatId) -> Result<SupportChat> {
        for _ in 0..self.config.max_cas_retries {
            let Some(row) = self.ledger.chat(chat_id)? else {
                return Err(OpenlotError::ChatNotFound(*chat_id));
            };

            let version = row.version;
            let mut chat = row.row;
            chat.resolve()?;

            let mut batch = CommitBatch::new();
            batch.update_chat(version, chat.clone());
            match self.ledger.commit(batch) {
                Ok(()) => {
                    tracing::info!(chat = %chat_id, "Support chat resolved");
                    return Ok(chat);
                }
                Err(OpenlotError::VersionConflict { .. }) => continue,
                Err(other) => return Err(other),
            }
        }
        Err(retries_exhausted("resolve_chat"))
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    pub fn bid(&self, number: &BidNumber) -> Result<Option<Bid>> {
        Ok(self.ledger.bid(number)?.map(VersionedRow::into_row))
    }

    pub fn bids_for_user(&self, email: &Email) -> Result<Vec<Bid>> {
        self.ledger.bids_for_user(email)
    }

    pub fn bids_with_status(&self, status: BidStatus) -> Result<Vec<Bid>> {
        self.ledger.bids_with_status(status)
    }

    pub fn lot(&self, number: &LotNumber) -> Result<Option<AuctionLot>> {
        Ok(self.ledger.lot(number)?.map(VersionedRow::into_row))
    }

    /// Lots currently open for bidding.
    pub fn open_lots(&self) -> Result<Vec<AuctionLot>> {
        self.ledger.lots_with_status(LotStatus::Active)
    }

    pub fn user(&self, email: &Email) -> Result<Option<User>> {
        Ok(self.ledger.user(email)?.map(VersionedRow::into_row))
    }

    pub fn bank(&self, name: &str) -> Result<Option<BankAccount>> {
        Ok(self.ledger.bank(name)?.map(VersionedRow::into_row))
    }

    pub fn chats_for_user(&self, email: &Email) -> Result<Vec<SupportChat>> {
        self.ledger.chats_for_user(email)
    }

    pub fn auction_config(&self) -> Result<AuctionConfig> {
        self.ledger.auction_config()
    }

    /// Replace the auction-cycle record shown on the dashboard.
    pub fn update_auction_config(&self, config: AuctionConfig) -> Result<()> {
        self.ledger.put_auction_config(config)
    }
}
