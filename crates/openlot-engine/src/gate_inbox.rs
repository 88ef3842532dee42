//! The approval-gate inbox.
//!
//! Every placed bid drops a [`BidCreated`] event here so review staff can see
//! bids whose payment has not been claimed yet. The inbox is advisory: it
//! never blocks placement, and overflowing it evicts the oldest events rather
//! than failing.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rust_decimal::Decimal;

use openlot_types::{BidNumber, Email, LotNumber};

/// Notification that a bid was placed and awaits payment.
#[derive(Debug, Clone, PartialEq)]
pub struct BidCreated {
    pub bid_number: BidNumber,
    pub lot_number: LotNumber,
    pub user_email: Email,
    pub amount: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Bounded, thread-safe queue of bid-created events, oldest first.
#[derive(Debug)]
pub struct GateInbox {
    events: Mutex<VecDeque<BidCreated>>,
    capacity: usize,
}

impl GateInbox {
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "inbox capacity must be positive");
        Self {
            events: Mutex::new(VecDeque::new()),
            capacity,
        }
    }

    /// Append an event, evicting the oldest one on overflow.
    pub fn push(&self, event: BidCreated) {
        let mut events = self.events.lock();
        if events.len() == self.capacity {
            if let Some(evicted) = events.pop_front() {
                tracing::warn!(
                    bid = %evicted.bid_number,
                    "Inbox full, evicting oldest bid-created event"
                );
            }
        }
        events.push_back(event);
    }

    /// Drop the event for `bid_number`, if still queued. Called when the
    /// payment is claimed and the bid moves into the approval queue proper.
    pub fn acknowledge(&self, bid_number: &BidNumber) {
        self.events.lock().retain(|e| e.bid_number != *bid_number);
    }

    /// Remove and return all queued events.
    #[must_use]
    pub fn drain(&self) -> Vec<BidCreated> {
        self.events.lock().drain(..).collect()
    }

    /// Copy the queued events without removing them.
    #[must_use]
    pub fn snapshot(&self) -> Vec<BidCreated> {
        self.events.lock().iter().cloned().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}
