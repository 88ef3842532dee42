//! Second line of defense against double maturation.
//!
//! The sweep's status checks already make maturation idempotent against the
//! store. [`MaturityGuard`] additionally remembers every bid this process has
//! matured, so a stale read from a misbehaving backend cannot credit a user
//! twice. Bounded LRU; evicting old entries is safe because matured bids are
//! terminal in the store anyway.

use std::collections::{HashSet, VecDeque};

use openlot_types::{BidNumber, OpenlotError, Result};

#[derive(Debug)]
pub struct MaturityGuard {
    matured: HashSet<BidNumber>,
    order: VecDeque<BidNumber>,
    max_size: usize,
}

impl MaturityGuard {
    /// # Panics
    ///
    /// Panics if `max_size` is zero.
    #[must_use]
    pub fn new(max_size: usize) -> Self {
        assert!(max_size > 0, "guard capacity must be positive");
        Self {
            matured: HashSet::new(),
            order: VecDeque::new(),
            max_size,
        }
    }

    /// Record that `bid_number` has been matured.
    pub fn mark_matured(&mut self, bid_number: &BidNumber) -> Result<()> {
        if self.matured.contains(bid_number) {
            return Err(OpenlotError::BidAlreadyMatured(bid_number.clone()));
        }
        self.matured.insert(bid_number.clone());
        self.order.push_back(bid_number.clone());
        while self.order.len() > self.max_size {
            if let Some(evicted) = self.order.pop_front() {
                self.matured.remove(&evicted);
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn is_matured(&self, bid_number: &BidNumber) -> bool {
        self.matured.contains(bid_number)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.matured.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.matured.is_empty()
    }
}
