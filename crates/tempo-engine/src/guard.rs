//! Stale-result guard for superseded fetches.
//!
//! Each query slot (for example "the range shown on screen") remembers the
//! ticket of its latest request. A fetch that completes after a newer one was
//! issued for the same slot holds an outdated ticket and must be dropped.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    slot: String,
    id: u64,
}

impl Ticket {
    #[must_use]
    pub fn slot(&self) -> &str {
        &self.slot
    }
}

#[derive(Debug, Default)]
pub struct QueryGuard {
    next: AtomicU64,
    latest: Mutex<HashMap<String, u64>>,
}

impl QueryGuard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a request for `slot`, superseding any request already in flight.
    pub fn begin(&self, slot: &str) -> Ticket {
        let id = self.next.fetch_add(1, Ordering::Relaxed) + 1;
        self.latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(slot.to_string(), id);
        Ticket {
            slot: slot.to_string(),
            id,
        }
    }

    /// Whether `ticket` is still the newest request for its slot.
    #[must_use]
    pub fn is_current(&self, ticket: &Ticket) -> bool {
        self.latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&ticket.slot)
            .is_some_and(|latest| *latest == ticket.id)
    }
}
