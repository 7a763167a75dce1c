//! Stale-response discard.
//!
//! A page that can fire the same kind of request more than once (switching
//! the category filter, reloading a job) takes a [`Ticket`] before each
//! request and applies the response only if that ticket is still current.
//! Issuing a newer ticket, calling [`Latest::invalidate`], or dropping the
//! owning [`Latest`] makes older tickets stale.

#[cfg(test)]
#[path = "latest_test.rs"]
mod latest_test;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

/// Owner of the generation counter. Deliberately not `Clone`: it lives with
/// the page that owns the requests.
#[derive(Debug, Default)]
pub struct Latest {
    generation: Arc<AtomicU64>,
}

/// Proof of which request generation a response belongs to.
#[derive(Clone, Debug)]
pub struct Ticket {
    generation: u64,
    owner: Weak<AtomicU64>,
}

impl Latest {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new generation; every earlier ticket becomes stale.
    #[must_use]
    pub fn issue(&self) -> Ticket {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        Ticket { generation, owner: Arc::downgrade(&self.generation) }
    }

    /// Make every outstanding ticket stale without starting a request.
    pub fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }
}

impl Ticket {
    #[must_use]
    pub fn is_current(&self) -> bool {
        self.owner
            .upgrade()
            .is_some_and(|generation| generation.load(Ordering::SeqCst) == self.generation)
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }
}
