//! Bookkeeping for requests whose responses may arrive late.
//!
//! Nothing here blocks or spawns. Callers hold a [`Ticket`] across the
//! `.await` and hand it back with the response.

use std::collections::HashSet;
use std::hash::Hash;
use std::sync::{Mutex, PoisonError};

/// Identifies one refresh request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

/// Holds the last completed value of a repeatedly refreshed list.
///
/// - A response for an abandoned ticket is dropped.
/// - Otherwise the most recently *completed* response wins, even when it
///   belongs to an older request.
#[derive(Debug)]
pub struct RefreshSlot<T> {
    value: Option<T>,
    next: u64,
    /// Tickets at or below this were abandoned.
    abandoned_through: Option<u64>,
    outstanding: usize,
}

impl<T> Default for RefreshSlot<T> {
    fn default() -> Self {
        Self {
            value: None,
            next: 0,
            abandoned_through: None,
            outstanding: 0,
        }
    }
}

impl<T> RefreshSlot<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self) -> Ticket {
        self.next += 1;
        self.outstanding += 1;
        Ticket(self.next)
    }

    /// Forget every request issued so far; their responses will be ignored.
    pub fn abandon(&mut self) {
        if self.next > 0 {
            self.abandoned_through = Some(self.next);
        }
        self.outstanding = 0;
    }

    fn is_abandoned(&self, ticket: Ticket) -> bool {
        self.abandoned_through.is_some_and(|through| ticket.0 <= through)
    }

    /// Store `value` unless `ticket` was abandoned. Returns whether it was
    /// stored.
    pub fn complete(&mut self, ticket: Ticket, value: T) -> bool {
        if self.is_abandoned(ticket) {
            tracing::debug!(ticket = ticket.0, "dropping response for abandoned refresh");
            return false;
        }
        self.outstanding = self.outstanding.saturating_sub(1);
        self.value = Some(value);
        true
    }

    /// Mark a request as finished without a value (it failed).
    pub fn fail(&mut self, ticket: Ticket) {
        if !self.is_abandoned(ticket) {
            self.outstanding = self.outstanding.saturating_sub(1);
        }
    }

    pub fn is_loading(&self) -> bool {
        self.outstanding > 0
    }

    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }
}

/// Rejects a second start of the same operation while the first is running.
#[derive(Debug)]
pub struct InFlight<K> {
    running: HashSet<K>,
}

impl<K> Default for InFlight<K> {
    fn default() -> Self {
        Self {
            running: HashSet::new(),
        }
    }
}

impl<K: Eq + Hash> InFlight<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` if `key` is already running.
    pub fn try_begin(&mut self, key: K) -> bool {
        self.running.insert(key)
    }

    pub fn finish(&mut self, key: &K) {
        self.running.remove(key);
    }

    pub fn is_running(&self, key: &K) -> bool {
        self.running.contains(key)
    }
}

/// [`InFlight`] usable through `&self`, for services whose async methods
/// can be polled concurrently.
#[derive(Debug)]
pub struct Exclusive<K> {
    running: Mutex<InFlight<K>>,
}

impl<K> Default for Exclusive<K> {
    fn default() -> Self {
        Self {
            running: Mutex::new(InFlight::default()),
        }
    }
}

impl<K: Eq + Hash + Clone> Exclusive<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `key` running. `None` if it already is. The key is released when
    /// the returned guard drops.
    pub fn start(&self, key: K) -> Option<Running<'_, K>> {
        let started = self
            .running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .try_begin(key.clone());
        started.then(|| Running { owner: self, key })
    }

    pub fn is_running(&self, key: &K) -> bool {
        self.running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_running(key)
    }
}

/// Held for the duration of one operation.
#[derive(Debug)]
pub struct Running<'a, K: Eq + Hash + Clone> {
    owner: &'a Exclusive<K>,
    key: K,
}

impl<K: Eq + Hash + Clone> Drop for Running<'_, K> {
    fn drop(&mut self) {
        self.owner
            .running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .finish(&self.key);
    }
}
