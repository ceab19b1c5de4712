//! Client-side variable cache.
//!
//! The cache holds the last known state of every variable and decides
//! whether an arriving response may be applied. Each read takes a
//! [`Ticket`] carrying a per-variable sequence number; a response is
//! discarded when a newer request for the same variable has already
//! completed, so the display follows the newest completed request rather
//! than whichever response happened to arrive last.

use crate::model::{Value, VariableCatalog, VariableDescriptor, VariableKey, VariableValue};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Handle for one in-flight read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    key: VariableKey,
    seq: u64,
}

impl Ticket {
    pub fn key(&self) -> VariableKey {
        self.key
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }
}

/// What happened to a completed response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The response updated the cache.
    Applied,
    /// A newer response already landed, or the cache was torn down.
    Discarded,
}

/// A cached variable plus its sequencing state.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    value: VariableValue,
    last_issued: u64,
    last_applied: u64,
    in_flight: usize,
}

impl CacheEntry {
    fn new(descriptor: VariableDescriptor) -> Self {
        Self {
            value: VariableValue::new(descriptor),
            last_issued: 0,
            last_applied: 0,
            in_flight: 0,
        }
    }

    pub fn value(&self) -> &VariableValue {
        &self.value
    }

    /// Whether at least one read is outstanding.
    pub fn is_loading(&self) -> bool {
        self.in_flight > 0
    }
}

/// Per-session store of variable state.
#[derive(Debug, Clone, Default)]
pub struct VariableCache {
    entries: BTreeMap<VariableKey, CacheEntry>,
    closed: bool,
}

impl VariableCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cache pre-populated with every variable in `catalog`.
    pub fn from_catalog(catalog: &VariableCatalog) -> Self {
        let mut cache = Self::new();
        cache.load_catalog(catalog);
        cache
    }

    /// Replace the tracked variables with `catalog`.
    ///
    /// Variables that survive keep their state; the rest are dropped.
    pub fn load_catalog(&mut self, catalog: &VariableCatalog) {
        let mut entries = BTreeMap::new();
        for descriptor in catalog.iter() {
            let entry = self
                .entries
                .remove(&descriptor.key())
                .filter(|e| e.value.descriptor() == descriptor)
                .unwrap_or_else(|| CacheEntry::new(descriptor.clone()));
            entries.insert(descriptor.key(), entry);
        }
        self.entries = entries;
    }

    /// Track a variable if it is not already known.
    pub fn insert(&mut self, descriptor: &VariableDescriptor) {
        self.entries
            .entry(descriptor.key())
            .or_insert_with(|| CacheEntry::new(descriptor.clone()));
    }

    pub fn entry(&self, key: &VariableKey) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    pub fn get(&self, key: &VariableKey) -> Option<&VariableValue> {
        self.entries.get(key).map(|e| &e.value)
    }

    /// All tracked variables, ordered by kind then address.
    pub fn entries(&self) -> impl Iterator<Item = &CacheEntry> {
        self.entries.values()
    }

    pub fn descriptors(&self) -> Vec<VariableDescriptor> {
        self.entries
            .values()
            .map(|e| e.value.descriptor().clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Issue a ticket for a new read of `descriptor`.
    ///
    /// Returns `None` once the cache has been closed.
    pub fn begin(&mut self, descriptor: &VariableDescriptor) -> Option<Ticket> {
        if self.closed {
            return None;
        }
        self.insert(descriptor);
        let entry = self.entries.get_mut(&descriptor.key())?;
        entry.last_issued += 1;
        entry.in_flight += 1;
        Some(Ticket {
            key: descriptor.key(),
            seq: entry.last_issued,
        })
    }

    /// Apply the outcome of the read identified by `ticket`.
    pub fn complete(
        &mut self,
        ticket: Ticket,
        outcome: Result<Value, String>,
        at: DateTime<Utc>,
    ) -> Completion {
        if self.closed {
            return Completion::Discarded;
        }
        let Some(entry) = self.entries.get_mut(&ticket.key) else {
            return Completion::Discarded;
        };

        entry.in_flight = entry.in_flight.saturating_sub(1);
        if ticket.seq < entry.last_applied {
            return Completion::Discarded;
        }
        entry.last_applied = ticket.seq;

        match outcome {
            Ok(value) => entry.value.mark_fresh(value, at),
            Err(error) => entry.value.mark_stale(error),
        }
        Completion::Applied
    }

    /// Stop accepting responses; used when the view is torn down.
    pub fn close(&mut self) {
        self.closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}
