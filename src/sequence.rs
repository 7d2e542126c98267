// Counter-backed identifier allocation

use crate::backend::Backend;
use crate::error::{Result, StoreError};
use crate::record::Namespace;
use std::sync::Arc;
use tracing::{debug, warn};

/// Named persisted counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Counter {
    /// Last issued appointment id
    Appointments,
    /// Last issued task id
    Tasks,
}

impl Counter {
    pub fn key(self) -> &'static str {
        match self {
            Counter::Appointments => "lastId",
            Counter::Tasks => "lastTaskId",
        }
    }

    /// Namespace whose records consume this counter
    pub fn namespace(self) -> Namespace {
        match self {
            Counter::Appointments => Namespace::Appointments,
            Counter::Tasks => Namespace::Tasks,
        }
    }
}

/// An allocated value plus the counter entry that records it
///
/// The entry must be committed in the same write as the record using the
/// value, or on its own before that record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reservation {
    pub value: u64,
    key: &'static str,
}

impl Reservation {
    pub fn entry(&self) -> (&'static str, String) {
        (self.key, self.value.to_string())
    }
}

/// Hands out strictly increasing ids from persisted counters
///
/// Callers serialize access per counter; the allocator itself holds no lock.
pub struct SequenceAllocator {
    backend: Arc<dyn Backend>,
}

impl SequenceAllocator {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    /// Last issued value, 0 when the counter was never written
    pub fn current(&self, counter: Counter) -> Result<u64> {
        match self.backend.get(counter.key())? {
            None => Ok(0),
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map_err(|e| StoreError::corrupt(counter.key(), format!("'{}' is not a counter value: {}", raw, e))),
        }
    }

    /// Allocate and persist the next value
    pub fn allocate(&self, counter: Counter) -> Result<u64> {
        let reservation = self.reserve(counter, |_| false)?;
        let (key, value) = reservation.entry();
        self.backend.put(key, value)?;
        debug!(counter = counter.key(), value = reservation.value, "Allocated id");
        Ok(reservation.value)
    }

    /// Compute the next free value without persisting it
    ///
    /// Values for which `is_taken` returns true are skipped, so a counter that
    /// fell behind its collection never hands out an id already in use.
    pub fn reserve(&self, counter: Counter, is_taken: impl Fn(u64) -> bool) -> Result<Reservation> {
        let overflow = || StoreError::corrupt(counter.key(), "counter exhausted");

        let mut value = self.current(counter)?.checked_add(1).ok_or_else(overflow)?;
        while is_taken(value) {
            warn!(counter = counter.key(), value, "Counter behind stored records, skipping id");
            value = value.checked_add(1).ok_or_else(overflow)?;
        }

        Ok(Reservation {
            value,
            key: counter.key(),
        })
    }
}
