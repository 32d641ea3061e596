//! Concurrency gate bounding simultaneous in-flight requests
//!
//! A counting semaphore hands out permits; a permit is held for the
//! duration of one fetch and released when it is dropped, whichever way the
//! guarded operation ends. The gate also keeps an in-flight counter and its
//! high-water mark so the bound can be observed.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Default number of detail pages fetched at once
pub const DEFAULT_MAX_CONCURRENT: usize = 10;

#[derive(Debug, Default)]
struct GateCounters {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

/// Bounds the number of concurrently running guarded operations
///
/// Cloning shares the same permits.
#[derive(Debug, Clone)]
pub struct ConcurrencyGate {
    semaphore: Arc<Semaphore>,
    counters: Arc<GateCounters>,
    capacity: usize,
}

impl ConcurrencyGate {
    /// Creates a gate with `capacity` permits (at least one)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            counters: Arc::new(GateCounters::default()),
            capacity,
        }
    }

    /// Creates the single-slot gate used for the sequential index walk
    pub fn single() -> Self {
        Self::new(1)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Waits until a slot is free and takes it
    pub async fn acquire(&self) -> GatePermit {
        // The semaphore is owned by the gate and never closed
        let permit = match Arc::clone(&self.semaphore).acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => unreachable!("gate semaphore is never closed"),
        };

        let now = self.counters.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.counters.peak.fetch_max(now, Ordering::SeqCst);

        GatePermit {
            _permit: permit,
            counters: Arc::clone(&self.counters),
        }
    }

    /// Number of permits currently held
    pub fn in_flight(&self) -> usize {
        self.counters.in_flight.load(Ordering::SeqCst)
    }

    /// Highest number of permits ever held at the same time
    pub fn peak_in_flight(&self) -> usize {
        self.counters.peak.load(Ordering::SeqCst)
    }

    /// Number of permits free right now
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }
}

impl Default for ConcurrencyGate {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CONCURRENT)
    }
}

/// A unit of gate capacity; released on drop
#[derive(Debug)]
pub struct GatePermit {
    _permit: OwnedSemaphorePermit,
    counters: Arc<GateCounters>,
}

impl Drop for GatePermit {
    fn drop(&mut self) {
        self.counters.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}
