//! Fixed-capacity recycling pool.
//!
//! Every instance is built when the pool is created. `acquire` and `release`
//! only move slot numbers between the free list and the outstanding set, so
//! `outstanding + available == capacity` holds for the life of the pool.
//!
//! Each slot carries a generation bumped on every release. A handle is only
//! honoured while its generation matches, so a stale copy of a released
//! handle cannot release or read the slot's next borrower.

use crate::error::MemoryError;
use crate::stats::PoolStats;

/// Handle to an instance lent out by a [`RecyclingPool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PoolHandle {
    slot: usize,
    generation: u32,
}

impl PoolHandle {
    /// Slot number of the pooled instance.
    #[must_use]
    pub fn slot(self) -> usize {
        self.slot
    }

    /// Generation of the slot when the handle was issued.
    #[must_use]
    pub fn generation(self) -> u32 {
        self.generation
    }
}

/// Pool of reusable `T` instances with a fixed capacity.
pub struct RecyclingPool<T> {
    name: &'static str,
    items: Vec<T>,
    outstanding: Vec<bool>,
    generations: Vec<u32>,
    free: Vec<usize>,
    reset: Option<fn(&mut T)>,
    stats: PoolStats,
}

impl<T> RecyclingPool<T> {
    /// Create a pool holding `capacity` instances built by `factory`.
    pub fn new(name: &'static str, capacity: usize, mut factory: impl FnMut() -> T) -> Self {
        let items = (0..capacity).map(|_| factory()).collect();
        Self {
            name,
            items,
            outstanding: vec![false; capacity],
            generations: vec![0; capacity],
            // Reversed so that a fresh pool hands out slot 0 first.
            free: (0..capacity).rev().collect(),
            reset: None,
            stats: PoolStats::default(),
        }
    }

    /// Run `reset` on every instance as it comes back to the pool.
    #[must_use]
    pub fn with_reset(mut self, reset: fn(&mut T)) -> Self {
        self.reset = Some(reset);
        self
    }

    /// Lend out a free instance.
    pub fn acquire(&mut self) -> Result<PoolHandle, MemoryError> {
        let Some(slot) = self.free.pop() else {
            self.stats.record_exhaustion();
            return Err(MemoryError::PoolExhausted {
                pool: self.name,
                capacity: self.capacity(),
            });
        };
        self.outstanding[slot] = true;
        self.stats.record_acquire(self.outstanding());
        Ok(PoolHandle {
            slot,
            generation: self.generations[slot],
        })
    }

    /// Return an outstanding instance to the free list.
    pub fn release(&mut self, handle: PoolHandle) -> Result<(), MemoryError> {
        if !self.is_outstanding(handle) {
            return Err(MemoryError::DoubleRelease {
                pool: self.name,
                slot: handle.slot,
            });
        }
        if let Some(reset) = self.reset {
            reset(&mut self.items[handle.slot]);
        }
        self.outstanding[handle.slot] = false;
        self.generations[handle.slot] = self.generations[handle.slot].wrapping_add(1);
        self.free.push(handle.slot);
        self.stats.record_release();
        Ok(())
    }

    /// Whether `handle` currently refers to a lent-out instance.
    #[must_use]
    pub fn is_outstanding(&self, handle: PoolHandle) -> bool {
        self.outstanding.get(handle.slot).copied().unwrap_or(false)
            && self.generations[handle.slot] == handle.generation
    }

    /// Borrow an outstanding instance.
    #[must_use]
    pub fn get(&self, handle: PoolHandle) -> Option<&T> {
        if self.is_outstanding(handle) {
            self.items.get(handle.slot)
        } else {
            None
        }
    }

    /// Mutably borrow an outstanding instance.
    pub fn get_mut(&mut self, handle: PoolHandle) -> Option<&mut T> {
        if self.is_outstanding(handle) {
            self.items.get_mut(handle.slot)
        } else {
            None
        }
    }

    /// Fixed number of instances.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.items.len()
    }

    /// Number of instances lent out.
    #[must_use]
    pub fn outstanding(&self) -> usize {
        self.capacity() - self.free.len()
    }

    /// Number of instances ready to be acquired.
    #[must_use]
    pub fn available(&self) -> usize {
        self.free.len()
    }

    /// Get a snapshot of pool statistics.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        self.stats
    }

    /// Reset pool statistics counters.
    pub fn reset_stats(&mut self) {
        self.stats.reset();
    }
}

impl<T: Default> RecyclingPool<T> {
    /// Create a pool of `capacity` default-constructed instances.
    #[must_use]
    pub fn with_capacity(name: &'static str, capacity: usize) -> Self {
        Self::new(name, capacity, T::default)
    }
}

impl<T> std::fmt::Debug for RecyclingPool<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecyclingPool")
            .field("name", &self.name)
            .field("capacity", &self.capacity())
            .field("outstanding", &self.outstanding())
            .finish_non_exhaustive()
    }
}
