//! Errors raised by the arena and the pools.

/// Failure of an arena or pool operation.
///
/// Every failing call leaves the allocator state exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MemoryError {
    /// The arena cannot satisfy the requested allocation.
    #[error("arena out of capacity: requested {requested} bytes, {remaining} remaining")]
    OutOfCapacity {
        /// Bytes requested.
        requested: usize,
        /// Bytes still free in the arena.
        remaining: usize,
    },

    /// A rollback marker lies beyond the current arena offset.
    #[error("invalid marker {marker}: arena offset is {offset}")]
    InvalidMarker {
        /// Offset captured by the marker.
        marker: usize,
        /// Current arena offset.
        offset: usize,
    },

    /// Every pooled instance is already lent out.
    #[error("{pool} pool exhausted ({capacity} instances outstanding)")]
    PoolExhausted {
        /// Pool name.
        pool: &'static str,
        /// Fixed pool capacity.
        capacity: usize,
    },

    /// A handle was released while not outstanding.
    #[error("{pool} pool handle {slot} released twice")]
    DoubleRelease {
        /// Pool name.
        pool: &'static str,
        /// Slot number carried by the handle.
        slot: usize,
    },
}
