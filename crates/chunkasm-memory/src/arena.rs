//! Fixed-capacity stack arena with marker-based rollback.
//!
//! Allocation bumps a single offset through one owned byte region. There is
//! no per-allocation bookkeeping, so nothing can be freed out of order: the
//! only way to reclaim space is to roll back to an earlier [`Marker`].

use crate::error::MemoryError;

/// Snapshot of the arena offset, used to roll back later allocations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Marker(usize);

impl Marker {
    /// Offset captured by this marker.
    #[must_use]
    pub fn offset(self) -> usize {
        self.0
    }
}

/// Location of a past allocation inside the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArenaExtent {
    /// First byte of the allocation.
    pub offset: usize,
    /// Allocation length in bytes.
    pub len: usize,
}

impl ArenaExtent {
    /// One past the last byte of the allocation.
    #[must_use]
    pub fn end(&self) -> usize {
        self.offset + self.len
    }
}

/// Bump allocator over a fixed-size byte region.
pub struct StackArena {
    base: Box<[u8]>,
    offset: usize,
}

impl StackArena {
    /// Create an arena with a fixed capacity in bytes.
    #[must_use]
    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            base: vec![0u8; bytes].into_boxed_slice(),
            offset: 0,
        }
    }

    /// Allocate `n` bytes and return a writable view of them.
    pub fn allocate(&mut self, n: usize) -> Result<&mut [u8], MemoryError> {
        let extent = self.reserve(n)?;
        Ok(&mut self.base[extent.offset..extent.end()])
    }

    /// Allocate room for `bytes`, copy them in, and return where they live.
    pub fn stage(&mut self, bytes: &[u8]) -> Result<ArenaExtent, MemoryError> {
        let extent = self.reserve(bytes.len())?;
        self.base[extent.offset..extent.end()].copy_from_slice(bytes);
        Ok(extent)
    }

    fn reserve(&mut self, n: usize) -> Result<ArenaExtent, MemoryError> {
        let remaining = self.remaining();
        if n > remaining {
            return Err(MemoryError::OutOfCapacity {
                requested: n,
                remaining,
            });
        }
        let extent = ArenaExtent {
            offset: self.offset,
            len: n,
        };
        self.offset += n;
        Ok(extent)
    }

    /// Read back a previous allocation.
    ///
    /// Returns `None` once a rollback has moved the offset below the end of
    /// the extent. An extent that was rolled back and then re-covered by new
    /// allocations reads the new bytes; callers must drop extents they
    /// rolled past.
    #[must_use]
    pub fn region(&self, extent: ArenaExtent) -> Option<&[u8]> {
        if extent.end() > self.offset {
            return None;
        }
        Some(&self.base[extent.offset..extent.end()])
    }

    /// Capture the current offset.
    #[must_use]
    pub fn mark(&self) -> Marker {
        Marker(self.offset)
    }

    /// Discard every allocation made after `marker`.
    pub fn rollback_to(&mut self, marker: Marker) -> Result<(), MemoryError> {
        if marker.0 > self.offset {
            return Err(MemoryError::InvalidMarker {
                marker: marker.0,
                offset: self.offset,
            });
        }
        self.offset = marker.0;
        Ok(())
    }

    /// Discard every allocation.
    pub fn reset(&mut self) {
        self.offset = 0;
    }

    /// Total size of the region in bytes.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.base.len()
    }

    /// Bytes handed out so far.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Bytes still available.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.base.len() - self.offset
    }
}

impl std::fmt::Debug for StackArena {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StackArena")
            .field("capacity", &self.capacity())
            .field("offset", &self.offset)
            .finish()
    }
}
