//! Error type for registry, history, and persistence operations.

use std::io;
use std::path::PathBuf;

use chunkasm_memory::MemoryError;

/// Failure of a chunk registry operation.
///
/// Chunk-scoped variants carry the operation name and the chunk index so the
/// caller can report exactly what went wrong.
#[derive(Debug, thiserror::Error)]
pub enum ChunkError {
    /// Chunk index outside the known range.
    #[error("{op}: invalid chunk index {index} (registry holds {len} chunks)")]
    InvalidIndex {
        /// Operation that was attempted.
        op: &'static str,
        /// Requested index.
        index: usize,
        /// Number of known chunks.
        len: usize,
    },

    /// The chunk source could not provide the bytes.
    #[error("{op}: chunk {index} source {source_id:?} unavailable: {source}")]
    SourceUnavailable {
        /// Operation that was attempted.
        op: &'static str,
        /// Chunk index.
        index: usize,
        /// Source identifier of the chunk.
        source_id: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The chunk is not loaded.
    #[error("{op}: chunk {index} is not loaded")]
    NotLoaded {
        /// Operation that was attempted.
        op: &'static str,
        /// Chunk index.
        index: usize,
    },

    /// The arena or a pool refused a chunk operation.
    #[error("{op}: chunk {index}: {source}")]
    Allocation {
        /// Operation that was attempted.
        op: &'static str,
        /// Chunk index.
        index: usize,
        /// Underlying allocator error.
        #[source]
        source: MemoryError,
    },

    /// The arena or a pool refused an operation not tied to one chunk.
    #[error("{op}: {source}")]
    Memory {
        /// Operation that was attempted.
        op: &'static str,
        /// Underlying allocator error.
        #[source]
        source: MemoryError,
    },

    /// The source returned a different length than was reserved.
    #[error("{op}: chunk {index} has {actual} bytes, {expected} were reserved")]
    LengthMismatch {
        /// Operation that was attempted.
        op: &'static str,
        /// Chunk index.
        index: usize,
        /// Reserved length.
        expected: usize,
        /// Length returned by the source.
        actual: usize,
    },

    /// No assembled buffer exists.
    #[error("{op}: no image buffer")]
    NoBuffer {
        /// Operation that was attempted.
        op: &'static str,
    },

    /// An assembled buffer already exists.
    #[error("image buffer already exists ({size} bytes)")]
    BufferExists {
        /// Size of the existing buffer.
        size: usize,
    },

    /// The buffer cannot hold the chunk's reserved region.
    #[error("{op}: chunk {index} needs bytes up to {required}, buffer holds {size}")]
    BufferTooSmall {
        /// Operation that was attempted.
        op: &'static str,
        /// Chunk index.
        index: usize,
        /// End of the chunk's reserved region.
        required: usize,
        /// Buffer size.
        size: usize,
    },

    /// Assembly stopped at a failing chunk; earlier chunks remain loaded.
    #[error("assembly stopped at chunk {index} after loading {loaded} chunks: {source}")]
    Assembly {
        /// Index of the failing chunk.
        index: usize,
        /// Number of chunks loaded before the failure.
        loaded: usize,
        /// Failure of the chunk.
        #[source]
        source: Box<ChunkError>,
    },

    /// The undo stack is empty.
    #[error("nothing to undo")]
    NothingToUndo,

    /// The redo stack is empty.
    #[error("nothing to redo")]
    NothingToRedo,

    /// A level record ended before its declared length.
    #[error("level record {record} truncated: expected {expected} bytes, found {found}")]
    TruncatedRecord {
        /// Zero-based record number.
        record: usize,
        /// Bytes declared (or required for the length prefix).
        expected: u64,
        /// Bytes actually present.
        found: u64,
    },

    /// Reading or writing a file failed.
    #[error("{op} {}: {source}", .path.display())]
    Io {
        /// Operation that was attempted.
        op: &'static str,
        /// File involved.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Reading or writing a level stream failed.
    #[error("{op}: {source}")]
    Stream {
        /// Operation that was attempted.
        op: &'static str,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// A command could not be parsed.
    #[error("invalid command {input:?}: {reason}")]
    Parse {
        /// Text that failed to parse.
        input: String,
        /// Why it failed.
        reason: String,
    },
}

impl ChunkError {
    /// Allocator error behind this failure, if any.
    #[must_use]
    pub fn memory(&self) -> Option<&MemoryError> {
        match self {
            Self::Allocation { source, .. } | Self::Memory { source, .. } => Some(source),
            Self::Assembly { source, .. } => source.memory(),
            _ => None,
        }
    }

    /// Chunk index this failure is about, if any.
    #[must_use]
    pub fn index(&self) -> Option<usize> {
        match self {
            Self::InvalidIndex { index, .. }
            | Self::SourceUnavailable { index, .. }
            | Self::NotLoaded { index, .. }
            | Self::Allocation { index, .. }
            | Self::LengthMismatch { index, .. }
            | Self::BufferTooSmall { index, .. }
            | Self::Assembly { index, .. } => Some(*index),
            _ => None,
        }
    }
}
