//! Per-chunk registry state.

use chunkasm_memory::ArenaExtent;
use serde::Serialize;

/// The registry's record of one chunk.
///
/// `byte_offset` is the region reserved in the assembled buffer when the
/// layout was computed. `staged` is the arena copy of the bytes most recently
/// loaded for the slot; it outlives removal and is dropped only when the
/// arena is rolled back past it or the layout is rebuilt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChunkSlot {
    /// Position in the registry.
    pub index: usize,
    /// Whether the chunk's bytes are present in the assembled buffer.
    pub loaded: bool,
    /// First byte of the chunk in the assembled buffer.
    pub byte_offset: usize,
    /// Chunk length in bytes.
    pub byte_length: usize,
    /// Identifier handed to the chunk source.
    pub source_id: String,
    #[serde(skip)]
    pub(crate) staged: Option<ArenaExtent>,
}

impl ChunkSlot {
    /// Create an unloaded slot.
    #[must_use]
    pub fn new(index: usize, byte_offset: usize, byte_length: usize, source_id: String) -> Self {
        Self {
            index,
            loaded: false,
            byte_offset,
            byte_length,
            source_id,
            staged: None,
        }
    }

    /// One past the last byte of the chunk in the assembled buffer.
    #[must_use]
    pub fn byte_end(&self) -> usize {
        self.byte_offset + self.byte_length
    }

    /// Arena copy of the chunk, if one is still held.
    #[must_use]
    pub fn staged(&self) -> Option<ArenaExtent> {
        self.staged
    }
}

/// Lay out slots back to back, each starting where the previous one ends.
#[must_use]
pub fn layout(chunks: impl IntoIterator<Item = (String, usize)>) -> Vec<ChunkSlot> {
    let mut offset = 0;
    chunks
        .into_iter()
        .enumerate()
        .map(|(index, (source_id, len))| {
            let slot = ChunkSlot::new(index, offset, len, source_id);
            offset += len;
            slot
        })
        .collect()
}
