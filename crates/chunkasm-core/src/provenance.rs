//! Pooled provenance records.
//!
//! Each chunk load borrows one record of each kind from the registry's
//! pools, stamps it with what was loaded, and hands it straight back.

use chunkasm_memory::ArenaExtent;

/// Where the bytes of the last chunk handled by this record were staged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkRecord {
    /// Chunk index.
    pub index: usize,
    /// Arena copy of the chunk.
    pub extent: Option<ArenaExtent>,
    /// Number of loads this record has described.
    pub uses: u64,
}

impl ChunkRecord {
    /// Stamp the record with a chunk load.
    pub fn load(&mut self, index: usize, extent: ArenaExtent) {
        self.index = index;
        self.extent = Some(extent);
        self.uses += 1;
    }
}

/// Which source the last chunk handled by this record came from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetRecord {
    /// Source identifier, reusing its allocation across loads.
    pub source_id: String,
    /// Number of loads this record has described.
    pub uses: u64,
}

impl AssetRecord {
    /// Stamp the record with a chunk's source.
    pub fn load(&mut self, source_id: &str) {
        self.source_id.clear();
        self.source_id.push_str(source_id);
        self.uses += 1;
    }
}
