//! Chunk registry: slot bookkeeping, assembled buffer, and undo/redo.
//!
//! The registry exclusively owns the arena, both provenance pools, the
//! assembled buffer, and the action log. Every mutation goes through a
//! `&mut self` method, so there is one writer and no reader during a change.
//!
//! Loading a chunk copies it through the arena before committing it to the
//! buffer. Removing a chunk only zero-fills its buffer region; arena space is
//! reclaimed solely by [`ChunkRegistry::rollback_to`].

use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::ops::Range;
use std::path::Path;

use chunkasm_memory::{ArenaExtent, Marker, MemoryError, PoolStats, RecyclingPool, StackArena};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::codec;
use crate::constants::{ASSET_POOL_NAME, CHUNK_POOL_NAME};
use crate::error::ChunkError;
use crate::history::{Action, ActionLog};
use crate::options::RegistryOptions;
use crate::provenance::{AssetRecord, ChunkRecord};
use crate::slot::{layout, ChunkSlot};
use crate::source::ChunkSource;

/// Ordered chunk slots assembled into one contiguous buffer.
pub struct ChunkRegistry {
    source: Box<dyn ChunkSource>,
    options: RegistryOptions,
    arena: StackArena,
    chunk_pool: RecyclingPool<ChunkRecord>,
    asset_pool: RecyclingPool<AssetRecord>,
    slots: Vec<ChunkSlot>,
    buffer: Option<Vec<u8>>,
    history: ActionLog,
}

impl ChunkRegistry {
    /// Create an empty registry reading chunks from `source`.
    pub fn new(source: impl ChunkSource + 'static, options: RegistryOptions) -> Self {
        let options = options.normalize();
        Self {
            source: Box::new(source),
            arena: StackArena::with_capacity(options.arena_capacity),
            chunk_pool: RecyclingPool::with_capacity(CHUNK_POOL_NAME, options.pool_capacity),
            asset_pool: RecyclingPool::with_capacity(ASSET_POOL_NAME, options.pool_capacity),
            options,
            slots: Vec::new(),
            buffer: None,
            history: ActionLog::new(),
        }
    }

    // ---------------------------------------------------------------------
    // Layout and buffer lifecycle
    // ---------------------------------------------------------------------

    /// Register the chunks to manage, reserving their buffer regions.
    ///
    /// Drops the current buffer and history. Returns the total chunk size.
    pub fn set_layout<S: AsRef<str>>(&mut self, source_ids: &[S]) -> Result<usize, ChunkError> {
        let mut chunks = Vec::with_capacity(source_ids.len());
        for (index, id) in source_ids.iter().enumerate() {
            let id = id.as_ref();
            let len = self
                .source
                .length(id)
                .map_err(|source| ChunkError::SourceUnavailable {
                    op: "layout",
                    index,
                    source_id: id.to_string(),
                    source,
                })?;
            chunks.push((id.to_string(), len));
        }
        self.slots = layout(chunks);
        self.buffer = None;
        self.history.clear();
        let total = self.total_length();
        debug!(chunks = self.slots.len(), total, "chunk layout set");
        Ok(total)
    }

    /// Lay out `source_ids`, create a buffer sized to their total, and add
    /// every chunk in order.
    ///
    /// Stops at the first failing chunk. Chunks added before it stay loaded
    /// and the error reports how many there were.
    pub fn assemble_all<S: AsRef<str>>(&mut self, source_ids: &[S]) -> Result<usize, ChunkError> {
        let total = self.set_layout(source_ids)?;
        self.buffer = Some(vec![0; total]);
        info!(chunks = self.slots.len(), total, "assembling chunks");

        for index in 0..self.slots.len() {
            if let Err(err) = self.apply(Action::Add(index)) {
                warn!(index, error = %err, "assembly stopped");
                return Err(ChunkError::Assembly {
                    index,
                    loaded: index,
                    source: Box::new(err),
                });
            }
        }
        self.refresh_image()?;
        Ok(self.slots.len())
    }

    /// Create a zero-filled buffer; `None` sizes it to the current layout.
    pub fn create_buffer(&mut self, size: Option<usize>) -> Result<usize, ChunkError> {
        if let Some(buffer) = &self.buffer {
            return Err(ChunkError::BufferExists { size: buffer.len() });
        }
        let size = size.unwrap_or_else(|| self.total_length());
        self.buffer = Some(vec![0; size]);
        info!(size, "image buffer created");
        Ok(size)
    }

    /// Drop the buffer, mark every chunk unloaded, and clear the history.
    ///
    /// Staged arena copies are kept, so re-adding a chunk afterwards does not
    /// consume more arena space.
    pub fn delete_buffer(&mut self) -> Result<(), ChunkError> {
        if self.buffer.take().is_none() {
            return Err(ChunkError::NoBuffer { op: "delete buffer" });
        }
        for slot in &mut self.slots {
            slot.loaded = false;
        }
        self.history.clear();
        info!("image buffer deleted");
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Chunk mutations and undo/redo
    // ---------------------------------------------------------------------

    /// Load chunk `index` into the buffer and record it for undo.
    ///
    /// Returns `false` when the chunk was already loaded; nothing changes and
    /// nothing is recorded in that case.
    pub fn add_chunk(&mut self, index: usize) -> Result<bool, ChunkError> {
        self.apply(Action::Add(index))
    }

    /// Zero-fill chunk `index` in the buffer and record it for undo.
    pub fn remove_chunk(&mut self, index: usize) -> Result<(), ChunkError> {
        self.apply(Action::Remove(index)).map(|_| ())
    }

    /// Perform a fresh action, record it, and discard the redo branch.
    pub fn apply(&mut self, action: Action) -> Result<bool, ChunkError> {
        let changed = self.perform(op_name(action), action)?;
        if changed {
            self.history.record(action);
        }
        self.after(action)?;
        Ok(changed)
    }

    /// Revert the most recent action by running its inverse.
    ///
    /// If the inverse fails the entry stays on the undo stack.
    pub fn undo(&mut self) -> Result<Action, ChunkError> {
        let action = self.history.pop_undo().ok_or(ChunkError::NothingToUndo)?;
        let inverse = action.inverse();
        if let Err(err) = self.perform("undo", inverse) {
            self.history.push_undo(action);
            return Err(err);
        }
        self.history.push_redo(action);
        info!(%action, "undone");
        self.after(inverse)?;
        Ok(action)
    }

    /// Re-run the most recently undone action.
    ///
    /// If it fails the entry stays on the redo stack.
    pub fn redo(&mut self) -> Result<Action, ChunkError> {
        let action = self.history.pop_redo().ok_or(ChunkError::NothingToRedo)?;
        if let Err(err) = self.perform("redo", action) {
            self.history.push_redo(action);
            return Err(err);
        }
        self.history.push_undo(action);
        info!(%action, "redone");
        self.after(action)?;
        Ok(action)
    }

    fn perform(&mut self, op: &'static str, action: Action) -> Result<bool, ChunkError> {
        match action {
            Action::Add(index) => self.load_chunk(op, index, None),
            Action::Remove(index) => self.clear_chunk(op, index).map(|()| true),
        }
    }

    /// Keep the image dump in step with removals.
    fn after(&self, action: Action) -> Result<(), ChunkError> {
        match action {
            Action::Remove(_) => self.refresh_image(),
            Action::Add(_) => Ok(()),
        }
    }

    fn load_chunk(
        &mut self,
        op: &'static str,
        index: usize,
        provided: Option<&[u8]>,
    ) -> Result<bool, ChunkError> {
        self.check_index(op, index)?;
        if self.slots[index].loaded {
            debug!(index, "chunk already loaded");
            return Ok(false);
        }
        let region = self.buffer_range(op, index)?;

        let chunk_handle = self
            .chunk_pool
            .acquire()
            .map_err(|source| ChunkError::Allocation { op, index, source })?;
        let asset_handle = match self.asset_pool.acquire() {
            Ok(handle) => handle,
            Err(source) => {
                self.chunk_pool
                    .release(chunk_handle)
                    .map_err(|source| ChunkError::Allocation { op, index, source })?;
                return Err(ChunkError::Allocation { op, index, source });
            }
        };

        let staged = self.stage_chunk(op, index, provided);
        if let Ok(extent) = staged {
            if let Some(record) = self.chunk_pool.get_mut(chunk_handle) {
                record.load(index, extent);
            }
            if let Some(record) = self.asset_pool.get_mut(asset_handle) {
                record.load(&self.slots[index].source_id);
            }
        }
        self.asset_pool
            .release(asset_handle)
            .map_err(|source| ChunkError::Allocation { op, index, source })?;
        self.chunk_pool
            .release(chunk_handle)
            .map_err(|source| ChunkError::Allocation { op, index, source })?;
        let extent = staged?;

        let bytes = self
            .arena
            .region(extent)
            .ok_or_else(|| ChunkError::Allocation {
                op,
                index,
                source: MemoryError::InvalidMarker {
                    marker: extent.end(),
                    offset: self.arena.offset(),
                },
            })?;
        let buffer = self
            .buffer
            .as_mut()
            .ok_or(ChunkError::NoBuffer { op })?;
        buffer[region].copy_from_slice(bytes);

        let slot = &mut self.slots[index];
        slot.loaded = true;
        slot.staged = Some(extent);
        debug!(index, len = extent.len, arena_offset = extent.offset, "chunk loaded");
        Ok(true)
    }

    /// Put the chunk's bytes in the arena, reusing a live staged copy.
    fn stage_chunk(
        &mut self,
        op: &'static str,
        index: usize,
        provided: Option<&[u8]>,
    ) -> Result<ArenaExtent, ChunkError> {
        let slot = &self.slots[index];
        if provided.is_none() {
            if let Some(extent) = slot.staged {
                if self.arena.region(extent).is_some() {
                    debug!(index, "restoring chunk from arena copy");
                    return Ok(extent);
                }
            }
        }

        let fetched;
        let bytes = if let Some(bytes) = provided {
            bytes
        } else {
            fetched = self.source.fetch(&slot.source_id).map_err(|source| {
                ChunkError::SourceUnavailable {
                    op,
                    index,
                    source_id: slot.source_id.clone(),
                    source,
                }
            })?;
            fetched.as_slice()
        };
        if bytes.len() != slot.byte_length {
            return Err(ChunkError::LengthMismatch {
                op,
                index,
                expected: slot.byte_length,
                actual: bytes.len(),
            });
        }
        self.arena
            .stage(bytes)
            .map_err(|source| ChunkError::Allocation { op, index, source })
    }

    fn clear_chunk(&mut self, op: &'static str, index: usize) -> Result<(), ChunkError> {
        self.check_index(op, index)?;
        if !self.slots[index].loaded {
            return Err(ChunkError::NotLoaded { op, index });
        }
        let region = self.buffer_range(op, index)?;
        if let Some(buffer) = self.buffer.as_mut() {
            buffer[region].fill(0);
        }
        self.slots[index].loaded = false;
        debug!(index, "chunk removed");
        Ok(())
    }

    fn check_index(&self, op: &'static str, index: usize) -> Result<(), ChunkError> {
        if index >= self.slots.len() {
            return Err(ChunkError::InvalidIndex {
                op,
                index,
                len: self.slots.len(),
            });
        }
        Ok(())
    }

    fn buffer_range(&self, op: &'static str, index: usize) -> Result<Range<usize>, ChunkError> {
        let buffer = self.buffer.as_ref().ok_or(ChunkError::NoBuffer { op })?;
        let slot = &self.slots[index];
        if slot.byte_end() > buffer.len() {
            return Err(ChunkError::BufferTooSmall {
                op,
                index,
                required: slot.byte_end(),
                size: buffer.len(),
            });
        }
        Ok(slot.byte_offset..slot.byte_end())
    }

    // ---------------------------------------------------------------------
    // Accessors
    // ---------------------------------------------------------------------

    /// Offset of chunk `index` in the buffer: the sum of all earlier lengths.
    pub fn chunk_start(&self, index: usize) -> Result<usize, ChunkError> {
        self.check_index("chunk start", index)?;
        Ok(self.slots[..index].iter().map(|s| s.byte_length).sum())
    }

    /// Length of chunk `index` in bytes.
    pub fn chunk_length(&self, index: usize) -> Result<usize, ChunkError> {
        self.check_index("chunk length", index)?;
        Ok(self.slots[index].byte_length)
    }

    /// Whether chunk `index` is loaded.
    pub fn is_loaded(&self, index: usize) -> Result<bool, ChunkError> {
        self.check_index("is loaded", index)?;
        Ok(self.slots[index].loaded)
    }

    /// Source identifier chunk `index` is read from.
    pub fn source_id(&self, index: usize) -> Result<&str, ChunkError> {
        self.check_index("source id", index)?;
        Ok(&self.slots[index].source_id)
    }

    /// Slot record for chunk `index`.
    pub fn slot(&self, index: usize) -> Result<&ChunkSlot, ChunkError> {
        self.check_index("slot", index)?;
        Ok(&self.slots[index])
    }

    /// Region of chunk `index` in the buffer (zeroes when unloaded).
    pub fn chunk_bytes(&self, index: usize) -> Result<&[u8], ChunkError> {
        let op = "chunk bytes";
        self.check_index(op, index)?;
        let region = self.buffer_range(op, index)?;
        let buffer = self.buffer.as_deref().ok_or(ChunkError::NoBuffer { op })?;
        Ok(&buffer[region])
    }

    /// All slots in index order.
    #[must_use]
    pub fn slots(&self) -> &[ChunkSlot] {
        &self.slots
    }

    /// Number of known chunks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether no chunks are known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Sum of all chunk lengths.
    #[must_use]
    pub fn total_length(&self) -> usize {
        self.slots.iter().map(|s| s.byte_length).sum()
    }

    /// Read-only view of the assembled buffer.
    #[must_use]
    pub fn buffer(&self) -> Option<&[u8]> {
        self.buffer.as_deref()
    }

    /// The staging arena.
    #[must_use]
    pub fn arena(&self) -> &StackArena {
        &self.arena
    }

    /// The undo/redo log.
    #[must_use]
    pub fn history(&self) -> &ActionLog {
        &self.history
    }

    /// Options the registry was built with.
    #[must_use]
    pub fn options(&self) -> &RegistryOptions {
        &self.options
    }

    /// Usage counters of the chunk and asset pools.
    #[must_use]
    pub fn pool_stats(&self) -> (PoolStats, PoolStats) {
        (self.chunk_pool.stats(), self.asset_pool.stats())
    }

    /// Snapshot for status displays.
    #[must_use]
    pub fn status(&self) -> Status {
        Status {
            loaded: self.slots.iter().map(|s| s.loaded).collect(),
            buffer_size: self.buffer.as_ref().map(Vec::len),
            arena_offset: self.arena.offset(),
            arena_capacity: self.arena.capacity(),
            undo: self.history.undo_len(),
            redo: self.history.redo_len(),
        }
    }

    // ---------------------------------------------------------------------
    // Arena rollback
    // ---------------------------------------------------------------------

    /// Capture the arena offset for a later rollback.
    #[must_use]
    pub fn mark(&self) -> Marker {
        self.arena.mark()
    }

    /// Reclaim arena space allocated after `marker`.
    ///
    /// Loaded chunks keep their buffer bytes; slots whose staged copy was
    /// rolled back will re-read their source the next time they are added.
    pub fn rollback_to(&mut self, marker: Marker) -> Result<(), ChunkError> {
        self.arena
            .rollback_to(marker)
            .map_err(|source| ChunkError::Memory {
                op: "rollback",
                source,
            })?;
        let mut dropped = 0;
        for slot in &mut self.slots {
            if slot.staged.is_some_and(|e| e.end() > marker.offset()) {
                slot.staged = None;
                dropped += 1;
            }
        }
        debug!(offset = marker.offset(), dropped, "arena rolled back");
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Persistence
    // ---------------------------------------------------------------------

    /// Write every loaded chunk as a level record, in index order.
    pub fn save_to<W: Write>(&self, writer: &mut W) -> Result<usize, ChunkError> {
        let buffer = self.buffer.as_deref().unwrap_or_default();
        let records = self
            .slots
            .iter()
            .filter(|s| s.loaded)
            .map(|s| &buffer[s.byte_offset..s.byte_end()]);
        codec::write_records(writer, records)
    }

    /// Save the level to a file.
    pub fn save(&self, path: &Path) -> Result<usize, ChunkError> {
        let file = File::create(path).map_err(|source| ChunkError::Io {
            op: "create level file",
            path: path.to_path_buf(),
            source,
        })?;
        let count = self.save_to(&mut BufWriter::new(file))?;
        info!(path = %path.display(), records = count, "level saved");
        Ok(count)
    }

    /// Replace the registry contents with the records of a level stream.
    ///
    /// The stream is parsed completely and checked against the remaining
    /// arena space before anything changes. Records become chunks `0..n` in
    /// stream order and the registry shrinks to exactly those chunks. A
    /// record keeps the source identifier of a current chunk holding the
    /// same bytes; any other record is named `label#n`.
    pub fn load_from<R: Read>(&mut self, reader: &mut R, label: &str) -> Result<usize, ChunkError> {
        let records = codec::read_records(reader)?;
        let total: usize = records.iter().map(Vec::len).sum();
        let remaining = self.arena.remaining();
        if total > remaining {
            return Err(ChunkError::Memory {
                op: "load level",
                source: MemoryError::OutOfCapacity {
                    requested: total,
                    remaining,
                },
            });
        }

        let mut claimed = vec![false; self.slots.len()];
        let chunks: Vec<(String, usize)> = records
            .iter()
            .enumerate()
            .map(|(index, bytes)| {
                let id = match self.find_holder(bytes, &claimed) {
                    Some(holder) => {
                        claimed[holder] = true;
                        self.slots[holder].source_id.clone()
                    }
                    None => format!("{label}#{index}"),
                };
                (id, bytes.len())
            })
            .collect();
        self.slots = layout(chunks);
        self.buffer = Some(vec![0; total]);
        self.history.clear();

        for (index, bytes) in records.iter().enumerate() {
            self.load_chunk("load", index, Some(bytes))?;
        }
        info!(records = records.len(), total, "level loaded");
        Ok(records.len())
    }

    /// Unclaimed chunk whose current bytes equal `bytes`.
    fn find_holder(&self, bytes: &[u8], claimed: &[bool]) -> Option<usize> {
        self.slots.iter().position(|slot| {
            !claimed[slot.index]
                && slot.byte_length == bytes.len()
                && self.held_bytes(slot) == Some(bytes)
        })
    }

    /// Bytes a slot currently holds: its buffer region when loaded,
    /// otherwise its live arena copy.
    fn held_bytes(&self, slot: &ChunkSlot) -> Option<&[u8]> {
        if slot.loaded {
            let buffer = self.buffer.as_deref()?;
            return buffer.get(slot.byte_offset..slot.byte_end());
        }
        slot.staged.and_then(|extent| self.arena.region(extent))
    }

    /// Load a level file.
    pub fn load(&mut self, path: &Path) -> Result<usize, ChunkError> {
        let file = File::open(path).map_err(|source| ChunkError::Io {
            op: "open level file",
            path: path.to_path_buf(),
            source,
        })?;
        let label = path.display().to_string();
        self.load_from(&mut BufReader::new(file), &label)
    }

    /// Dump the raw assembled buffer to `path`.
    pub fn save_image(&self, path: &Path) -> Result<usize, ChunkError> {
        let buffer = self
            .buffer
            .as_deref()
            .ok_or(ChunkError::NoBuffer { op: "save image" })?;
        std::fs::write(path, buffer).map_err(|source| ChunkError::Io {
            op: "write image",
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), bytes = buffer.len(), "image written");
        Ok(buffer.len())
    }

    fn refresh_image(&self) -> Result<(), ChunkError> {
        match (&self.options.image_path, &self.buffer) {
            (Some(path), Some(_)) => self.save_image(path).map(|_| ()),
            _ => Ok(()),
        }
    }
}

impl fmt::Debug for ChunkRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChunkRegistry")
            .field("slots", &self.slots)
            .field("buffer_size", &self.buffer.as_ref().map(Vec::len))
            .field("arena", &self.arena)
            .field("history", &self.history)
            .finish_non_exhaustive()
    }
}

fn op_name(action: Action) -> &'static str {
    match action {
        Action::Add(_) => "add",
        Action::Remove(_) => "remove",
    }
}

/// Registry state summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Status {
    /// Loaded flag per chunk.
    pub loaded: Vec<bool>,
    /// Buffer size, if a buffer exists.
    pub buffer_size: Option<usize>,
    /// Arena bytes in use.
    pub arena_offset: usize,
    /// Arena capacity.
    pub arena_capacity: usize,
    /// Entries that can be undone.
    pub undo: usize,
    /// Entries that can be redone.
    pub redo: usize,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let chunks: String = self
            .loaded
            .iter()
            .map(|&loaded| if loaded { '#' } else { '.' })
            .collect();
        write!(f, "chunks [{chunks}]   ")?;
        match self.buffer_size {
            Some(size) => write!(f, "buffer {size} bytes   ")?,
            None => write!(f, "no buffer   ")?,
        }
        write!(
            f,
            "arena {}/{}   Undo count ({})   Redo count ({})",
            self.arena_offset, self.arena_capacity, self.undo, self.redo
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;

    fn three_chunk_source() -> MemorySource {
        MemorySource::new()
            .with_chunk("c0", vec![1u8; 10])
            .with_chunk("c1", vec![2u8; 20])
            .with_chunk("c2", vec![3u8; 30])
    }

    fn assembled(capacity: usize) -> ChunkRegistry {
        let mut registry = ChunkRegistry::new(
            three_chunk_source(),
            RegistryOptions::with_arena_capacity(capacity),
        );
        registry.assemble_all(&["c0", "c1", "c2"]).unwrap();
        registry
    }

    #[test]
    fn assemble_lays_out_running_offsets() {
        let registry = assembled(100);
        assert_eq!(registry.chunk_start(2).unwrap(), 30);
        assert_eq!(registry.chunk_length(2).unwrap(), 30);
        assert_eq!(registry.buffer().unwrap().len(), 60);
        assert_eq!(registry.arena().offset(), 60);
        for slot in registry.slots() {
            assert_eq!(slot.byte_offset, registry.chunk_start(slot.index).unwrap());
            assert!(slot.loaded);
        }
    }

    #[test]
    fn assemble_copies_bytes_into_buffer() {
        let registry = assembled(100);
        let buffer = registry.buffer().unwrap();
        assert!(buffer[..10].iter().all(|&b| b == 1));
        assert!(buffer[10..30].iter().all(|&b| b == 2));
        assert!(buffer[30..].iter().all(|&b| b == 3));
    }

    #[test]
    fn assemble_records_adds() {
        let registry = assembled(100);
        assert_eq!(
            registry.history().undo_entries(),
            &[Action::Add(0), Action::Add(1), Action::Add(2)]
        );
    }

    #[test]
    fn add_twice_is_noop() {
        let mut registry = assembled(100);
        let before = registry.buffer().unwrap().to_vec();
        let offset = registry.arena().offset();
        assert!(!registry.add_chunk(1).unwrap());
        assert_eq!(registry.buffer().unwrap(), before.as_slice());
        assert_eq!(registry.arena().offset(), offset);
        assert_eq!(registry.history().undo_len(), 3);
    }

    #[test]
    fn remove_zero_fills_region() {
        let mut registry = assembled(100);
        registry.remove_chunk(1).unwrap();
        let buffer = registry.buffer().unwrap();
        assert!(buffer[10..30].iter().all(|&b| b == 0));
        assert!(buffer[..10].iter().all(|&b| b == 1));
        assert!(!registry.is_loaded(1).unwrap());
        assert_eq!(registry.arena().offset(), 60);
    }

    #[test]
    fn undo_remove_restores_bytes() {
        let mut registry = assembled(100);
        registry.remove_chunk(1).unwrap();
        assert_eq!(registry.undo().unwrap(), Action::Remove(1));
        assert!(registry.is_loaded(1).unwrap());
        assert!(registry.chunk_bytes(1).unwrap().iter().all(|&b| b == 2));
        // Restored from the staged arena copy.
        assert_eq!(registry.arena().offset(), 60);
    }

    #[test]
    fn remove_unloaded_fails() {
        let mut registry = assembled(100);
        registry.remove_chunk(0).unwrap();
        let err = registry.remove_chunk(0).unwrap_err();
        assert!(matches!(err, ChunkError::NotLoaded { index: 0, .. }));
    }

    #[test]
    fn out_of_range_index() {
        let mut registry = assembled(100);
        assert!(matches!(
            registry.add_chunk(3),
            Err(ChunkError::InvalidIndex { index: 3, len: 3, .. })
        ));
        assert!(matches!(
            registry.chunk_start(7),
            Err(ChunkError::InvalidIndex { index: 7, .. })
        ));
        assert!(registry.chunk_length(3).is_err());
        assert!(registry.is_loaded(3).is_err());
    }

    #[test]
    fn undo_redo_empty_stacks() {
        let mut registry = ChunkRegistry::new(MemorySource::new(), RegistryOptions::default());
        assert!(matches!(registry.undo(), Err(ChunkError::NothingToUndo)));
        assert!(matches!(registry.redo(), Err(ChunkError::NothingToRedo)));
    }

    #[test]
    fn new_action_after_undo_clears_redo() {
        let mut registry = assembled(100);
        registry.remove_chunk(2).unwrap();
        registry.undo().unwrap();
        assert_eq!(registry.history().redo_len(), 1);
        registry.remove_chunk(0).unwrap();
        assert_eq!(registry.history().redo_len(), 0);
        assert!(matches!(registry.redo(), Err(ChunkError::NothingToRedo)));
    }

    #[test]
    fn undo_then_redo_moves_entries() {
        let mut registry = assembled(100);
        registry.undo().unwrap();
        assert!(!registry.is_loaded(2).unwrap());
        assert_eq!(registry.history().undo_len(), 2);
        assert_eq!(registry.history().redo_len(), 1);

        assert_eq!(registry.redo().unwrap(), Action::Add(2));
        assert!(registry.is_loaded(2).unwrap());
        assert_eq!(registry.history().undo_len(), 3);
        assert_eq!(registry.history().redo_len(), 0);
    }

    #[test]
    fn source_unavailable_stops_assembly() {
        let source = MemorySource::new()
            .with_chunk("c0", vec![1u8; 4])
            .with_chunk("c1", vec![2u8; 4]);
        let mut registry =
            ChunkRegistry::new(source, RegistryOptions::with_arena_capacity(64));
        let err = registry.assemble_all(&["c0", "missing"]).unwrap_err();
        assert!(matches!(err, ChunkError::SourceUnavailable { index: 1, .. }));
    }

    #[test]
    fn arena_exhaustion_reports_partial_assembly() {
        let mut registry = ChunkRegistry::new(
            three_chunk_source(),
            RegistryOptions::with_arena_capacity(35),
        );
        let err = registry.assemble_all(&["c0", "c1", "c2"]).unwrap_err();
        match &err {
            ChunkError::Assembly { index, loaded, .. } => {
                assert_eq!(*index, 2);
                assert_eq!(*loaded, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(matches!(
            err.memory(),
            Some(MemoryError::OutOfCapacity { requested: 30, remaining: 5 })
        ));
        assert!(registry.is_loaded(0).unwrap());
        assert!(registry.is_loaded(1).unwrap());
        assert!(!registry.is_loaded(2).unwrap());
        assert_eq!(registry.arena().offset(), 30);
    }

    #[test]
    fn failed_undo_keeps_entry() {
        let mut registry = ChunkRegistry::new(
            three_chunk_source(),
            RegistryOptions::with_arena_capacity(100),
        );
        let start = registry.mark();
        registry.assemble_all(&["c0", "c1", "c2"]).unwrap();
        registry.remove_chunk(1).unwrap();
        // Drop every staged copy so the re-add must go back to the source,
        // which now serves the wrong length.
        registry.rollback_to(start).unwrap();
        registry.source = Box::new(MemorySource::new().with_chunk("c1", vec![9u8; 3]));

        let err = registry.undo().unwrap_err();
        assert!(matches!(err, ChunkError::LengthMismatch { index: 1, .. }));
        assert_eq!(registry.history().undo_len(), 4);
        assert_eq!(registry.history().redo_len(), 0);
        assert!(!registry.is_loaded(1).unwrap());
    }

    #[test]
    fn rollback_drops_staged_copies() {
        let mut registry = ChunkRegistry::new(
            three_chunk_source(),
            RegistryOptions::with_arena_capacity(200),
        );
        registry.set_layout(&["c0", "c1", "c2"]).unwrap();
        registry.create_buffer(None).unwrap();
        registry.add_chunk(0).unwrap();
        let marker = registry.mark();
        registry.add_chunk(1).unwrap();
        registry.add_chunk(2).unwrap();

        registry.rollback_to(marker).unwrap();
        assert_eq!(registry.arena().offset(), 10);
        assert!(registry.slot(0).unwrap().staged().is_some());
        assert!(registry.slot(1).unwrap().staged().is_none());
        assert!(registry.slot(2).unwrap().staged().is_none());
        // Buffer bytes survive the rollback.
        assert!(registry.chunk_bytes(2).unwrap().iter().all(|&b| b == 3));

        // Re-adding after removal now re-reads the source into the arena.
        registry.remove_chunk(1).unwrap();
        registry.undo().unwrap();
        assert_eq!(registry.arena().offset(), 30);
        assert!(registry.chunk_bytes(1).unwrap().iter().all(|&b| b == 2));
    }

    #[test]
    fn rollback_past_offset_fails() {
        let mut registry = ChunkRegistry::new(
            three_chunk_source(),
            RegistryOptions::with_arena_capacity(100),
        );
        let start = registry.mark();
        registry.assemble_all(&["c0", "c1", "c2"]).unwrap();
        let late = registry.mark();
        registry.rollback_to(start).unwrap();
        assert!(matches!(
            registry.rollback_to(late),
            Err(ChunkError::Memory {
                op: "rollback",
                source: MemoryError::InvalidMarker { .. }
            })
        ));
    }

    #[test]
    fn create_and_delete_buffer() {
        let mut registry = ChunkRegistry::new(
            three_chunk_source(),
            RegistryOptions::with_arena_capacity(100),
        );
        registry.set_layout(&["c0", "c1", "c2"]).unwrap();
        assert!(matches!(
            registry.add_chunk(0),
            Err(ChunkError::NoBuffer { .. })
        ));

        assert_eq!(registry.create_buffer(None).unwrap(), 60);
        assert!(matches!(
            registry.create_buffer(Some(10)),
            Err(ChunkError::BufferExists { size: 60 })
        ));
        registry.add_chunk(0).unwrap();

        registry.delete_buffer().unwrap();
        assert!(registry.buffer().is_none());
        assert!(!registry.is_loaded(0).unwrap());
        assert_eq!(registry.history().undo_len(), 0);
        assert!(matches!(
            registry.delete_buffer(),
            Err(ChunkError::NoBuffer { .. })
        ));

        // The staged copy is reused after recreating the buffer.
        registry.create_buffer(None).unwrap();
        registry.add_chunk(0).unwrap();
        assert_eq!(registry.arena().offset(), 10);
    }

    #[test]
    fn small_buffer_rejects_chunk() {
        let mut registry = ChunkRegistry::new(
            three_chunk_source(),
            RegistryOptions::with_arena_capacity(100),
        );
        registry.set_layout(&["c0", "c1", "c2"]).unwrap();
        registry.create_buffer(Some(20)).unwrap();
        registry.add_chunk(0).unwrap();
        assert!(matches!(
            registry.add_chunk(1),
            Err(ChunkError::BufferTooSmall { index: 1, required: 30, size: 20, .. })
        ));
        assert_eq!(registry.arena().offset(), 10);
    }

    #[test]
    fn pools_recycle_one_handle_per_load() {
        let registry = assembled(100);
        let (chunk, asset) = registry.pool_stats();
        assert_eq!(chunk.acquires, 3);
        assert_eq!(chunk.releases, 3);
        assert_eq!(chunk.peak_outstanding, 1);
        assert_eq!(asset.acquires, 3);
        assert_eq!(asset.releases, 3);
    }

    #[test]
    fn save_skips_unloaded_chunks() {
        let mut registry = assembled(100);
        registry.remove_chunk(1).unwrap();
        let mut out = Vec::new();
        assert_eq!(registry.save_to(&mut out).unwrap(), 2);
        assert_eq!(out.len(), 8 + 10 + 8 + 30);
        assert_eq!(&out[..8], &10u64.to_le_bytes());
    }

    #[test]
    fn load_reassigns_consecutive_indices() {
        let mut registry = assembled(200);
        registry.remove_chunk(0).unwrap();
        let mut level = Vec::new();
        registry.save_to(&mut level).unwrap();

        let mut fresh = ChunkRegistry::new(
            MemorySource::new(),
            RegistryOptions::with_arena_capacity(100),
        );
        assert_eq!(fresh.load_from(&mut level.as_slice(), "level").unwrap(), 2);
        assert_eq!(fresh.len(), 2);
        assert_eq!(fresh.chunk_length(0).unwrap(), 20);
        assert_eq!(fresh.chunk_start(1).unwrap(), 20);
        assert!(fresh.chunk_bytes(0).unwrap().iter().all(|&b| b == 2));
        assert!(fresh.chunk_bytes(1).unwrap().iter().all(|&b| b == 3));
        assert_eq!(fresh.slot(1).unwrap().source_id, "level#1");
        assert_eq!(fresh.history().undo_len(), 0);
    }

    #[test]
    fn load_over_assembled_registry_keeps_matching_sources() {
        let mut registry = ChunkRegistry::new(
            three_chunk_source(),
            RegistryOptions::with_arena_capacity(200),
        );
        let start = registry.mark();
        registry.assemble_all(&["c0", "c1", "c2"]).unwrap();
        registry.remove_chunk(0).unwrap();
        let mut level = Vec::new();
        registry.save_to(&mut level).unwrap();

        assert_eq!(registry.load_from(&mut level.as_slice(), "level").unwrap(), 2);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.source_id(0).unwrap(), "c1");
        assert_eq!(registry.source_id(1).unwrap(), "c2");
        assert_eq!(registry.chunk_length(0).unwrap(), 20);

        // Drop the staged copies so a re-add has to read the source again.
        registry.rollback_to(start).unwrap();
        registry.remove_chunk(0).unwrap();
        registry.undo().unwrap();
        assert!(registry.is_loaded(0).unwrap());
        assert!(registry.chunk_bytes(0).unwrap().iter().all(|&b| b == 2));
    }

    #[test]
    fn load_names_unmatched_records_after_label() {
        let mut registry = assembled(200);
        let mut level = Vec::new();
        codec::write_records(&mut level, [&[9u8; 20][..], &[3u8; 30][..]]).unwrap();

        registry.load_from(&mut level.as_slice(), "level").unwrap();
        assert_eq!(registry.source_id(0).unwrap(), "level#0");
        assert_eq!(registry.source_id(1).unwrap(), "c2");
    }

    #[test]
    fn load_checks_arena_before_changing_state() {
        let mut registry = assembled(70);
        let mut level = Vec::new();
        registry.save_to(&mut level).unwrap();

        let err = registry.load_from(&mut level.as_slice(), "level").unwrap_err();
        assert!(matches!(
            err,
            ChunkError::Memory {
                op: "load level",
                source: MemoryError::OutOfCapacity { requested: 60, remaining: 10 }
            }
        ));
        assert_eq!(registry.history().undo_len(), 3);
        assert!(registry.is_loaded(2).unwrap());
    }

    #[test]
    fn load_truncated_keeps_state() {
        let mut registry = assembled(200);
        let mut level = Vec::new();
        registry.save_to(&mut level).unwrap();
        level.pop();

        let err = registry.load_from(&mut level.as_slice(), "level").unwrap_err();
        assert!(matches!(err, ChunkError::TruncatedRecord { record: 2, .. }));
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn remove_refreshes_image_file() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("NewImage.tga");
        let options = RegistryOptions {
            image_path: Some(image.clone()),
            ..RegistryOptions::with_arena_capacity(100)
        };
        let mut registry = ChunkRegistry::new(three_chunk_source(), options);
        registry.assemble_all(&["c0", "c1", "c2"]).unwrap();
        assert_eq!(std::fs::read(&image).unwrap(), registry.buffer().unwrap());

        registry.remove_chunk(2).unwrap();
        let written = std::fs::read(&image).unwrap();
        assert!(written[30..].iter().all(|&b| b == 0));
        assert_eq!(written, registry.buffer().unwrap());
    }

    #[test]
    fn status_line_counts() {
        let mut registry = assembled(100);
        registry.remove_chunk(1).unwrap();
        let status = registry.status();
        assert_eq!(status.loaded, vec![true, false, true]);
        assert_eq!(status.undo, 4);
        let line = status.to_string();
        assert!(line.contains("[#.#]"));
        assert!(line.contains("Undo count (4)"));
        assert!(line.contains("Redo count (0)"));
    }
}
