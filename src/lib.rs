//! Shared fixtures for the workspace integration tests.

use std::io;
use std::path::Path;

use chunkasm_core::MemorySource;

/// Source id of fixture chunk `index`.
#[must_use]
pub fn chunk_id(index: usize) -> String {
    format!("chunk{index}.bin")
}

/// Fill byte of fixture chunk `index`; never zero, so removal is visible.
#[must_use]
pub fn fill_byte(index: usize) -> u8 {
    u8::try_from(index % 255).unwrap_or(0) + 1
}

/// In-memory chunks of the given sizes, chunk `i` filled with `fill_byte(i)`.
#[must_use]
pub fn memory_chunks(sizes: &[usize]) -> (MemorySource, Vec<String>) {
    let mut source = MemorySource::new();
    let ids: Vec<String> = (0..sizes.len()).map(chunk_id).collect();
    for (index, (&size, id)) in sizes.iter().zip(&ids).enumerate() {
        source.insert(id.clone(), vec![fill_byte(index); size]);
    }
    (source, ids)
}

/// Write the same chunks as files under `dir`.
pub fn write_chunk_files(dir: &Path, sizes: &[usize]) -> io::Result<Vec<String>> {
    let mut ids = Vec::with_capacity(sizes.len());
    for (index, &size) in sizes.iter().enumerate() {
        let id = chunk_id(index);
        std::fs::write(dir.join(&id), vec![fill_byte(index); size])?;
        ids.push(id);
    }
    Ok(ids)
}
