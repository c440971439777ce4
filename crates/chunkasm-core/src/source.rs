//! Chunk sources: where the raw bytes of each chunk come from.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

/// Provider of raw chunk bytes keyed by a source identifier.
pub trait ChunkSource {
    /// Read every byte of the chunk named by `source_id`.
    fn fetch(&self, source_id: &str) -> io::Result<Vec<u8>>;

    /// Length of the chunk named by `source_id`.
    ///
    /// The default reads the whole chunk; implementations with cheaper
    /// metadata should override it.
    fn length(&self, source_id: &str) -> io::Result<usize> {
        self.fetch(source_id).map(|bytes| bytes.len())
    }
}

/// Chunks stored as files, with identifiers resolved against an optional root.
#[derive(Debug, Clone, Default)]
pub struct FsSource {
    root: Option<PathBuf>,
}

impl FsSource {
    /// Resolve identifiers relative to the working directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative identifiers against `root`.
    #[must_use]
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    /// Filesystem path for a source identifier.
    #[must_use]
    pub fn resolve(&self, source_id: &str) -> PathBuf {
        let path = Path::new(source_id);
        match &self.root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }
}

impl ChunkSource for FsSource {
    fn fetch(&self, source_id: &str) -> io::Result<Vec<u8>> {
        std::fs::read(self.resolve(source_id))
    }

    fn length(&self, source_id: &str) -> io::Result<usize> {
        let len = std::fs::metadata(self.resolve(source_id))?.len();
        usize::try_from(len).map_err(io::Error::other)
    }
}

/// In-memory chunks, handy for tests and generated content.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    chunks: HashMap<String, Vec<u8>>,
}

impl MemorySource {
    /// Create an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a chunk, builder style.
    #[must_use]
    pub fn with_chunk(mut self, source_id: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(source_id, bytes);
        self
    }

    /// Add or replace a chunk.
    pub fn insert(&mut self, source_id: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.chunks.insert(source_id.into(), bytes.into());
    }
}

impl ChunkSource for MemorySource {
    fn fetch(&self, source_id: &str) -> io::Result<Vec<u8>> {
        self.chunks.get(source_id).cloned().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("no chunk named {source_id}"))
        })
    }

    fn length(&self, source_id: &str) -> io::Result<usize> {
        self.chunks.get(source_id).map(Vec::len).ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("no chunk named {source_id}"))
        })
    }
}
