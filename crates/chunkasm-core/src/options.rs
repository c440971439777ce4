//! Registry options.

use std::path::PathBuf;

use crate::constants::{DEFAULT_LEVEL_PATH, DEFAULT_POOL_CAPACITY};

/// Options for a chunk registry.
#[derive(Debug, Clone)]
pub struct RegistryOptions {
    /// Fixed arena size in bytes.
    pub arena_capacity: usize,
    /// Instances per supporting object pool (0 = default).
    pub pool_capacity: usize,
    /// Raw image dump refreshed after assembly and every removal.
    pub image_path: Option<PathBuf>,
    /// Level file used by `save`/`load` commands without a path.
    pub level_path: PathBuf,
}

impl Default for RegistryOptions {
    fn default() -> Self {
        Self {
            arena_capacity: 0,
            pool_capacity: DEFAULT_POOL_CAPACITY,
            image_path: None,
            level_path: PathBuf::from(DEFAULT_LEVEL_PATH),
        }
    }
}

impl RegistryOptions {
    /// Options with the given arena size and defaults elsewhere.
    #[must_use]
    pub fn with_arena_capacity(arena_capacity: usize) -> Self {
        Self {
            arena_capacity,
            ..Self::default()
        }
    }

    /// Normalize options, applying defaults where values are zero.
    #[must_use]
    pub fn normalize(mut self) -> Self {
        if self.pool_capacity == 0 {
            self.pool_capacity = DEFAULT_POOL_CAPACITY;
        }
        if self.level_path.as_os_str().is_empty() {
            self.level_path = PathBuf::from(DEFAULT_LEVEL_PATH);
        }
        self
    }
}
