//! Constants for chunk assembly, persistence, and configuration defaults.

/// Width of the little-endian length prefix in front of every level record.
pub const RECORD_LENGTH_BYTES: usize = 8;

/// Default number of instances in each supporting object pool.
pub const DEFAULT_POOL_CAPACITY: usize = 7;

/// Default arena size as a multiple of the total chunk size.
pub const DEFAULT_ARENA_FACTOR: usize = 2;

/// Default path of the raw assembled image dump.
pub const DEFAULT_IMAGE_PATH: &str = "NewImage.tga";

/// Default path of the persisted level.
pub const DEFAULT_LEVEL_PATH: &str = "level.bin";

/// Name of the pool holding chunk provenance records.
pub const CHUNK_POOL_NAME: &str = "chunk";

/// Name of the pool holding asset provenance records.
pub const ASSET_POOL_NAME: &str = "asset";

/// Process exit codes.
pub mod exit_codes {
    /// Successful execution.
    pub const SUCCESS: i32 = 0;
    /// Generic error.
    pub const ERROR_GENERIC: i32 = 1;
    /// Invalid configuration or command.
    pub const ERROR_CONFIG: i32 = 2;
    /// A chunk source or file could not be read or written.
    pub const ERROR_IO: i32 = 3;
    /// The arena or a pool ran out of room.
    pub const ERROR_CAPACITY: i32 = 4;
    /// A persisted level is malformed.
    pub const ERROR_CORRUPT: i32 = 5;
}
