//! # chunkasm-core
//!
//! Core library for chunkasm, a level assembler that copies binary chunks
//! into one contiguous image buffer. Provides the chunk registry with
//! undo/redo, the level persistence codec, and the text command surface.
//!
//! # Example
//! ```
//! use chunkasm_core::{ChunkRegistry, MemorySource, RegistryOptions};
//!
//! let source = MemorySource::new()
//!     .with_chunk("floor", vec![1; 10])
//!     .with_chunk("walls", vec![2; 20]);
//! let mut registry = ChunkRegistry::new(source, RegistryOptions::with_arena_capacity(64));
//! registry.assemble_all(&["floor", "walls"]).unwrap();
//! assert_eq!(registry.chunk_start(1).unwrap(), 10);
//!
//! registry.remove_chunk(1).unwrap();
//! registry.undo().unwrap();
//! assert!(registry.is_loaded(1).unwrap());
//! ```

pub mod budget;
pub mod codec;
pub mod command;
pub mod constants;
pub mod error;
pub mod history;
pub mod options;
pub mod provenance;
pub mod registry;
pub mod slot;
pub mod source;

// Re-exports
pub use budget::{parse_byte_size, ArenaBudget};
pub use command::{Command, Outcome};
pub use constants::{exit_codes, DEFAULT_IMAGE_PATH, DEFAULT_LEVEL_PATH, DEFAULT_POOL_CAPACITY};
pub use error::ChunkError;
pub use history::{Action, ActionLog};
pub use options::RegistryOptions;
pub use registry::{ChunkRegistry, Status};
pub use slot::ChunkSlot;
pub use source::{ChunkSource, FsSource, MemorySource};
