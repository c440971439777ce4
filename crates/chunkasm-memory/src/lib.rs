//! # chunkasm-memory
//!
//! Memory management for the `chunkasm` workspace.
//!
//! Provides a fixed-capacity stack arena with marker-based rollback and a
//! fixed-capacity recycling pool that never allocates after warm-up.
#![warn(missing_docs)]

pub mod arena;
pub mod error;
pub mod pool;
pub mod stats;

pub use arena::{ArenaExtent, Marker, StackArena};
pub use error::MemoryError;
pub use pool::{PoolHandle, RecyclingPool};
pub use stats::PoolStats;
