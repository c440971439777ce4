//! chunkasm library: application logic for the chunk assembler.

pub mod app;
pub mod completion;
pub mod config;
pub mod errors;
pub mod version;
