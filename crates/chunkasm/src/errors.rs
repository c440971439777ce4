//! Error handling and exit codes.

use chunkasm_core::constants::exit_codes;
use chunkasm_core::ChunkError;
use chunkasm_memory::MemoryError;

/// Exit code for a registry error.
pub fn handle_error(err: &ChunkError) -> i32 {
    if err.memory().is_some() {
        return exit_codes::ERROR_CAPACITY;
    }
    match err {
        ChunkError::Assembly { source, .. } => handle_error(source),
        ChunkError::SourceUnavailable { .. } | ChunkError::Io { .. } | ChunkError::Stream { .. } => {
            exit_codes::ERROR_IO
        }
        ChunkError::TruncatedRecord { .. } | ChunkError::LengthMismatch { .. } => {
            exit_codes::ERROR_CORRUPT
        }
        ChunkError::Parse { .. } => exit_codes::ERROR_CONFIG,
        _ => exit_codes::ERROR_GENERIC,
    }
}

/// Exit code for any error reaching `main`.
pub fn exit_code(err: &anyhow::Error) -> i32 {
    if let Some(err) = err.downcast_ref::<ChunkError>() {
        return handle_error(err);
    }
    if err.downcast_ref::<MemoryError>().is_some() {
        return exit_codes::ERROR_CAPACITY;
    }
    if err.downcast_ref::<std::io::Error>().is_some() {
        return exit_codes::ERROR_IO;
    }
    if err.downcast_ref::<serde_json::Error>().is_some() {
        return exit_codes::ERROR_CONFIG;
    }
    exit_codes::ERROR_GENERIC
}
