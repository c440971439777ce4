//! Arena budget estimation and byte-size parsing.

use crate::constants::DEFAULT_ARENA_FACTOR;
use crate::error::ChunkError;
use crate::source::ChunkSource;

/// Arena size derived from the chunks it will stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArenaBudget {
    /// Sum of all chunk lengths (also the assembled buffer size).
    pub chunk_bytes: usize,
    /// Multiple of `chunk_bytes` reserved for the arena.
    pub factor: usize,
    /// Arena capacity in bytes.
    pub capacity: usize,
}

impl ArenaBudget {
    /// Measure every chunk and size the arena at `factor` times their total.
    ///
    /// A factor above one leaves room for reloading a level or re-reading
    /// chunks after a rollback without exhausting the arena.
    pub fn estimate<S: AsRef<str>>(
        source: &dyn ChunkSource,
        source_ids: &[S],
        factor: usize,
    ) -> Result<Self, ChunkError> {
        let factor = if factor == 0 {
            DEFAULT_ARENA_FACTOR
        } else {
            factor
        };
        let mut chunk_bytes = 0usize;
        for (index, id) in source_ids.iter().enumerate() {
            let id = id.as_ref();
            let len = source
                .length(id)
                .map_err(|source| ChunkError::SourceUnavailable {
                    op: "measure",
                    index,
                    source_id: id.to_string(),
                    source,
                })?;
            chunk_bytes = chunk_bytes.saturating_add(len);
        }
        Ok(Self {
            chunk_bytes,
            factor,
            capacity: chunk_bytes.saturating_mul(factor),
        })
    }

    /// Check if the arena fits within a limit (`None` = unlimited).
    #[must_use]
    pub fn fits_in(&self, limit: Option<usize>) -> bool {
        limit.map_or(true, |limit| self.capacity <= limit)
    }
}

/// Parse a byte size string (e.g. "8G", "512M", "4K", "100B", "100").
///
/// The empty string parses as 0, meaning "derive the size".
pub fn parse_byte_size(s: &str) -> Result<usize, String> {
    let s = s.trim();
    if s.is_empty() {
        return Ok(0);
    }

    let (num_str, multiplier) = if let Some(n) = s.strip_suffix('G') {
        (n, 1024 * 1024 * 1024)
    } else if let Some(n) = s.strip_suffix('M') {
        (n, 1024 * 1024)
    } else if let Some(n) = s.strip_suffix('K') {
        (n, 1024)
    } else if let Some(n) = s.strip_suffix('B') {
        (n, 1)
    } else {
        (s, 1)
    };

    let value: usize = num_str
        .trim()
        .parse()
        .map_err(|e| format!("invalid byte size {s:?}: {e}"))?;
    value
        .checked_mul(multiplier)
        .ok_or_else(|| format!("byte size {s:?} overflows"))
}
