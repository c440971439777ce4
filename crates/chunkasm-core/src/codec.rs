//! Level persistence format.
//!
//! A level is a bare sequence of records, each an 8-byte little-endian length
//! followed by that many raw bytes. There is no header and no padding; the
//! stream must end exactly on a record boundary.

use std::io::{self, Read, Write};

use crate::constants::RECORD_LENGTH_BYTES;
use crate::error::ChunkError;

/// Write every record and return how many were written.
pub fn write_records<'a, W: Write>(
    writer: &mut W,
    records: impl IntoIterator<Item = &'a [u8]>,
) -> Result<usize, ChunkError> {
    let mut count = 0;
    for record in records {
        write_record(writer, record).map_err(|source| ChunkError::Stream {
            op: "write level record",
            source,
        })?;
        count += 1;
    }
    writer.flush().map_err(|source| ChunkError::Stream {
        op: "flush level",
        source,
    })?;
    Ok(count)
}

fn write_record<W: Write>(writer: &mut W, record: &[u8]) -> io::Result<()> {
    let len = u64::try_from(record.len()).map_err(io::Error::other)?;
    writer.write_all(&len.to_le_bytes())?;
    writer.write_all(record)
}

/// Read records until the stream ends cleanly between two records.
pub fn read_records<R: Read>(reader: &mut R) -> Result<Vec<Vec<u8>>, ChunkError> {
    let mut records = Vec::new();
    loop {
        let record = records.len();
        let mut prefix = [0u8; RECORD_LENGTH_BYTES];
        let got = read_full(reader, &mut prefix).map_err(|source| ChunkError::Stream {
            op: "read level record length",
            source,
        })?;
        if got == 0 {
            break;
        }
        if got < RECORD_LENGTH_BYTES {
            return Err(ChunkError::TruncatedRecord {
                record,
                expected: RECORD_LENGTH_BYTES as u64,
                found: got as u64,
            });
        }

        let len = u64::from_le_bytes(prefix);
        // `take` keeps a corrupt length from forcing a huge allocation up front.
        let mut payload = Vec::new();
        reader
            .by_ref()
            .take(len)
            .read_to_end(&mut payload)
            .map_err(|source| ChunkError::Stream {
                op: "read level record",
                source,
            })?;
        if (payload.len() as u64) < len {
            return Err(ChunkError::TruncatedRecord {
                record,
                expected: len,
                found: payload.len() as u64,
            });
        }
        records.push(payload);
    }
    Ok(records)
}

/// Fill `buf` as far as the reader allows, returning the bytes read.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
