#![no_main]

use libfuzzer_sys::fuzz_target;

use chunkasm_core::codec::{read_records, write_records};
use chunkasm_core::{ChunkRegistry, MemorySource, RegistryOptions};

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes either parse or fail cleanly, never panic
    let Ok(records) = read_records(&mut &data[..]) else {
        return;
    };

    // Anything that parsed re-encodes to the same bytes
    let mut encoded = Vec::new();
    write_records(&mut encoded, records.iter().map(Vec::as_slice)).unwrap();
    assert_eq!(encoded, data);

    // A small arena must reject large levels without touching state
    let mut registry = ChunkRegistry::new(MemorySource::new(), RegistryOptions::with_arena_capacity(4096));
    let _ = registry.load_from(&mut &data[..], "fuzz");
});
