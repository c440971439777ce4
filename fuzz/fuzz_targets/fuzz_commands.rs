#![no_main]

use libfuzzer_sys::fuzz_target;

use chunkasm_core::{ChunkRegistry, Command, MemorySource, RegistryOptions};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    let source = MemorySource::new()
        .with_chunk("a", vec![1u8; 8])
        .with_chunk("b", vec![2u8; 3]);
    let mut registry = ChunkRegistry::new(source, RegistryOptions::with_arena_capacity(64));
    let _ = registry.assemble_all(&["a", "b"]);

    for line in text.lines() {
        let Ok(command) = line.parse::<Command>() else {
            continue;
        };
        // Keep the fuzzer away from the filesystem
        // and from huge buffers
        if matches!(
            command,
            Command::Save(_) | Command::Load(_) | Command::SaveImage(_)
        ) || matches!(command, Command::CreateBuffer(Some(size)) if size > 4096)
        {
            continue;
        }
        let _ = registry.execute(&command);
    }

    // Loaded chunks hold their bytes, unloaded ones are zero
    if registry.buffer().is_some() {
        for index in 0..registry.len() {
            let loaded = registry.is_loaded(index).unwrap();
            let bytes = registry.chunk_bytes(index);
            if let Ok(bytes) = bytes {
                let fill = if index == 0 { 1 } else { 2 };
                let expected = if loaded { fill } else { 0 };
                assert!(bytes.iter().all(|&b| b == expected));
            }
        }
    }
});
