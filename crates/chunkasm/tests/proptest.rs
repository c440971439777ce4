//! Property-based tests for the command runner.

use std::io;

use proptest::prelude::*;

use chunkasm_core::{ChunkRegistry, Command, MemorySource, RegistryOptions};
use chunkasm_lib::app::{run_commands, Presenter};

fn registry() -> ChunkRegistry {
    let source = MemorySource::new()
        .with_chunk("a", vec![1u8; 8])
        .with_chunk("b", vec![2u8; 16])
        .with_chunk("c", vec![3u8; 4]);
    let mut registry = ChunkRegistry::new(source, RegistryOptions::with_arena_capacity(256));
    registry.assemble_all(&["a", "b", "c"]).unwrap();
    registry
}

fn command_line() -> impl Strategy<Value = String> {
    prop_oneof![
        (0usize..5).prop_map(|i| format!("add {i}")),
        (0usize..5).prop_map(|i| format!("r {i}")),
        Just("undo".to_string()),
        Just("y".to_string()),
        Just("status".to_string()),
        // Never a valid verb, so it cannot touch files or the buffer.
        "[0-9][a-z0-9 ]{0,10}",
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Arbitrary scripts never panic and keep the buffer consistent with
    /// the loaded flags.
    #[test]
    fn scripts_keep_buffer_consistent(script in prop::collection::vec(command_line(), 0..30)) {
        let mut registry = registry();
        let lines = script.into_iter().map(Ok::<_, io::Error>);
        let mut out = Vec::new();
        let _ = run_commands(&mut registry, lines, &mut out, &Presenter::default(), true);

        let fills = [1u8, 2, 3];
        for (i, fill) in fills.iter().enumerate() {
            let expected = if registry.is_loaded(i).unwrap() { *fill } else { 0 };
            prop_assert!(registry.chunk_bytes(i).unwrap().iter().all(|&b| b == expected));
        }
    }

    /// Every command's display form parses back to the same command.
    #[test]
    fn display_round_trips(index in 0usize..1000, size in 0usize..100_000) {
        for command in [
            Command::Add(index),
            Command::Remove(index),
            Command::CreateBuffer(Some(size)),
        ] {
            let parsed: Command = command.to_string().parse().unwrap();
            prop_assert_eq!(parsed, command);
        }
    }
}
