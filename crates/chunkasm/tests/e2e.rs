//! End-to-end CLI integration tests.

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn chunkasm(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("chunkasm").expect("binary not found");
    cmd.current_dir(dir)
        .env_remove("CHUNKASM_MANIFEST")
        .env_remove("CHUNKASM_ASSETS")
        .env_remove("CHUNKASM_IMAGE")
        .env_remove("CHUNKASM_LEVEL")
        .env_remove("CHUNKASM_ARENA_SIZE")
        .env_remove("CHUNKASM_MAX_ARENA")
        .env_remove("RUST_LOG");
    cmd
}

/// Three chunks of 10, 20 and 30 bytes filled with 1, 2 and 3.
fn fixture() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (name, fill, len) in [("a.bin", 1u8, 10), ("b.bin", 2, 20), ("c.bin", 3, 30)] {
        std::fs::write(dir.path().join(name), vec![fill; len]).unwrap();
    }
    dir
}

#[test]
fn help_flag() {
    let dir = fixture();
    chunkasm(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("chunks"));
}

#[test]
fn version_flag() {
    let dir = fixture();
    chunkasm(dir.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("chunkasm"));
}

#[test]
fn assemble_writes_image() {
    let dir = fixture();
    chunkasm(dir.path())
        .args(["a.bin", "b.bin", "c.bin", "-e", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("assembled 3 chunks (60 bytes)"))
        .stdout(predicate::str::contains("arena 60/120"));

    let image = std::fs::read(dir.path().join("NewImage.tga")).unwrap();
    assert_eq!(image.len(), 60);
    assert!(image[..10].iter().all(|&b| b == 1));
    assert!(image[10..30].iter().all(|&b| b == 2));
    assert!(image[30..].iter().all(|&b| b == 3));
}

#[test]
fn remove_rewrites_image() {
    let dir = fixture();
    chunkasm(dir.path())
        .args(["a.bin", "b.bin", "c.bin", "-e", "remove 1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("chunk 1 removed"));

    let image = std::fs::read(dir.path().join("NewImage.tga")).unwrap();
    assert!(image[10..30].iter().all(|&b| b == 0));
    assert!(image[30..].iter().all(|&b| b == 3));
}

#[test]
fn commands_from_stdin() {
    let dir = fixture();
    chunkasm(dir.path())
        .args(["a.bin", "b.bin", "c.bin", "--no-image"])
        .write_stdin("r 0\nz\ny\n?\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("undid RemoveChunk 0"))
        .stdout(predicate::str::contains("redid RemoveChunk 0"))
        .stdout(predicate::str::contains("chunks [.##]"));
    assert!(!dir.path().join("NewImage.tga").exists());
}

#[test]
fn script_file() {
    let dir = fixture();
    std::fs::write(dir.path().join("edit.txt"), "# drop the middle\nremove 1\nstatus\n").unwrap();
    chunkasm(dir.path())
        .args(["a.bin", "b.bin", "c.bin", "--script", "edit.txt", "-q"])
        .assert()
        .success()
        .stdout(predicate::str::contains("chunks [#.#]"))
        .stdout(predicate::str::contains("chunk 1 removed").not());
}

#[test]
fn save_then_load_level() {
    let dir = fixture();
    chunkasm(dir.path())
        .args(["a.bin", "b.bin", "c.bin", "-e", "remove 0", "-e", "save"])
        .assert()
        .success()
        .stdout(predicate::str::contains("saved 2 chunks to level.bin"));

    let level = std::fs::read(dir.path().join("level.bin")).unwrap();
    assert_eq!(level.len(), 8 + 20 + 8 + 30);

    chunkasm(dir.path())
        .args(["--arena-size", "1K", "--no-image", "-e", "load", "-e", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("loaded 2 chunks from level.bin"))
        .stdout(predicate::str::contains("chunks [##]   buffer 50 bytes"));
}

#[test]
fn manifest_with_root() {
    let dir = fixture();
    let assets = dir.path().join("assets");
    std::fs::create_dir(&assets).unwrap();
    std::fs::rename(dir.path().join("b.bin"), assets.join("b.bin")).unwrap();
    std::fs::write(
        dir.path().join("level.json"),
        r#"{"root": "assets", "chunks": ["b.bin"]}"#,
    )
    .unwrap();

    chunkasm(dir.path())
        .args(["--manifest", "level.json", "--json", "-q", "-e", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""loaded":[true]"#))
        .stdout(predicate::str::contains(r#""buffer_size":20"#));
}

#[test]
fn missing_chunk_exits_with_io_code() {
    let dir = fixture();
    chunkasm(dir.path())
        .args(["a.bin", "nope.bin"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("nope.bin"));
}

#[test]
fn small_arena_exits_with_capacity_code() {
    let dir = fixture();
    chunkasm(dir.path())
        .args(["a.bin", "b.bin", "c.bin", "--arena-size", "35"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("chunk 2"));
}

#[test]
fn max_arena_sufficient() {
    let dir = fixture();
    chunkasm(dir.path())
        .args(["a.bin", "b.bin", "c.bin", "--max-arena", "1K", "-q"])
        .assert()
        .success();
}

#[test]
fn max_arena_insufficient() {
    let dir = fixture();
    chunkasm(dir.path())
        .args(["a.bin", "b.bin", "c.bin", "--max-arena", "100"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("exceeds limit of 100 bytes"));
    assert!(!dir.path().join("NewImage.tga").exists());
}

#[test]
fn explicit_arena_size_over_limit() {
    let dir = fixture();
    chunkasm(dir.path())
        .args(["a.bin", "--arena-size", "4K", "--max-arena", "1K"])
        .assert()
        .code(4);
}

#[test]
fn rejected_command_exits_nonzero() {
    let dir = fixture();
    chunkasm(dir.path())
        .args(["a.bin", "-e", "undo", "-e", "undo"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("nothing to undo"));
}

#[test]
fn unknown_command_is_config_error() {
    let dir = fixture();
    chunkasm(dir.path())
        .args(["a.bin", "-e", "jump 3"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unknown command"));
}

#[test]
fn truncated_level_is_corrupt() {
    let dir = fixture();
    std::fs::write(dir.path().join("level.bin"), [5, 0, 0, 0, 0, 0, 0, 0, 1, 2]).unwrap();
    chunkasm(dir.path())
        .args(["--arena-size", "64", "--no-image", "-e", "load"])
        .assert()
        .code(5)
        .stderr(predicate::str::contains("truncated"));
}

#[test]
fn completion_bash() {
    let dir = fixture();
    chunkasm(dir.path())
        .args(["--completion", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("chunkasm"));
}
