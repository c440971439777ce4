//! Application entry point and dispatch.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};

use anyhow::{Context, Result};
use tracing::{debug, info};

use chunkasm_core::{ArenaBudget, ChunkRegistry, Command, FsSource, Outcome, RegistryOptions};
use chunkasm_memory::MemoryError;

use crate::config::AppConfig;
use crate::version;

/// Run the application.
pub fn run(config: &AppConfig) -> Result<()> {
    // Handle shell completion
    if let Some(shell) = config.completion {
        let mut cmd = <AppConfig as clap::CommandFactory>::command();
        crate::completion::generate_completion(&mut cmd, shell, &mut io::stdout());
        return Ok(());
    }

    debug!(version = %version::full_version(), "starting");
    let mut registry = build_registry(config)?;

    let mut stdout = io::stdout().lock();
    let presenter = Presenter {
        quiet: config.quiet,
        json: config.json,
    };
    if !config.quiet {
        writeln!(stdout, "assembled {} chunks ({} bytes)", registry.len(), registry.total_length())?;
    }

    let lines = command_lines(config)?;
    run_commands(&mut registry, lines, &mut stdout, &presenter, config.keep_going)
}

/// Build the registry described by `config` and assemble its chunks.
pub fn build_registry(config: &AppConfig) -> Result<ChunkRegistry> {
    let plan = config.chunk_plan()?;
    let source = match &plan.root {
        Some(root) => FsSource::with_root(root),
        None => FsSource::new(),
    };

    let limit = config.arena_limit()?;
    let arena_capacity = match config.arena_size()? {
        Some(size) => {
            if let Some(limit) = limit.filter(|&limit| size > limit) {
                return Err(arena_over_limit(size, limit));
            }
            size
        }
        None => {
            let budget = ArenaBudget::estimate(&source, &plan.chunks, config.arena_factor)?;
            debug!(
                chunk_bytes = budget.chunk_bytes,
                factor = budget.factor,
                capacity = budget.capacity,
                "arena sized from chunks"
            );
            if !budget.fits_in(limit) {
                return Err(arena_over_limit(budget.capacity, limit.unwrap_or_default()));
            }
            budget.capacity
        }
    };

    let options = RegistryOptions {
        arena_capacity,
        pool_capacity: config.pool_capacity,
        image_path: config.image_path(),
        level_path: config.level.clone(),
    };
    let mut registry = ChunkRegistry::new(source, options);
    registry
        .assemble_all(&plan.chunks)
        .context("assembling chunks")?;
    info!(
        chunks = registry.len(),
        bytes = registry.total_length(),
        arena = registry.arena().capacity(),
        "registry ready"
    );
    Ok(registry)
}

fn arena_over_limit(capacity: usize, limit: usize) -> anyhow::Error {
    anyhow::Error::new(MemoryError::OutOfCapacity {
        requested: capacity,
        remaining: limit,
    })
    .context(format!("arena of {capacity} bytes exceeds limit of {limit} bytes"))
}

type Lines = Box<dyn Iterator<Item = io::Result<String>>>;

/// Commands from `--exec`, then `--script`; stdin when neither is given.
fn command_lines(config: &AppConfig) -> Result<Lines> {
    let exec: Vec<io::Result<String>> = config.exec.iter().cloned().map(Ok).collect();
    let mut lines: Lines = Box::new(exec.into_iter());
    if let Some(path) = &config.script {
        let file = File::open(path)
            .with_context(|| format!("opening script {}", path.display()))?;
        lines = Box::new(lines.chain(BufReader::new(file).lines()));
    } else if config.exec.is_empty() {
        lines = Box::new(io::stdin().lines());
    }
    Ok(lines)
}

/// How outcomes are written.
#[derive(Debug, Clone, Copy, Default)]
pub struct Presenter {
    /// Only print status reports.
    pub quiet: bool,
    /// Print status reports as JSON.
    pub json: bool,
}

impl Presenter {
    /// Write one outcome.
    pub fn present(&self, out: &mut dyn Write, outcome: &Outcome) -> Result<()> {
        match outcome {
            Outcome::Status(status) if self.json => {
                serde_json::to_writer(&mut *out, status)?;
                writeln!(out)?;
            }
            Outcome::Status(status) => writeln!(out, "{status}")?,
            _ if self.quiet => {}
            other => writeln!(out, "{other}")?,
        }
        Ok(())
    }
}

/// Execute command lines until they run out or `quit` is read.
///
/// Blank lines and lines starting with `#` are skipped. A rejected command
/// stops the run unless `keep_going` is set; with it, the first rejection is
/// still returned once every line has run.
pub fn run_commands(
    registry: &mut ChunkRegistry,
    lines: impl IntoIterator<Item = io::Result<String>>,
    out: &mut dyn Write,
    presenter: &Presenter,
    keep_going: bool,
) -> Result<()> {
    let mut first_error = None;
    for (number, line) in lines.into_iter().enumerate() {
        let line = line.context("reading commands")?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if matches!(line, "quit" | "q" | "exit") {
            break;
        }

        let result = line
            .parse::<Command>()
            .and_then(|command| registry.execute(&command));
        match result {
            Ok(outcome) => presenter.present(out, &outcome)?,
            Err(err) => {
                let err = anyhow::Error::new(err).context(format!("line {}: {line}", number + 1));
                if !keep_going {
                    return Err(err);
                }
                eprintln!("Error: {err:#}");
                first_error.get_or_insert(err);
            }
        }
    }
    out.flush()?;
    first_error.map_or(Ok(()), Err)
}
