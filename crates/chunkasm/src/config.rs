//! Application configuration from CLI flags and environment.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;

use chunkasm_core::{parse_byte_size, DEFAULT_IMAGE_PATH, DEFAULT_LEVEL_PATH};

/// chunkasm: assemble binary level chunks into one image buffer.
#[derive(Parser, Debug)]
#[command(name = "chunkasm", version, about)]
pub struct AppConfig {
    /// Chunk files to assemble, in order.
    #[arg(value_name = "CHUNK")]
    pub chunks: Vec<String>,

    /// JSON manifest listing chunks (and optionally their directory).
    #[arg(short, long, env = "CHUNKASM_MANIFEST")]
    pub manifest: Option<PathBuf>,

    /// Directory chunk paths are resolved against.
    #[arg(short, long, env = "CHUNKASM_ASSETS")]
    pub assets: Option<PathBuf>,

    /// Raw image dump, rewritten after assembly and every removal.
    #[arg(long, default_value = DEFAULT_IMAGE_PATH, env = "CHUNKASM_IMAGE")]
    pub image: PathBuf,

    /// Do not write the image dump automatically.
    #[arg(long)]
    pub no_image: bool,

    /// Level file used by `save` and `load` without a path.
    #[arg(short, long, default_value = DEFAULT_LEVEL_PATH, env = "CHUNKASM_LEVEL")]
    pub level: PathBuf,

    /// Fixed arena size (e.g. "64M", "4096"); derived from the chunks if empty.
    #[arg(long, default_value = "", env = "CHUNKASM_ARENA_SIZE")]
    pub arena_size: String,

    /// Largest arena to allocate (e.g. "512M"); unlimited if empty.
    #[arg(long, default_value = "", env = "CHUNKASM_MAX_ARENA")]
    pub max_arena: String,

    /// Arena size as a multiple of the total chunk size.
    #[arg(long, default_value = "2")]
    pub arena_factor: usize,

    /// Instances per supporting object pool.
    #[arg(long, default_value = "7")]
    pub pool_capacity: usize,

    /// Command to run after assembly (repeatable).
    #[arg(short = 'e', long = "exec", value_name = "COMMAND")]
    pub exec: Vec<String>,

    /// File of commands to run after assembly, one per line.
    #[arg(short, long)]
    pub script: Option<PathBuf>,

    /// Keep running commands after one is rejected.
    #[arg(short, long)]
    pub keep_going: bool,

    /// Print status reports as JSON.
    #[arg(long)]
    pub json: bool,

    /// Quiet mode (only errors and status reports).
    #[arg(short, long)]
    pub quiet: bool,

    /// Verbose output.
    #[arg(short, long)]
    pub verbose: bool,

    /// Generate shell completion.
    #[arg(long, value_enum)]
    pub completion: Option<clap_complete::Shell>,
}

/// Chunk list read from a JSON manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    /// Directory chunk paths are resolved against, relative to the manifest.
    #[serde(default)]
    pub root: Option<PathBuf>,
    /// Chunk paths in assembly order.
    pub chunks: Vec<String>,
}

impl Manifest {
    /// Read and parse a manifest file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading manifest {}", path.display()))?;
        let mut manifest: Self = serde_json::from_str(&text)
            .with_context(|| format!("parsing manifest {}", path.display()))?;
        if let (Some(root), Some(dir)) = (&manifest.root, path.parent()) {
            if root.is_relative() {
                manifest.root = Some(dir.join(root));
            }
        }
        Ok(manifest)
    }
}

/// The chunks to assemble and where to find them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkPlan {
    /// Directory chunk paths are resolved against.
    pub root: Option<PathBuf>,
    /// Chunk paths in assembly order.
    pub chunks: Vec<String>,
}

impl AppConfig {
    /// Parse CLI arguments.
    #[must_use]
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    /// Merge manifest and positional chunks; `--assets` wins over the
    /// manifest root.
    pub fn chunk_plan(&self) -> Result<ChunkPlan> {
        let manifest = match &self.manifest {
            Some(path) => Manifest::load(path)?,
            None => Manifest::default(),
        };
        let mut chunks = manifest.chunks;
        chunks.extend(self.chunks.iter().cloned());
        Ok(ChunkPlan {
            root: self.assets.clone().or(manifest.root),
            chunks,
        })
    }

    /// Arena size override, `None` when it should be derived.
    pub fn arena_size(&self) -> Result<Option<usize>> {
        let size = parse_byte_size(&self.arena_size).map_err(anyhow::Error::msg)?;
        Ok((size > 0).then_some(size))
    }

    /// Arena size limit, `None` when unlimited.
    pub fn arena_limit(&self) -> Result<Option<usize>> {
        let limit = parse_byte_size(&self.max_arena).map_err(anyhow::Error::msg)?;
        Ok((limit > 0).then_some(limit))
    }

    /// Image dump path, unless disabled.
    #[must_use]
    pub fn image_path(&self) -> Option<PathBuf> {
        (!self.no_image).then(|| self.image.clone())
    }

    /// Log level for the tracing subscriber.
    #[must_use]
    pub fn log_level(&self) -> tracing::Level {
        if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::WARN
        }
    }
}
