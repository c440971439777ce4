//! Text commands and their dispatch onto a registry.
//!
//! One command per line. Each has a long form and a one-letter shortcut:
//!
//! | Command            | Shortcut | Effect                                  |
//! |--------------------|----------|-----------------------------------------|
//! | `add N`            | `a N`    | load chunk N                            |
//! | `remove N`         | `r N`    | zero chunk N                            |
//! | `undo`             | `z`      | revert the last action                  |
//! | `redo`             | `y`      | re-apply the last undone action         |
//! | `create [SIZE]`    | `c`      | create the image buffer                 |
//! | `delete`           | `d`      | delete the image buffer                 |
//! | `save [PATH]`      | `s`      | save loaded chunks as a level           |
//! | `load [PATH]`      | `l`      | replace the registry with a level       |
//! | `image [PATH]`     | `i`      | dump the raw image buffer               |
//! | `status`           | `?`      | print the registry state                |

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use tracing::warn;

use crate::budget::parse_byte_size;
use crate::constants::DEFAULT_IMAGE_PATH;
use crate::error::ChunkError;
use crate::history::Action;
use crate::registry::{ChunkRegistry, Status};

/// A parsed registry command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Load a chunk.
    Add(usize),
    /// Remove a chunk.
    Remove(usize),
    /// Undo the last action.
    Undo,
    /// Redo the last undone action.
    Redo,
    /// Create the buffer, sized to the layout when `None`.
    CreateBuffer(Option<usize>),
    /// Delete the buffer.
    DeleteBuffer,
    /// Save a level, to the configured path when `None`.
    Save(Option<PathBuf>),
    /// Load a level, from the configured path when `None`.
    Load(Option<PathBuf>),
    /// Dump the image, to the configured or default path when `None`.
    SaveImage(Option<PathBuf>),
    /// Report the registry state.
    Status,
}

impl FromStr for Command {
    type Err = ChunkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse_err = |reason: &str| ChunkError::Parse {
            input: s.to_string(),
            reason: reason.to_string(),
        };

        let mut words = s.split_whitespace();
        let verb = words.next().ok_or_else(|| parse_err("empty command"))?;
        let arg = words.next();
        if words.next().is_some() {
            return Err(parse_err("too many arguments"));
        }

        let index = |arg: Option<&str>| -> Result<usize, ChunkError> {
            let arg = arg.ok_or_else(|| parse_err("missing chunk index"))?;
            arg.parse()
                .map_err(|e| parse_err(&format!("bad chunk index {arg:?}: {e}")))
        };
        let no_arg = |cmd: Command| -> Result<Command, ChunkError> {
            match arg {
                Some(_) => Err(parse_err("unexpected argument")),
                None => Ok(cmd),
            }
        };

        match verb.to_ascii_lowercase().as_str() {
            "add" | "a" => Ok(Self::Add(index(arg)?)),
            "remove" | "r" => Ok(Self::Remove(index(arg)?)),
            "undo" | "z" => no_arg(Self::Undo),
            "redo" | "y" => no_arg(Self::Redo),
            "create" | "c" => {
                let size = arg
                    .map(parse_byte_size)
                    .transpose()
                    .map_err(|e| parse_err(&e))?;
                Ok(Self::CreateBuffer(size))
            }
            "delete" | "d" => no_arg(Self::DeleteBuffer),
            "save" | "s" => Ok(Self::Save(arg.map(PathBuf::from))),
            "load" | "l" => Ok(Self::Load(arg.map(PathBuf::from))),
            "image" | "i" => Ok(Self::SaveImage(arg.map(PathBuf::from))),
            "status" | "?" => no_arg(Self::Status),
            _ => Err(parse_err("unknown command")),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Add(index) => write!(f, "add {index}"),
            Self::Remove(index) => write!(f, "remove {index}"),
            Self::Undo => write!(f, "undo"),
            Self::Redo => write!(f, "redo"),
            Self::CreateBuffer(Some(size)) => write!(f, "create {size}"),
            Self::CreateBuffer(None) => write!(f, "create"),
            Self::DeleteBuffer => write!(f, "delete"),
            Self::Save(path) => write_path(f, "save", path.as_ref()),
            Self::Load(path) => write_path(f, "load", path.as_ref()),
            Self::SaveImage(path) => write_path(f, "image", path.as_ref()),
            Self::Status => write!(f, "status"),
        }
    }
}

fn write_path(f: &mut fmt::Formatter<'_>, verb: &str, path: Option<&PathBuf>) -> fmt::Result {
    match path {
        Some(path) => write!(f, "{verb} {}", path.display()),
        None => write!(f, "{verb}"),
    }
}

/// Result of a successfully executed command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A chunk was loaded.
    Added(usize),
    /// The chunk was already loaded; nothing changed.
    AlreadyLoaded(usize),
    /// A chunk was removed.
    Removed(usize),
    /// An action was undone.
    Undone(Action),
    /// An action was redone.
    Redone(Action),
    /// A buffer of this size was created.
    BufferCreated(usize),
    /// The buffer was deleted.
    BufferDeleted,
    /// A level with this many records was saved.
    Saved {
        /// Level file.
        path: PathBuf,
        /// Records written.
        records: usize,
    },
    /// A level with this many records was loaded.
    Loaded {
        /// Level file.
        path: PathBuf,
        /// Records read.
        records: usize,
    },
    /// The image was written.
    ImageSaved {
        /// Image file.
        path: PathBuf,
        /// Bytes written.
        bytes: usize,
    },
    /// Registry state.
    Status(Status),
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Added(index) => write!(f, "chunk {index} added"),
            Self::AlreadyLoaded(index) => write!(f, "chunk {index} already loaded"),
            Self::Removed(index) => write!(f, "chunk {index} removed"),
            Self::Undone(action) => write!(f, "undid {action}"),
            Self::Redone(action) => write!(f, "redid {action}"),
            Self::BufferCreated(size) => write!(f, "buffer created ({size} bytes)"),
            Self::BufferDeleted => write!(f, "buffer deleted"),
            Self::Saved { path, records } => {
                write!(f, "saved {records} chunks to {}", path.display())
            }
            Self::Loaded { path, records } => {
                write!(f, "loaded {records} chunks from {}", path.display())
            }
            Self::ImageSaved { path, bytes } => {
                write!(f, "wrote {bytes} bytes to {}", path.display())
            }
            Self::Status(status) => write!(f, "{status}"),
        }
    }
}

impl ChunkRegistry {
    /// Run one command against the registry.
    pub fn execute(&mut self, command: &Command) -> Result<Outcome, ChunkError> {
        let outcome = self.dispatch(command);
        if let Err(err) = &outcome {
            warn!(%command, chunk = ?err.index(), error = %err, "command rejected");
        }
        outcome
    }

    fn dispatch(&mut self, command: &Command) -> Result<Outcome, ChunkError> {
        match command {
            Command::Add(index) => Ok(if self.add_chunk(*index)? {
                Outcome::Added(*index)
            } else {
                Outcome::AlreadyLoaded(*index)
            }),
            Command::Remove(index) => {
                self.remove_chunk(*index)?;
                Ok(Outcome::Removed(*index))
            }
            Command::Undo => self.undo().map(Outcome::Undone),
            Command::Redo => self.redo().map(Outcome::Redone),
            Command::CreateBuffer(size) => self.create_buffer(*size).map(Outcome::BufferCreated),
            Command::DeleteBuffer => {
                self.delete_buffer()?;
                Ok(Outcome::BufferDeleted)
            }
            Command::Save(path) => {
                let path = path.clone().unwrap_or_else(|| self.options().level_path.clone());
                let records = self.save(&path)?;
                Ok(Outcome::Saved { path, records })
            }
            Command::Load(path) => {
                let path = path.clone().unwrap_or_else(|| self.options().level_path.clone());
                let records = self.load(&path)?;
                Ok(Outcome::Loaded { path, records })
            }
            Command::SaveImage(path) => {
                let path = path
                    .clone()
                    .or_else(|| self.options().image_path.clone())
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_IMAGE_PATH));
                let bytes = self.save_image(&path)?;
                Ok(Outcome::ImageSaved { path, bytes })
            }
            Command::Status => Ok(Outcome::Status(self.status())),
        }
    }
}
