// src/errors.rs

//! Crate-wide error type and result alias.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// A malformed line in a rule file.
///
/// Carries the offending line verbatim together with its 1-based line number
/// so the message can point the user straight at it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsingError {
    pub message: String,
    pub line: String,
    pub line_number: usize,
}

impl ParsingError {
    pub fn new(message: impl Into<String>, line: impl Into<String>, line_number: usize) -> Self {
        Self {
            message: message.into(),
            line: line.into(),
            line_number,
        }
    }
}

impl fmt::Display for ParsingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (line {}: {:?})",
            self.message, self.line_number, self.line
        )
    }
}

impl std::error::Error for ParsingError {}

#[derive(Error, Debug)]
pub enum MakeStaticError {
    #[error("Parsing error: {0}")]
    Parsing(#[from] ParsingError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("invalid pattern {pattern:?}: {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("IO error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("command `{command}` failed with exit status {status}")]
    BuildFailed { command: String, status: i32 },

    #[error("event listener failed: {0}")]
    Listener(anyhow::Error),

    #[error("scheduled watcher was already started")]
    AlreadyStarted,

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MakeStaticError {
    /// Wrap an I/O error together with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        MakeStaticError::Io {
            path: path.into(),
            source,
        }
    }

    /// True for I/O errors of kind `NotFound`.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            MakeStaticError::Io { source, .. } if source.kind() == io::ErrorKind::NotFound
        )
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, MakeStaticError>;
