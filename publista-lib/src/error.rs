use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Where an entry (or a problem) was found: the source name and a 1-based line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    pub origin: String,
    pub line: usize,
}

impl Position {
    pub fn new(origin: impl Into<String>, line: usize) -> Self {
        Position { origin: origin.into(), line }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.origin, self.line)
    }
}

/// Every failure is fatal to the run; nothing is written when one occurs.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{at}: malformed entry{}: {reason}", key.as_ref().map(|k| format!(" '{k}'")).unwrap_or_default())]
    MalformedEntry {
        at: Position,
        key: Option<String>,
        reason: String,
    },

    #[error("{at}: duplicate key '{key}' (first defined at {first})")]
    DuplicateKey {
        key: String,
        at: Position,
        first: Position,
    },

    #[error("entry '{key}' is missing required field '{field}'")]
    MissingField { key: String, field: String },

    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Key of the offending entry, when the error is about one.
    pub fn key(&self) -> Option<&str> {
        match self {
            Error::MalformedEntry { key, .. } => key.as_deref(),
            Error::DuplicateKey { key, .. } | Error::MissingField { key, .. } => Some(key),
            Error::InvalidConfig { .. } | Error::Io { .. } => None,
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io { path: path.into(), source }
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::InvalidConfig { message: e.to_string() }
    }
}
