use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Which kind of identity a lookup was keyed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityKind {
    Pid,
    Uid,
    App,
}

impl fmt::Display for IdentityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentityKind::Pid => f.write_str("PID"),
            IdentityKind::Uid => f.write_str("UID"),
            IdentityKind::App => f.write_str("App package name"),
        }
    }
}

/// All errors produced by the AppScope analyzer.
#[derive(Error, Debug)]
pub enum ScopeError {
    /// The source directory has no `packages.xml`.
    #[error("No packages.xml file found in {0}. Change the source directory (--source-dir)")]
    MissingManifest(PathBuf),

    /// `packages.xml` exists but is not well-formed XML.
    #[error("Failed to parse manifest {path}: {message}")]
    ManifestParse { path: PathBuf, message: String },

    /// A PID, UID or package name is absent from the logs or the manifest.
    #[error("{kind}: {value} not found in AppScope log files under {source_dir}. Check the source directory (--source-dir)")]
    NotFound {
        kind: IdentityKind,
        value: String,
        source_dir: PathBuf,
    },

    /// A single log line did not have the expected shape. Carries no file
    /// context; see [`ScopeError::Parse`].
    #[error("{0}")]
    Record(String),

    /// A log line did not have the expected shape.
    #[error("Malformed line {line} in {path}: {message}")]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    /// Raw and power files could not be matched one to one.
    #[error("Cannot pair {path}: {reason}")]
    FilePairing { path: PathBuf, reason: String },

    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ScopeError {
    /// Attach file and line context to a [`ScopeError::Record`] error.
    /// Other variants are returned unchanged.
    pub fn at(self, path: impl Into<PathBuf>, line: usize) -> Self {
        match self {
            ScopeError::Record(message) => ScopeError::Parse {
                path: path.into(),
                line,
                message,
            },
            other => other,
        }
    }
}

/// Convenience alias used throughout the analyzer crates.
pub type Result<T> = std::result::Result<T, ScopeError>;
