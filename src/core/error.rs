//! Purpose: Error model shared by file handles and the pool registry.
//! Exports: `Error`, `ErrorKind`, `map_io_error`.
//! Role: One structured error type with builder-style context.
//! Invariants: I/O failures always map to `ErrorKind::FileAccess` and keep their source.
//! Invariants: Decode/default kinds are only produced on strict or non-recovering paths.
use std::error::Error as StdError;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use libc::{EACCES, EPERM, EROFS};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    /// The file (or its directory) could not be read or written.
    FileAccess,
    /// File content is not valid JSON.
    Deserialization,
    /// The configured default cannot be turned into JSON.
    DefaultNotSerializable,
}

#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    message: Option<String>,
    path: Option<PathBuf>,
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            path: None,
            source: None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.kind)?;
        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        }
        if let Some(path) = &self.path {
            write!(f, " (path: {})", path.display())?;
        }
        if let Some(source) = &self.source {
            write!(f, ": {source}")?;
        }
        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|source| source.as_ref() as &(dyn StdError + 'static))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Wraps an I/O failure as `FileAccess`, naming the operation that failed.
pub fn map_io_error(err: io::Error, action: &str, path: &Path) -> Error {
    let message = if is_permission_error(&err) {
        format!("{action}: permission denied")
    } else {
        action.to_string()
    };
    Error::new(ErrorKind::FileAccess)
        .with_message(message)
        .with_path(path)
        .with_source(err)
}

fn is_permission_error(err: &io::Error) -> bool {
    let errno = err.raw_os_error().unwrap_or_default();
    if errno == EACCES || errno == EPERM || errno == EROFS {
        return true;
    }
    err.kind() == io::ErrorKind::PermissionDenied
}
