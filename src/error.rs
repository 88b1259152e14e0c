use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Coarse classification of an [`Error`], used to pick a process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    AccessDenied,
    Io,
    MalformedIndex,
    CorruptStream,
    Seek,
}

impl ErrorKind {
    pub fn exit_code(self) -> u8 {
        match self {
            ErrorKind::NotFound => 2,
            ErrorKind::AccessDenied => 3,
            ErrorKind::Io => 4,
            ErrorKind::MalformedIndex => 5,
            ErrorKind::CorruptStream => 6,
            ErrorKind::Seek => 7,
        }
    }
}

/// Errors produced while building or reading an archive.
#[derive(Error, Debug)]
pub enum Error {
    /// A directory, blob or index file does not exist.
    #[error("{} not found", path.display())]
    PathNotFound { path: PathBuf },

    #[error("permission denied: {}", path.display())]
    AccessDenied { path: PathBuf },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The requested name has no record in the index.
    #[error("{name:?} is not in the index")]
    NameNotFound { name: String },

    #[error("malformed index record at line {line}: {reason}")]
    MalformedIndex { line: usize, reason: String },

    /// The bytes at `offset..offset + length` are not one complete gzip member.
    #[error("corrupt gzip member at offset {offset} (length {length}): {reason}")]
    CorruptStream {
        offset: u64,
        length: u64,
        reason: String,
    },

    #[error("range {offset}+{length} lies outside the {size}-byte blob")]
    Seek { offset: u64, length: u64, size: u64 },

    /// A file name that cannot be written as an index record.
    #[error("cannot index {name:?}: {reason}")]
    UnindexableName { name: String, reason: &'static str },
}

impl Error {
    /// Wrap an I/O failure on `path`, keeping the not-found and
    /// permission cases distinguishable.
    pub fn io(path: impl AsRef<Path>, source: io::Error) -> Self {
        let path = path.as_ref().to_path_buf();
        match source.kind() {
            io::ErrorKind::NotFound => Error::PathNotFound { path },
            io::ErrorKind::PermissionDenied => Error::AccessDenied { path },
            _ => Error::Io { path, source },
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::PathNotFound { .. } | Error::NameNotFound { .. } => ErrorKind::NotFound,
            Error::AccessDenied { .. } => ErrorKind::AccessDenied,
            Error::Io { .. } | Error::UnindexableName { .. } => ErrorKind::Io,
            Error::MalformedIndex { .. } => ErrorKind::MalformedIndex,
            Error::CorruptStream { .. } => ErrorKind::CorruptStream,
            Error::Seek { .. } => ErrorKind::Seek,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
