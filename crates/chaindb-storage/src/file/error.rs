//! I/O error types for the file module.

use std::io;
use std::path::PathBuf;

use chaindb_common::types::Offset;
use chaindb_common::ChainError;
use thiserror::Error;

/// Result type for backing store operations.
pub type IoResult<T> = Result<T, IoError>;

/// Errors that can occur during backing store I/O.
#[derive(Debug, Error)]
#[allow(missing_docs)] // Fields are documented by variant docs
pub enum IoError {
    /// Standard I/O error.
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },

    /// The file could not be opened.
    #[error("cannot open {path}: {source}")]
    Open { path: PathBuf, source: io::Error },

    /// Access beyond the end of the store.
    #[error("invalid offset: {offset} + {len} bytes exceeds store size {file_size}")]
    InvalidOffset {
        offset: Offset,
        len: usize,
        file_size: u64,
    },

    /// The file ended before a read inside the tracked length completed.
    #[error("file truncated: {len} bytes at {offset} are missing")]
    Truncated { offset: Offset, len: usize },

    /// A write was attempted on a store opened read-only.
    #[error("{operation} not allowed on a read-only store")]
    ReadOnly { operation: &'static str },
}

impl IoError {
    /// Wraps an error from opening the file at `path`.
    pub fn open(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Open {
            path: path.into(),
            source,
        }
    }

    /// Creates an InvalidOffset error.
    pub fn invalid_offset(offset: Offset, len: usize, file_size: u64) -> Self {
        Self::InvalidOffset {
            offset,
            len,
            file_size,
        }
    }

    /// Returns true if the file does not exist.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Io { source } | Self::Open { source, .. } => {
                source.kind() == io::ErrorKind::NotFound
            }
            _ => false,
        }
    }
}

impl From<IoError> for ChainError {
    fn from(err: IoError) -> Self {
        match err {
            IoError::Io { source } => ChainError::Io { source },
            IoError::InvalidOffset {
                offset,
                len,
                file_size,
            } => ChainError::InvalidOffset {
                offset,
                len,
                file_size,
            },
            IoError::Open { path, source } => ChainError::Io {
                source: io::Error::new(source.kind(), format!("{}: {source}", path.display())),
            },
            other @ IoError::Truncated { .. } => ChainError::Io {
                source: io::Error::new(io::ErrorKind::UnexpectedEof, other.to_string()),
            },
            other @ IoError::ReadOnly { .. } => ChainError::Io {
                source: io::Error::new(io::ErrorKind::PermissionDenied, other.to_string()),
            },
        }
    }
}
