//! Database error types.
//!
//! Provides the error type reported by every storage operation.

use std::fmt;
use thiserror::Error;

use crate::types::{ColumnType, Offset};

/// Error codes for categorizing errors.
///
/// These codes can be used for programmatic error handling and
/// are stable across versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ErrorCode {
    // General errors (0x0000 - 0x00FF)
    /// Internal error (bug).
    Internal = 0x0001,
    /// Invalid argument provided.
    InvalidArgument = 0x0003,

    // I/O errors (0x0100 - 0x01FF)
    /// General I/O error.
    Io = 0x0100,
    /// Offset outside the valid region of the file.
    InvalidOffset = 0x0101,

    // Format errors (0x0200 - 0x02FF)
    /// File signature or record encoding is invalid.
    Format = 0x0200,
    /// String does not fit behind a 16-bit length prefix.
    StringTooLong = 0x0201,

    // Lookup errors (0x0300 - 0x03FF)
    /// Table not found.
    TableNotFound = 0x0300,
    /// Row not found.
    RowNotFound = 0x0301,
    /// Column not found.
    ColumnNotFound = 0x0302,

    // Schema errors (0x0400 - 0x04FF)
    /// Table name already taken.
    DuplicateName = 0x0400,
    /// Column index beyond the schema.
    ColumnIndexOutOfRange = 0x0401,
    /// Value type differs from the column type.
    TypeMismatch = 0x0402,
}

impl ErrorCode {
    /// Returns the numeric code.
    #[inline]
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    /// Returns the error category name.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match (*self as u16) >> 8 {
            0x00 => "General",
            0x01 => "I/O",
            0x02 => "Format",
            0x03 => "Lookup",
            0x04 => "Schema",
            _ => "Unknown",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// The main error type for ChainDB.
///
/// Every variant is reported to the caller as a value; the engine never
/// panics on bad input or a corrupt file.
///
/// # Example
///
/// ```rust
/// use chaindb_common::error::{ChainError, ChainResult};
///
/// fn lookup(name: &str) -> ChainResult<()> {
///     Err(ChainError::TableNotFound { table: name.to_string() })
/// }
///
/// assert!(lookup("users").unwrap_err().is_not_found());
/// ```
#[derive(Debug, Error)]
pub enum ChainError {
    // ==========================================================================
    // General Errors
    // ==========================================================================
    /// Internal error - this indicates a bug.
    #[error("internal error: {message}")]
    Internal {
        /// Error message.
        message: String,
    },

    /// Invalid argument provided.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// Error message.
        message: String,
    },

    /// Invalid configuration.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Error message.
        message: String,
    },

    // ==========================================================================
    // I/O Errors
    // ==========================================================================
    /// I/O error from the underlying system.
    #[error("I/O error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// A read reached past the end of the file.
    #[error("invalid offset {offset}: reading {len} bytes exceeds file size {file_size}")]
    InvalidOffset {
        /// Offset of the attempted access.
        offset: Offset,
        /// Number of bytes requested.
        len: usize,
        /// File size at the time of the access.
        file_size: u64,
    },

    // ==========================================================================
    // Format Errors
    // ==========================================================================
    /// The file is not a database or a record is malformed.
    #[error("format error: {reason}")]
    Format {
        /// What was wrong.
        reason: String,
    },

    /// String does not fit behind a 16-bit length prefix.
    #[error("string of {len} bytes exceeds maximum {max_len}")]
    StringTooLong {
        /// Actual length in bytes.
        len: usize,
        /// Maximum allowed length.
        max_len: usize,
    },

    // ==========================================================================
    // Lookup Errors
    // ==========================================================================
    /// Table not found.
    #[error("table '{table}' not found")]
    TableNotFound {
        /// The missing table.
        table: String,
    },

    /// Row not linked into its table.
    #[error("row at offset {offset} not found")]
    RowNotFound {
        /// Offset of the row record.
        offset: Offset,
    },

    /// Column not found.
    #[error("column '{column}' not found in table '{table}'")]
    ColumnNotFound {
        /// The missing column.
        column: String,
        /// The table name.
        table: String,
    },

    // ==========================================================================
    // Schema Errors
    // ==========================================================================
    /// A table with this name already exists.
    #[error("table '{table}' already exists")]
    DuplicateName {
        /// The conflicting name.
        table: String,
    },

    /// Column index beyond the schema.
    #[error("column index {index} out of range for {count} columns")]
    ColumnIndexOutOfRange {
        /// Requested index.
        index: usize,
        /// Number of columns available.
        count: usize,
    },

    /// Value type differs from the column's declared type.
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        /// Declared column type.
        expected: ColumnType,
        /// Type of the rejected value.
        actual: ColumnType,
    },
}

impl ChainError {
    /// Returns the error code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Internal { .. } => ErrorCode::Internal,
            Self::InvalidArgument { .. } | Self::InvalidConfig { .. } => {
                ErrorCode::InvalidArgument
            }
            Self::Io { .. } => ErrorCode::Io,
            Self::InvalidOffset { .. } => ErrorCode::InvalidOffset,
            Self::Format { .. } => ErrorCode::Format,
            Self::StringTooLong { .. } => ErrorCode::StringTooLong,
            Self::TableNotFound { .. } => ErrorCode::TableNotFound,
            Self::RowNotFound { .. } => ErrorCode::RowNotFound,
            Self::ColumnNotFound { .. } => ErrorCode::ColumnNotFound,
            Self::DuplicateName { .. } => ErrorCode::DuplicateName,
            Self::ColumnIndexOutOfRange { .. } => ErrorCode::ColumnIndexOutOfRange,
            Self::TypeMismatch { .. } => ErrorCode::TypeMismatch,
        }
    }

    /// Returns true if this is a lookup miss (table, row, or column).
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::TableNotFound { .. } | Self::RowNotFound { .. } | Self::ColumnNotFound { .. }
        )
    }

    /// Returns true if the file itself is unreadable or malformed.
    #[must_use]
    pub const fn is_corruption(&self) -> bool {
        matches!(self, Self::Format { .. } | Self::InvalidOffset { .. })
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Creates an invalid argument error.
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates a format error.
    #[must_use]
    pub fn format(reason: impl Into<String>) -> Self {
        Self::Format {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        let err = ChainError::DuplicateName {
            table: "users".into(),
        };
        assert_eq!(err.code(), ErrorCode::DuplicateName);
        assert_eq!(err.code().category(), "Schema");
        assert_eq!(ErrorCode::Format.category(), "Format");
    }

    #[test]
    fn test_error_display() {
        let err = ChainError::TypeMismatch {
            expected: ColumnType::Uint,
            actual: ColumnType::Str,
        };
        assert_eq!(err.to_string(), "type mismatch: expected uint, got str");

        let err = ChainError::ColumnIndexOutOfRange { index: 3, count: 2 };
        assert_eq!(err.to_string(), "column index 3 out of range for 2 columns");
    }

    #[test]
    fn test_not_found() {
        assert!(ChainError::TableNotFound { table: "t".into() }.is_not_found());
        assert!(ChainError::RowNotFound {
            offset: Offset::new(40)
        }
        .is_not_found());
        assert!(!ChainError::format("bad").is_not_found());
    }

    #[test]
    fn test_corruption() {
        assert!(ChainError::format("bad signature").is_corruption());
        let err = ChainError::InvalidOffset {
            offset: Offset::new(100),
            len: 8,
            file_size: 50,
        };
        assert!(err.is_corruption());
        assert_eq!(err.code(), ErrorCode::InvalidOffset);
    }

    #[test]
    fn test_io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: ChainError = io_err.into();
        assert_eq!(err.code(), ErrorCode::Io);
    }
}
