//! File open options.

use std::fs;

/// How a database file is opened.
///
/// A database file is always readable. These options only decide whether
/// it may be written and whether a missing file is created.
///
/// # Example
///
/// ```rust
/// use chaindb_storage::file::OpenOptions;
///
/// let options = OpenOptions::for_database();
/// assert!(options.is_writable());
/// assert!(options.creates_missing());
/// assert!(!OpenOptions::for_read().is_writable());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenOptions {
    pub(crate) writable: bool,
    pub(crate) create: bool,
}

impl OpenOptions {
    /// Opens an existing database read-only, for inspection.
    #[must_use]
    pub const fn for_read() -> Self {
        Self {
            writable: false,
            create: false,
        }
    }

    /// Opens an existing database file for reading and writing.
    #[must_use]
    pub const fn for_write() -> Self {
        Self {
            writable: true,
            create: false,
        }
    }

    /// Opens a database file for reading and writing, creating it if missing.
    #[must_use]
    pub const fn for_database() -> Self {
        Self {
            writable: true,
            create: true,
        }
    }

    /// Returns true if the file may be written.
    #[inline]
    #[must_use]
    pub const fn is_writable(&self) -> bool {
        self.writable
    }

    /// Returns true if a missing file is created.
    #[inline]
    #[must_use]
    pub const fn creates_missing(&self) -> bool {
        self.create
    }

    pub(crate) fn to_std_options(self) -> fs::OpenOptions {
        let mut opts = fs::OpenOptions::new();
        opts.read(true).write(self.writable).create(self.create);
        opts
    }
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self::for_database()
    }
}
