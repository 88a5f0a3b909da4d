//! Standard file implementation of the backing store.
//!
//! This is the default implementation used for on-disk databases. It wraps
//! a `std::fs::File` and performs blocking positioned I/O through seeks.

use std::fs::File as StdFile;
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use chaindb_common::types::Offset;

use super::error::{IoError, IoResult};
use super::handle::BackingStore;
use super::options::OpenOptions;

/// Backing store over a regular file.
///
/// The file length is tracked in memory: the engine is the only writer,
/// so every growth goes through [`BackingStore::append`] or
/// [`BackingStore::set_len`].
pub struct StandardFile {
    /// The underlying file.
    file: StdFile,
    /// The file path.
    path: PathBuf,
    /// Current length of the file in bytes.
    len: u64,
    /// Whether the file was opened with write access.
    writable: bool,
}

impl StandardFile {
    /// Opens a file with the specified options.
    pub fn open(path: impl AsRef<Path>, options: &OpenOptions) -> IoResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = options
            .to_std_options()
            .open(&path)
            .map_err(|e| IoError::open(&path, e))?;
        let len = file.metadata()?.len();

        Ok(Self {
            file,
            path,
            len,
            writable: options.writable,
        })
    }

    /// Opens or creates a read-write database file.
    pub fn open_rw(path: impl AsRef<Path>) -> IoResult<Self> {
        Self::open(path, &OpenOptions::for_database())
    }

    /// Returns the file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ensure_writable(&self, operation: &'static str) -> IoResult<()> {
        if self.writable {
            Ok(())
        } else {
            Err(IoError::ReadOnly { operation })
        }
    }
}

impl BackingStore for StandardFile {
    fn size(&self) -> u64 {
        self.len
    }

    fn read_exact_at(&mut self, buf: &mut [u8], offset: Offset) -> IoResult<()> {
        let len = buf.len();
        self.check_range(offset, len)?;
        self.file.seek(SeekFrom::Start(offset.as_u64()))?;
        self.file.read_exact(buf).map_err(|e| {
            if e.kind() == ErrorKind::UnexpectedEof {
                IoError::Truncated { offset, len }
            } else {
                IoError::Io { source: e }
            }
        })
    }

    fn write_all_at(&mut self, buf: &[u8], offset: Offset) -> IoResult<()> {
        self.ensure_writable("write")?;
        self.check_range(offset, buf.len())?;
        self.file.seek(SeekFrom::Start(offset.as_u64()))?;
        self.file.write_all(buf)?;
        Ok(())
    }

    fn append(&mut self, buf: &[u8]) -> IoResult<Offset> {
        self.ensure_writable("append")?;
        let offset = Offset::new(self.len);
        self.file.seek(SeekFrom::Start(self.len))?;
        self.file.write_all(buf)?;
        self.len += buf.len() as u64;
        Ok(offset)
    }

    fn set_len(&mut self, size: u64) -> IoResult<()> {
        self.ensure_writable("set_len")?;
        self.file.set_len(size)?;
        self.len = size;
        Ok(())
    }

    fn sync(&mut self) -> IoResult<()> {
        self.file.sync_all()?;
        Ok(())
    }
}

impl std::fmt::Debug for StandardFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StandardFile")
            .field("path", &self.path)
            .field("len", &self.len)
            .field("writable", &self.writable)
            .finish()
    }
}
