//! Backing store trait.

use chaindb_common::types::Offset;

use super::error::{IoError, IoResult};

/// Trait for the byte-addressable store a database lives in.
///
/// All higher layers address the store purely by offset: they read and
/// overwrite fixed positions and append new records at the end. No
/// operation ever reads past the current end, so a corrupt link surfaces
/// as [`IoError::InvalidOffset`] instead of garbage.
pub trait BackingStore {
    /// Returns the current store size in bytes.
    fn size(&self) -> u64;

    /// Reads exactly `buf.len()` bytes starting at `offset`.
    fn read_exact_at(&mut self, buf: &mut [u8], offset: Offset) -> IoResult<()>;

    /// Overwrites `buf.len()` bytes starting at `offset`.
    ///
    /// The whole range must already exist; in-place writes never grow the store.
    fn write_all_at(&mut self, buf: &[u8], offset: Offset) -> IoResult<()>;

    /// Writes `buf` at the end of the store and returns the offset it landed at.
    fn append(&mut self, buf: &[u8]) -> IoResult<Offset>;

    /// Truncates or extends the store to `size` bytes.
    fn set_len(&mut self, size: u64) -> IoResult<()>;

    /// Flushes all written data to durable storage.
    fn sync(&mut self) -> IoResult<()>;

    /// Checks that `len` bytes starting at `offset` lie inside the store.
    fn check_range(&self, offset: Offset, len: usize) -> IoResult<()> {
        let file_size = self.size();
        let end = offset.as_u64().checked_add(len as u64);
        match end {
            Some(end) if end <= file_size => Ok(()),
            _ => Err(IoError::invalid_offset(offset, len, file_size)),
        }
    }
}
