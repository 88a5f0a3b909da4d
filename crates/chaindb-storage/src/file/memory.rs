//! In-memory backing store.

use chaindb_common::types::Offset;

use super::error::IoResult;
use super::handle::BackingStore;

/// Backing store over a growable byte buffer.
///
/// Used for ephemeral databases and tests. Reads and writes follow the same
/// bounds rules as [`StandardFile`](super::StandardFile).
#[derive(Debug, Clone, Default)]
pub struct MemoryFile {
    bytes: Vec<u8>,
}

impl MemoryFile {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps existing bytes, e.g. a database image loaded elsewhere.
    #[must_use]
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Returns the raw contents.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consumes the store and returns its contents.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    #[allow(clippy::cast_possible_truncation)]
    fn range(offset: Offset, len: usize) -> std::ops::Range<usize> {
        let start = offset.as_u64() as usize;
        start..start + len
    }
}

impl BackingStore for MemoryFile {
    fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    fn read_exact_at(&mut self, buf: &mut [u8], offset: Offset) -> IoResult<()> {
        self.check_range(offset, buf.len())?;
        buf.copy_from_slice(&self.bytes[Self::range(offset, buf.len())]);
        Ok(())
    }

    fn write_all_at(&mut self, buf: &[u8], offset: Offset) -> IoResult<()> {
        self.check_range(offset, buf.len())?;
        self.bytes[Self::range(offset, buf.len())].copy_from_slice(buf);
        Ok(())
    }

    fn append(&mut self, buf: &[u8]) -> IoResult<Offset> {
        let offset = Offset::new(self.size());
        self.bytes.extend_from_slice(buf);
        Ok(offset)
    }

    #[allow(clippy::cast_possible_truncation)]
    fn set_len(&mut self, size: u64) -> IoResult<()> {
        self.bytes.resize(size as usize, 0);
        Ok(())
    }

    fn sync(&mut self) -> IoResult<()> {
        Ok(())
    }
}
