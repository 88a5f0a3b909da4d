//! Database handle: file header, root pointer, and store ownership.
//!
//! A database file starts with a fixed 12-byte header:
//!
//! ```text
//! offset 0   4 bytes   magic signature DE AD BA BE
//! offset 4   8 bytes   root pointer (newest table header, 0 = no tables)
//! ```
//!
//! Everything after the header is appended records linked by offsets. The
//! header occupying the first bytes guarantees that no record lives at
//! offset 0, which is reserved as the null link.

use bytes::BytesMut;
use chaindb_common::config::DatabaseConfig;
use chaindb_common::constants::{FILE_HEADER_SIZE, MAGIC, ROOT_POINTER_OFFSET};
use chaindb_common::error::{ChainError, ChainResult};
use chaindb_common::types::Offset;
use parking_lot::{Mutex, MutexGuard};
use tracing::{debug, info};

use crate::codec::{self, RecordReader};
use crate::file::{BackingStore, MemoryFile, OpenOptions, StandardFile};

/// An open database.
///
/// Owns the backing store and the cached root pointer. Read operations take
/// `&self`; anything that writes to the file takes `&mut self`, so the
/// borrow checker enforces the single-writer model.
pub struct Database<S: BackingStore = StandardFile> {
    /// The backing store. Locked for the duration of each seek/read pair.
    store: Mutex<S>,
    /// Offset of the newest table header, or null.
    root: Offset,
    /// Whether to sync the store after every mutation.
    sync_on_write: bool,
}

impl<S: BackingStore> Database<S> {
    /// Initializes an empty database in `store`.
    ///
    /// Any previous contents are discarded.
    pub fn init(mut store: S) -> ChainResult<Self> {
        let mut header = BytesMut::with_capacity(FILE_HEADER_SIZE as usize);
        header.extend_from_slice(&MAGIC);
        codec::encode_offset(&mut header, Offset::NULL);

        store.set_len(0)?;
        store.append(&header)?;
        debug!("initialized empty database");

        Ok(Self {
            store: Mutex::new(store),
            root: Offset::NULL,
            sync_on_write: false,
        })
    }

    /// Opens an existing database in `store`.
    ///
    /// Fails with [`ChainError::Format`] when the signature is missing or
    /// the root pointer does not point into the file.
    pub fn open(mut store: S) -> ChainResult<Self> {
        let size = store.size();
        if size < FILE_HEADER_SIZE {
            return Err(ChainError::format(format!(
                "file of {size} bytes is too short for a database header"
            )));
        }

        let mut signature = [0u8; MAGIC.len()];
        store.read_exact_at(&mut signature, Offset::NULL)?;
        if signature != MAGIC {
            return Err(ChainError::format(format!(
                "bad signature {signature:02x?}"
            )));
        }

        let root = RecordReader::new(&mut store, Offset::new(ROOT_POINTER_OFFSET)).read_offset()?;
        check_link(root, size)?;
        debug!(%root, size, "opened database");

        Ok(Self {
            store: Mutex::new(store),
            root,
            sync_on_write: false,
        })
    }

    /// Returns the offset of the newest table header (null when empty).
    #[must_use]
    pub fn root(&self) -> Offset {
        self.root
    }

    /// Returns the current size of the backing store in bytes.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.store.lock().size()
    }

    /// Flushes the backing store to durable storage.
    pub fn sync(&self) -> ChainResult<()> {
        self.store.lock().sync()?;
        Ok(())
    }

    /// Consumes the database and returns the backing store.
    pub fn into_inner(self) -> S {
        self.store.into_inner()
    }

    /// Locks the backing store.
    pub(crate) fn store(&self) -> MutexGuard<'_, S> {
        self.store.lock()
    }

    /// Rewrites the root pointer in place.
    pub(crate) fn set_root(&mut self, root: Offset) -> ChainResult<()> {
        codec::write_offset(self.store.get_mut(), Offset::new(ROOT_POINTER_OFFSET), root)?;
        self.root = root;
        Ok(())
    }

    /// Ends a mutating operation.
    pub(crate) fn finish_write(&mut self) -> ChainResult<()> {
        if self.sync_on_write {
            self.store.get_mut().sync()?;
        }
        Ok(())
    }
}

impl Database<StandardFile> {
    /// Opens the database file described by `config`.
    ///
    /// A missing or empty file is initialized only when `create_if_missing`
    /// is set; otherwise an empty file fails to open with
    /// [`ChainError::Format`]. `truncate_existing` always starts from an
    /// empty database.
    pub fn open_with_config(config: &DatabaseConfig) -> ChainResult<Self> {
        config.validate()?;

        let options = if config.create_if_missing {
            OpenOptions::for_database()
        } else {
            OpenOptions::for_write()
        };
        let file = StandardFile::open(&config.path, &options)?;

        let fresh = config.create_if_missing && file.size() == 0;
        let mut db = if config.truncate_existing || fresh {
            info!(path = %config.path.display(), "creating database");
            Self::init(file)?
        } else {
            Self::open(file)?
        };
        db.sync_on_write = config.sync_on_write;
        db.finish_write()?;
        Ok(db)
    }
}

impl Database<MemoryFile> {
    /// Creates an empty database held entirely in memory.
    pub fn in_memory() -> ChainResult<Self> {
        Self::init(MemoryFile::new())
    }
}

impl<S: BackingStore> std::fmt::Debug for Database<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("root", &self.root)
            .field("sync_on_write", &self.sync_on_write)
            .finish_non_exhaustive()
    }
}

/// Checks that a link read from the file can point at a record.
///
/// A non-null link must lie past the file header and before the end of the
/// store; anything else means the file is corrupt.
pub(crate) fn check_link(link: Offset, size: u64) -> ChainResult<()> {
    if link.is_null() || (link.as_u64() >= FILE_HEADER_SIZE && link.as_u64() < size) {
        Ok(())
    } else {
        Err(ChainError::format(format!(
            "link {link} points outside the record area (file size {size})"
        )))
    }
}
