//! Backing store layer for ChainDB.
//!
//! This module provides the byte-addressable store every database lives in.
//! Stores are addressed purely by offset:
//!
//! - **read_exact_at / write_all_at**: positioned access inside the store
//! - **append**: write at the end and learn where the bytes landed
//! - **set_len / sync**: truncation and durability
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │          BackingStore Trait             │
//! │  (read, write, append, sync, set_len)   │
//! └─────────────────────────────────────────┘
//!              │                   │
//!              ▼                   ▼
//! ┌─────────────────────┐  ┌─────────────────────┐
//! │   StandardFile      │  │   MemoryFile        │
//! │   (std::fs::File)   │  │   (Vec<u8>)         │
//! └─────────────────────┘  └─────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use chaindb_storage::file::{BackingStore, OpenOptions, StandardFile};
//!
//! fn example() -> Result<(), chaindb_storage::file::IoError> {
//!     let mut file = StandardFile::open("data.chaindb", &OpenOptions::for_database())?;
//!
//!     let offset = file.append(&[0u8; 16])?;
//!     file.write_all_at(&[1, 2, 3, 4], offset)?;
//!     file.sync()?;
//!
//!     Ok(())
//! }
//! ```

mod error;
mod handle;
mod memory;
mod options;
mod std_io;

pub use error::{IoError, IoResult};
pub use handle::BackingStore;
pub use memory::MemoryFile;
pub use options::OpenOptions;
pub use std_io::StandardFile;
