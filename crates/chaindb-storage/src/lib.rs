//! # chaindb-storage
//!
//! File-backed relational storage for ChainDB.
//!
//! A database is a single file holding a linked list of table headers, a
//! linked list of rows per table, and the encoded values those rows point
//! at. Everything is appended; deleting unlinks and updating repoints.
//!
//! On top of the row store, [`JoinedTable`] composes tables into a single
//! cursor over the tuples of a chain of equi-joins.
//!
//! ```rust
//! use chaindb_common::types::{ColumnType, Value};
//! use chaindb_storage::{Database, TableSchema};
//!
//! let mut db = Database::in_memory()?;
//! let table = db.add_table(TableSchema::new("kv").column("key", ColumnType::Str))?;
//! let row = db.add_row(&table)?;
//! db.set_value(&row, 0, Some(&Value::str("a")))?;
//! assert_eq!(db.get_value(&row, 0)?, Some(Value::str("a")));
//! # Ok::<(), chaindb_common::ChainError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Backing stores and positioned I/O
pub mod file;

/// Value encoding and decoding
pub mod codec;

mod database;
mod join;
mod registry;
mod row;

pub use database::Database;
pub use join::{JoinIter, JoinedRow, JoinedTable, Participant};
pub use registry::{Table, TableSchema};
pub use row::{Row, RowIter};
