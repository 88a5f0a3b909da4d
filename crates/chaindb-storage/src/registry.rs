//! Table registry.
//!
//! Tables form a singly-linked list of headers anchored by the root pointer
//! in the file header. New tables are pushed at the head, so a walk from the
//! root visits tables newest first.
//!
//! # Table header layout
//!
//! ```text
//! next        8 bytes   offset of the next (older) table header, 0 = end
//! first_row   8 bytes   offset of the newest row, 0 = empty
//! name        u16 length + bytes
//! columns     u16 count, then per column: u16 length + name bytes, u8 type
//! ```
//!
//! Removing a table only unlinks its header; the bytes stay in the file.

use std::sync::Arc;

use bytes::{BufMut, BytesMut};
use chaindb_common::constants::{MAX_COLUMNS, TABLE_FIRST_ROW_FIELD, TABLE_NAME_FIELD};
use chaindb_common::error::{ChainError, ChainResult};
use chaindb_common::types::{Column, ColumnType, Offset};
use tracing::{debug, warn};

use crate::codec::{self, RecordReader};
use crate::database::{check_link, Database};
use crate::file::BackingStore;

/// Smallest possible table header: two links, empty name, zero columns.
const MIN_TABLE_HEADER_SIZE: u64 = TABLE_NAME_FIELD + 2 + 2;

/// Definition of a table to create.
///
/// # Example
///
/// ```rust
/// use chaindb_common::types::ColumnType;
/// use chaindb_storage::TableSchema;
///
/// let schema = TableSchema::new("orders")
///     .column("id", ColumnType::Uint)
///     .column("note", ColumnType::Str);
/// assert_eq!(schema.columns.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    /// Table name, unique within the database.
    pub name: String,
    /// Ordered column list; the order defines row slot order.
    pub columns: Vec<Column>,
}

impl TableSchema {
    /// Creates a schema with no columns.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    /// Appends a column.
    #[must_use]
    pub fn column(mut self, name: impl Into<String>, column_type: ColumnType) -> Self {
        self.columns.push(Column::new(name, column_type));
        self
    }

    /// Encodes the full header record with the given `next` link.
    ///
    /// All size limits are checked here, before anything is written.
    fn encode_header(&self, next: Offset) -> ChainResult<BytesMut> {
        let column_count = u16::try_from(self.columns.len()).map_err(|_| {
            ChainError::invalid_argument(format!(
                "table '{}' has {} columns, maximum is {MAX_COLUMNS}",
                self.name,
                self.columns.len()
            ))
        })?;

        let mut buf = BytesMut::with_capacity(64);
        codec::encode_offset(&mut buf, next);
        codec::encode_offset(&mut buf, Offset::NULL);
        codec::encode_string(&mut buf, &self.name)?;
        buf.put_u16_le(column_count);
        for column in &self.columns {
            codec::encode_string(&mut buf, &column.name)?;
            buf.put_u8(column.column_type.as_byte());
        }
        Ok(buf)
    }
}

/// Handle to a table stored in the database.
///
/// Carries the header offset and the decoded name and schema, which never
/// change after creation. The `next` and `first_row` links are not cached:
/// they are read from the file whenever needed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    position: Offset,
    name: String,
    columns: Arc<[Column]>,
}

impl Table {
    /// Returns the offset of this table's header.
    #[must_use]
    pub fn position(&self) -> Offset {
        self.position
    }

    /// Returns the table name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the ordered column list.
    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Returns the column at `index`.
    #[must_use]
    pub fn column(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    /// Returns the number of columns.
    #[must_use]
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Returns the index of the first column called `name`.
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub(crate) fn shared_columns(&self) -> Arc<[Column]> {
        Arc::clone(&self.columns)
    }

    /// Offset of this table's `first_row` field.
    pub(crate) fn first_row_field(&self) -> Offset {
        first_row_field(self.position)
    }
}

/// Offset of the `first_row` field of the header at `table`.
pub(crate) fn first_row_field(table: Offset) -> Offset {
    table.add(TABLE_FIRST_ROW_FIELD)
}

/// The part of a header needed to walk the registry.
struct HeaderPrefix {
    next: Offset,
    name: String,
}

/// Reads `next` and `name` of the header at `position`, leaving the reader
/// positioned at the column count.
fn read_prefix<S: BackingStore>(reader: &mut RecordReader<'_, S>) -> ChainResult<HeaderPrefix> {
    let next = reader.read_offset()?;
    let _first_row = reader.read_offset()?;
    let name = reader.read_string()?;
    Ok(HeaderPrefix { next, name })
}

fn read_columns<S: BackingStore>(reader: &mut RecordReader<'_, S>) -> ChainResult<Vec<Column>> {
    let count = reader.read_u16()?;
    let mut columns = Vec::with_capacity(usize::from(count));
    for _ in 0..count {
        let name = reader.read_string()?;
        let tag = reader.read_u8()?;
        let column_type = ColumnType::from_byte(tag)
            .ok_or_else(|| ChainError::format(format!("unknown column type tag {tag}")))?;
        columns.push(Column::new(name, column_type));
    }
    Ok(columns)
}

/// Walks the registry from `root`, calling `visit` with each header offset and
/// an open reader, until `visit` returns `Some`.
///
/// The number of steps is bounded by the file size so a corrupt, cyclic
/// list fails instead of looping.
fn walk<S, T, F>(store: &mut S, root: Offset, mut visit: F) -> ChainResult<Option<T>>
where
    S: BackingStore,
    F: FnMut(Offset, HeaderPrefix, &mut RecordReader<'_, S>) -> ChainResult<Option<T>>,
{
    let size = store.size();
    let mut remaining = size / MIN_TABLE_HEADER_SIZE + 1;
    let mut pointer = root;

    while !pointer.is_null() {
        if remaining == 0 {
            return Err(ChainError::format("cycle in table registry"));
        }
        remaining -= 1;

        check_link(pointer, size)?;
        let mut reader = RecordReader::new(store, pointer);
        let prefix = read_prefix(&mut reader)?;
        let next = prefix.next;
        if let Some(found) = visit(pointer, prefix, &mut reader)? {
            return Ok(Some(found));
        }
        pointer = next;
    }

    Ok(None)
}

impl<S: BackingStore> Database<S> {
    /// Finds a table by name.
    ///
    /// Walks the registry from the root, decoding each header only far
    /// enough to compare names. Linear in the number of tables.
    pub fn find_table(&self, name: &str) -> ChainResult<Option<Table>> {
        let mut store = self.store();
        walk(&mut *store, self.root(), |position, prefix, reader| {
            if prefix.name != name {
                return Ok(None);
            }
            let columns = read_columns(reader)?;
            Ok(Some(Table {
                position,
                name: prefix.name,
                columns: columns.into(),
            }))
        })
    }

    /// Finds a table by name, failing with [`ChainError::TableNotFound`].
    pub fn table(&self, name: &str) -> ChainResult<Table> {
        self.find_table(name)?
            .ok_or_else(|| ChainError::TableNotFound {
                table: name.to_string(),
            })
    }

    /// Returns every reachable table, newest first.
    pub fn tables(&self) -> ChainResult<Vec<Table>> {
        let mut tables = Vec::new();
        let mut store = self.store();
        walk(&mut *store, self.root(), |position, prefix, reader| {
            let columns = read_columns(reader)?;
            tables.push(Table {
                position,
                name: prefix.name,
                columns: columns.into(),
            });
            Ok(None::<()>)
        })?;
        Ok(tables)
    }

    /// Creates a table and links it at the head of the registry.
    ///
    /// Fails with [`ChainError::DuplicateName`] if a table with the same
    /// name exists. Nothing is written when the schema is rejected.
    pub fn add_table(&mut self, schema: TableSchema) -> ChainResult<Table> {
        if self.find_table(&schema.name)?.is_some() {
            warn!(table = %schema.name, "rejected duplicate table name");
            return Err(ChainError::DuplicateName { table: schema.name });
        }

        let header = schema.encode_header(self.root())?;
        let position = self.store().append(&header)?;
        self.set_root(position)?;
        self.finish_write()?;

        debug!(table = %schema.name, %position, columns = schema.columns.len(), "added table");
        Ok(Table {
            position,
            name: schema.name,
            columns: schema.columns.into(),
        })
    }

    /// Unlinks a table from the registry.
    ///
    /// The header and rows stay in the file but are no longer reachable.
    /// Fails with [`ChainError::TableNotFound`] if the table is not linked.
    pub fn remove_table(&mut self, table: Table) -> ChainResult<()> {
        let target = table.position;
        let next = codec::read_offset(&mut *self.store(), target)?;

        if self.root() == target {
            self.set_root(next)?;
        } else {
            let mut store = self.store();
            let predecessor = walk(&mut *store, self.root(), |position, prefix, _| {
                Ok((prefix.next == target).then_some(position))
            })?;
            let Some(predecessor) = predecessor else {
                return Err(ChainError::TableNotFound { table: table.name });
            };
            codec::write_offset(&mut *store, predecessor, next)?;
        }
        self.finish_write()?;

        debug!(table = %table.name, position = %target, "removed table");
        Ok(())
    }

    /// Reads the current `first_row` link of a table.
    pub(crate) fn read_first_row(store: &mut S, table: &Table) -> ChainResult<Offset> {
        let first_row = codec::read_offset(store, table.first_row_field())?;
        check_link(first_row, store.size())?;
        Ok(first_row)
    }
}
