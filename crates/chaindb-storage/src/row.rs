//! Row store.
//!
//! Each table anchors a singly-linked list of rows in its header's
//! `first_row` field. New rows are pushed at the head, so iteration visits
//! rows newest first.
//!
//! # Row layout
//!
//! ```text
//! next     8 bytes              offset of the previous row, 0 = end
//! slots    column_count x 8     offset of each column's value, 0 = absent
//! ```
//!
//! Updating a value appends a new encoding and repoints the slot. Removing a
//! row unlinks it without touching its bytes, so a cursor standing on a
//! removed row can still advance to its former successor.

use std::iter::FusedIterator;
use std::sync::Arc;

use bytes::{BufMut, BytesMut};
use chaindb_common::constants::{MAX_STRING_LEN, POINTER_SIZE};
use chaindb_common::error::{ChainError, ChainResult};
use chaindb_common::types::{Column, Offset, Value};
use tracing::{debug, trace, warn};

use crate::codec;
use crate::database::{check_link, Database};
use crate::file::BackingStore;
use crate::registry::{self, Table};

/// Smallest possible row: a `next` link and no slots.
const MIN_ROW_SIZE: u64 = POINTER_SIZE;

/// Cursor on one row of a table.
///
/// A row is exclusively owned by its caller. Advancing with
/// [`Database::next_row`] consumes it; reaching the end of the list drops it.
#[derive(Debug, PartialEq, Eq)]
pub struct Row {
    table: Offset,
    columns: Arc<[Column]>,
    position: Offset,
}

impl Row {
    fn at(table: Offset, columns: Arc<[Column]>, position: Offset) -> Option<Self> {
        position.non_null().map(|position| Self {
            table,
            columns,
            position,
        })
    }

    /// Returns the offset of this row record.
    #[must_use]
    pub fn position(&self) -> Offset {
        self.position
    }

    /// Returns the header offset of the table this row belongs to.
    #[must_use]
    pub fn table_position(&self) -> Offset {
        self.table
    }

    /// Returns the table's column list.
    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Returns the number of value slots.
    #[must_use]
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Returns the column at `index`, or [`ChainError::ColumnIndexOutOfRange`].
    pub fn column(&self, index: usize) -> ChainResult<&Column> {
        self.columns
            .get(index)
            .ok_or(ChainError::ColumnIndexOutOfRange {
                index,
                count: self.columns.len(),
            })
    }

    fn first_row_field(&self) -> Offset {
        registry::first_row_field(self.table)
    }

    fn slot_field(&self, index: usize) -> Offset {
        self.position.add(POINTER_SIZE * (index as u64 + 1))
    }
}

/// Iterator over the rows of a table, newest first.
///
/// Created by [`Database::rows`]. Stops after the first error.
pub struct RowIter<'a, S: BackingStore> {
    db: &'a Database<S>,
    table: Table,
    cursor: Cursor,
    remaining: u64,
}

#[derive(Debug, Clone, Copy)]
enum Cursor {
    Start,
    At(Offset),
    Done,
}

impl<S: BackingStore> RowIter<'_, S> {
    fn step(&mut self) -> ChainResult<Option<Row>> {
        let mut store = self.db.store();
        let position = match self.cursor {
            Cursor::Start => Database::<S>::read_first_row(&mut store, &self.table)?,
            Cursor::At(position) => position,
            Cursor::Done => return Ok(None),
        };
        if position.is_null() {
            return Ok(None);
        }

        if self.remaining == 0 {
            return Err(ChainError::format(format!(
                "cycle in row list of table '{}'",
                self.table.name()
            )));
        }
        self.remaining -= 1;

        let next = codec::read_offset(&mut *store, position)?;
        check_link(next, store.size())?;
        self.cursor = Cursor::At(next);

        Ok(Row::at(
            self.table.position(),
            self.table.shared_columns(),
            position,
        ))
    }
}

impl<S: BackingStore> Iterator for RowIter<'_, S> {
    type Item = ChainResult<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.step() {
            Ok(Some(row)) => Some(Ok(row)),
            Ok(None) => {
                self.cursor = Cursor::Done;
                None
            }
            Err(e) => {
                self.cursor = Cursor::Done;
                Some(Err(e))
            }
        }
    }
}

impl<S: BackingStore> FusedIterator for RowIter<'_, S> {}

impl<S: BackingStore> Database<S> {
    /// Appends an empty row and links it at the head of the table's list.
    ///
    /// Every slot starts out absent.
    pub fn add_row(&mut self, table: &Table) -> ChainResult<Row> {
        let slots = table.column_count();
        let position = {
            let mut store = self.store();
            let first_row = Self::read_first_row(&mut store, table)?;

            let mut record = BytesMut::with_capacity((slots + 1) * POINTER_SIZE as usize);
            codec::encode_offset(&mut record, first_row);
            record.put_bytes(0, slots * POINTER_SIZE as usize);

            let position = store.append(&record)?;
            codec::write_offset(&mut *store, table.first_row_field(), position)?;
            position
        };
        self.finish_write()?;

        debug!(table = %table.name(), %position, "added row");
        Ok(Row {
            table: table.position(),
            columns: table.shared_columns(),
            position,
        })
    }

    /// Returns a cursor on the newest row of `table`, or `None` when empty.
    pub fn first_row(&self, table: &Table) -> ChainResult<Option<Row>> {
        let first_row = Self::read_first_row(&mut self.store(), table)?;
        Ok(Row::at(table.position(), table.shared_columns(), first_row))
    }

    /// Advances a cursor to the next (older) row.
    ///
    /// Returns `None` once the list is exhausted; the cursor is consumed
    /// either way.
    pub fn next_row(&self, row: Row) -> ChainResult<Option<Row>> {
        let mut store = self.store();
        let next = codec::read_offset(&mut *store, row.position)?;
        check_link(next, store.size())?;
        Ok(Row::at(row.table, row.columns, next))
    }

    /// Returns an iterator over every row of `table`, newest first.
    ///
    /// The walk is bounded by the file size, so a cyclic list ends in a
    /// [`ChainError::Format`] instead of looping.
    pub fn rows(&self, table: &Table) -> RowIter<'_, S> {
        RowIter {
            db: self,
            table: table.clone(),
            cursor: Cursor::Start,
            remaining: self.size() / MIN_ROW_SIZE + 1,
        }
    }

    /// Unlinks a row from its table's list.
    ///
    /// The row's bytes stay in the file. Fails with
    /// [`ChainError::RowNotFound`] if the row is not linked.
    pub fn remove_row(&mut self, row: &Row) -> ChainResult<()> {
        {
            let mut store = self.store();
            let anchor = row.first_row_field();
            let first_row = codec::read_offset(&mut *store, anchor)?;
            let next = codec::read_offset(&mut *store, row.position)?;

            if first_row == row.position {
                codec::write_offset(&mut *store, anchor, next)?;
            } else {
                let size = store.size();
                let mut remaining = size / MIN_ROW_SIZE + 1;
                let mut pointer = first_row;
                loop {
                    if pointer.is_null() {
                        warn!(row = %row.position, "row is not linked into its table");
                        return Err(ChainError::RowNotFound {
                            offset: row.position,
                        });
                    }
                    if remaining == 0 {
                        return Err(ChainError::format("cycle in row list"));
                    }
                    remaining -= 1;

                    check_link(pointer, size)?;
                    let link = codec::read_offset(&mut *store, pointer)?;
                    if link == row.position {
                        codec::write_offset(&mut *store, pointer, next)?;
                        break;
                    }
                    pointer = link;
                }
            }
        }
        self.finish_write()?;

        debug!(row = %row.position, "removed row");
        Ok(())
    }

    /// Reads the value in column `index` of `row`.
    ///
    /// Returns `None` for an absent value, which is distinct from any
    /// zero-valued scalar.
    pub fn get_value(&self, row: &Row, index: usize) -> ChainResult<Option<Value>> {
        let column_type = row.column(index)?.column_type;

        let mut store = self.store();
        let slot = codec::read_offset(&mut *store, row.slot_field(index))?;
        if slot.is_null() {
            return Ok(None);
        }
        check_link(slot, store.size())?;
        Ok(Some(codec::decode_value(&mut *store, slot, column_type)?))
    }

    /// Writes `value` into column `index` of `row`, or clears it with `None`.
    ///
    /// The value's type must equal the column's declared type. On any error
    /// the slot keeps its previous contents.
    pub fn set_value(
        &mut self,
        row: &Row,
        index: usize,
        value: Option<&Value>,
    ) -> ChainResult<()> {
        let column = row.column(index)?;
        if let Some(value) = value {
            check_type(column, value)?;
        }

        {
            let mut store = self.store();
            let slot = match value {
                Some(value) => codec::encode_value_at_end(&mut *store, value)?,
                None => Offset::NULL,
            };
            codec::write_offset(&mut *store, row.slot_field(index), slot)?;
            trace!(row = %row.position, column = %column.name, %slot, "wrote value");
        }
        self.finish_write()
    }

    /// Reads every column of `row` in schema order.
    pub fn row_values(&self, row: &Row) -> ChainResult<Vec<Option<Value>>> {
        (0..row.column_count())
            .map(|index| self.get_value(row, index))
            .collect()
    }

    /// Appends a row and fills it with `values`, one per column.
    ///
    /// All values are checked against the schema before the row is added,
    /// so a rejected insert leaves the table unchanged.
    pub fn insert_row(&mut self, table: &Table, values: &[Option<Value>]) -> ChainResult<Row> {
        if values.len() != table.column_count() {
            return Err(ChainError::invalid_argument(format!(
                "table '{}' has {} columns, got {} values",
                table.name(),
                table.column_count(),
                values.len()
            )));
        }
        for (column, value) in table.columns().iter().zip(values) {
            if let Some(value) = value {
                check_type(column, value)?;
                if let Value::Str(s) = value {
                    if s.len() > MAX_STRING_LEN {
                        return Err(ChainError::StringTooLong {
                            len: s.len(),
                            max_len: MAX_STRING_LEN,
                        });
                    }
                }
            }
        }

        let row = self.add_row(table)?;
        for (index, value) in values.iter().enumerate() {
            if value.is_some() {
                self.set_value(&row, index, value.as_ref())?;
            }
        }
        Ok(row)
    }
}

fn check_type(column: &Column, value: &Value) -> ChainResult<()> {
    let actual = value.column_type();
    if actual == column.column_type {
        Ok(())
    } else {
        warn!(
            column = %column.name,
            expected = %column.column_type,
            %actual,
            "rejected value of wrong type"
        );
        Err(ChainError::TypeMismatch {
            expected: column.column_type,
            actual,
        })
    }
}
