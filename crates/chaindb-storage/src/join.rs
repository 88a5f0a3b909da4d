//! Multi-table equi-join engine.
//!
//! A [`JoinedTable`] is an ordered chain of participants. The first
//! participant contributes rows unconditionally; every later participant
//! `P[i]` is joined by the predicate
//!
//! ```text
//! P[i].table[table_column] == joined[joined_column]
//! ```
//!
//! where `joined_column` is a global index into the columns of the
//! participants before `i`. The global column space is the concatenation of
//! every participant's columns, in order.
//!
//! # Algorithm
//!
//! The cursor keeps one row per participant and treats them as the digits of
//! an odometer, with the rightmost participant least significant. Advancing
//! steps the rightmost cursor; a cursor that runs off the end of its table is
//! reset to the table's first row and carries into its left neighbour.
//! Exhausting the leftmost cursor ends the join.
//!
//! After every move, *resync* scans the predicates left to right. On the
//! first failing predicate `i` it steps cursor `i`, resets everything to its
//! right, propagates carries, and rescans from the start. A mismatch therefore
//! never explores the inner combinations below it.
//!
//! The result is the same set of tuples as nested-loop evaluation of a
//! left-deep chain of inner joins, in odometer order.

use std::iter::FusedIterator;

use chaindb_common::error::{ChainError, ChainResult};
use chaindb_common::types::{Column, Value};
use tracing::trace;

use crate::database::Database;
use crate::file::BackingStore;
use crate::registry::Table;
use crate::row::Row;

/// One table in a join chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    table: Table,
    table_column: usize,
    joined_column: usize,
}

impl Participant {
    /// Returns the participant's table.
    #[must_use]
    pub fn table(&self) -> &Table {
        &self.table
    }

    /// Returns the local index of the predicate column in this table.
    #[must_use]
    pub fn table_column(&self) -> usize {
        self.table_column
    }

    /// Returns the global index of the predicate column in the joined
    /// columns before this participant.
    #[must_use]
    pub fn joined_column(&self) -> usize {
        self.joined_column
    }
}

/// An ordered chain of tables joined by equality predicates.
///
/// # Example
///
/// ```rust
/// use chaindb_common::types::{ColumnType, Value};
/// use chaindb_storage::{Database, JoinedTable, TableSchema};
///
/// let mut db = Database::in_memory()?;
/// let users = db.add_table(TableSchema::new("users").column("id", ColumnType::Uint))?;
/// let posts = db.add_table(
///     TableSchema::new("posts")
///         .column("user_id", ColumnType::Uint)
///         .column("title", ColumnType::Str),
/// )?;
///
/// db.insert_row(&users, &[Some(Value::Uint(1))])?;
/// db.insert_row(&posts, &[Some(Value::Uint(1)), Some(Value::str("hello"))])?;
///
/// let joined = JoinedTable::wrap(users).join_on(posts, "user_id", "id")?;
/// let tuples: Vec<_> = joined.tuples(&db).collect::<Result<_, _>>()?;
/// assert_eq!(
///     tuples,
///     vec![vec![Some(Value::Uint(1)), Some(Value::Uint(1)), Some(Value::str("hello"))]]
/// );
/// # Ok::<(), chaindb_common::ChainError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinedTable {
    participants: Vec<Participant>,
}

impl JoinedTable {
    /// Wraps a single table; its rows are the joined rows.
    #[must_use]
    pub fn wrap(table: Table) -> Self {
        Self {
            participants: vec![Participant {
                table,
                table_column: 0,
                joined_column: 0,
            }],
        }
    }

    /// Appends `table`, joined on `table[table_column] == self[joined_column]`.
    ///
    /// Fails with [`ChainError::ColumnIndexOutOfRange`] if `table_column` is
    /// not a column of `table` or `joined_column` is not a column of the
    /// chain so far.
    pub fn join(
        mut self,
        table: Table,
        table_column: usize,
        joined_column: usize,
    ) -> ChainResult<Self> {
        if table_column >= table.column_count() {
            return Err(ChainError::ColumnIndexOutOfRange {
                index: table_column,
                count: table.column_count(),
            });
        }
        let count = self.columns_amount();
        if joined_column >= count {
            return Err(ChainError::ColumnIndexOutOfRange {
                index: joined_column,
                count,
            });
        }

        self.participants.push(Participant {
            table,
            table_column,
            joined_column,
        });
        Ok(self)
    }

    /// Appends `table`, resolving both predicate columns by name.
    ///
    /// `joined_column` may be qualified as `table.column` to pick among
    /// equally named columns; an unqualified name matches the first column
    /// with that name.
    pub fn join_on(
        self,
        table: Table,
        table_column: &str,
        joined_column: &str,
    ) -> ChainResult<Self> {
        let local = table
            .column_index(table_column)
            .ok_or_else(|| ChainError::ColumnNotFound {
                column: table_column.to_string(),
                table: table.name().to_string(),
            })?;
        let global = self
            .column_index(joined_column)
            .ok_or_else(|| ChainError::ColumnNotFound {
                column: joined_column.to_string(),
                table: self.table_names(),
            })?;
        self.join(table, local, global)
    }

    /// Finds the global index of a column by name.
    ///
    /// `table.column` restricts the search to that table; a bare name
    /// matches the first column with that name in join order.
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        let (table, column) = match name.split_once('.') {
            Some((table, column)) => (Some(table), column),
            None => (None, name),
        };

        let mut base = 0;
        for participant in &self.participants {
            let t = &participant.table;
            if table.map_or(true, |table| table == t.name()) {
                if let Some(local) = t.column_index(column) {
                    return Some(base + local);
                }
            }
            base += t.column_count();
        }
        None
    }

    fn table_names(&self) -> String {
        self.participants
            .iter()
            .map(|p| p.table.name())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Returns the participants in join order.
    #[must_use]
    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    /// Returns the total number of columns across all participants.
    #[must_use]
    pub fn columns_amount(&self) -> usize {
        self.participants
            .iter()
            .map(|p| p.table.column_count())
            .sum()
    }

    /// Resolves a global column index to `(participant, local index)`.
    #[must_use]
    pub fn resolve(&self, mut index: usize) -> Option<(usize, usize)> {
        for (participant, p) in self.participants.iter().enumerate() {
            let count = p.table.column_count();
            if index < count {
                return Some((participant, index));
            }
            index -= count;
        }
        None
    }

    /// Returns the column at a global index.
    #[must_use]
    pub fn column(&self, index: usize) -> Option<&Column> {
        let (participant, local) = self.resolve(index)?;
        self.participants[participant].table.column(local)
    }

    /// Iterates over all columns in global order.
    pub fn columns(&self) -> impl Iterator<Item = &Column> + '_ {
        self.participants
            .iter()
            .flat_map(|p| p.table.columns().iter())
    }

    /// Positions a cursor on the first joined row.
    ///
    /// Returns `None` if any participant table is empty or no combination
    /// satisfies every predicate.
    pub fn first_row<S: BackingStore>(
        &self,
        db: &Database<S>,
    ) -> ChainResult<Option<JoinedRow<'_>>> {
        let mut rows = Vec::with_capacity(self.participants.len());
        for participant in &self.participants {
            match db.first_row(&participant.table)? {
                Some(row) => rows.push(Some(row)),
                None => return Ok(None),
            }
        }

        if !self.resync(db, &mut rows)? {
            return Ok(None);
        }
        JoinedRow::from_cursors(self, rows).map(Some)
    }

    /// Returns an iterator over the values of every joined row.
    pub fn tuples<'j, 'd, S: BackingStore>(
        &'j self,
        db: &'d Database<S>,
    ) -> JoinIter<'j, 'd, S> {
        JoinIter {
            joined: self,
            db,
            state: IterState::Start,
        }
    }

    /// Checks the predicate of participant `i` against the current cursors.
    fn matches<S: BackingStore>(
        &self,
        db: &Database<S>,
        rows: &[Option<Row>],
        i: usize,
    ) -> ChainResult<bool> {
        let participant = &self.participants[i];
        let (owner, local) = self
            .resolve(participant.joined_column)
            .ok_or_else(|| ChainError::internal("join column no longer resolves"))?;

        let left = db.get_value(cursor(rows, owner)?, local)?;
        let right = db.get_value(cursor(rows, i)?, participant.table_column)?;
        Ok(Value::join_eq(left.as_ref(), right.as_ref()))
    }

    /// Steps cursor `i` to its next row; `None` once it runs off the end.
    fn step<S: BackingStore>(
        &self,
        db: &Database<S>,
        rows: &mut [Option<Row>],
        i: usize,
    ) -> ChainResult<()> {
        rows[i] = match rows[i].take() {
            Some(row) => db.next_row(row)?,
            None => None,
        };
        Ok(())
    }

    /// Resets cursor `i` to its table's first row. Returns `false` when the
    /// table has become empty.
    fn reset<S: BackingStore>(
        &self,
        db: &Database<S>,
        rows: &mut [Option<Row>],
        i: usize,
    ) -> ChainResult<bool> {
        rows[i] = db.first_row(&self.participants[i].table)?;
        Ok(rows[i].is_some())
    }

    /// Propagates carries from cursor `from` leftwards. Returns `false` when
    /// the leftmost cursor is exhausted.
    fn carry<S: BackingStore>(
        &self,
        db: &Database<S>,
        rows: &mut [Option<Row>],
        from: usize,
    ) -> ChainResult<bool> {
        for j in (1..=from).rev() {
            if rows[j].is_none() {
                if !self.reset(db, rows, j)? {
                    return Ok(false);
                }
                self.step(db, rows, j - 1)?;
            }
        }
        Ok(rows[0].is_some())
    }

    /// Moves the cursors forward until every predicate holds. Returns
    /// `false` when the join is exhausted.
    fn resync<S: BackingStore>(
        &self,
        db: &Database<S>,
        rows: &mut [Option<Row>],
    ) -> ChainResult<bool> {
        let n = rows.len();
        let mut i = 1;
        while i < n {
            if self.matches(db, rows, i)? {
                i += 1;
                continue;
            }

            self.step(db, rows, i)?;
            for j in i + 1..n {
                if !self.reset(db, rows, j)? {
                    return Ok(false);
                }
            }
            if !self.carry(db, rows, i)? {
                return Ok(false);
            }
            trace!(participant = i, "join resync restart");
            i = 1;
        }
        Ok(true)
    }
}

fn cursor(rows: &[Option<Row>], i: usize) -> ChainResult<&Row> {
    rows[i]
        .as_ref()
        .ok_or_else(|| ChainError::internal(format!("join cursor {i} is not positioned")))
}

/// A cursor on one joined row: one row per participant, all predicates
/// satisfied.
#[derive(Debug)]
pub struct JoinedRow<'j> {
    joined: &'j JoinedTable,
    rows: Vec<Row>,
}

impl<'j> JoinedRow<'j> {
    fn from_cursors(joined: &'j JoinedTable, rows: Vec<Option<Row>>) -> ChainResult<Self> {
        let rows = rows
            .into_iter()
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| ChainError::internal("joined row has an unpositioned cursor"))?;
        Ok(Self { joined, rows })
    }

    /// Advances to the next joined row.
    ///
    /// Consumes the cursor; `None` means the join is exhausted.
    pub fn advance<S: BackingStore>(self, db: &Database<S>) -> ChainResult<Option<Self>> {
        let joined = self.joined;
        let mut rows: Vec<Option<Row>> = self.rows.into_iter().map(Some).collect();
        let last = rows.len() - 1;

        joined.step(db, &mut rows, last)?;
        if !joined.carry(db, &mut rows, last)? {
            return Ok(None);
        }
        if !joined.resync(db, &mut rows)? {
            return Ok(None);
        }
        Self::from_cursors(joined, rows).map(Some)
    }

    /// Returns the current row of participant `participant`.
    #[must_use]
    pub fn row(&self, participant: usize) -> Option<&Row> {
        self.rows.get(participant)
    }

    /// Reads the value at a global column index.
    pub fn get_value<S: BackingStore>(
        &self,
        db: &Database<S>,
        index: usize,
    ) -> ChainResult<Option<Value>> {
        let (participant, local) =
            self.joined
                .resolve(index)
                .ok_or(ChainError::ColumnIndexOutOfRange {
                    index,
                    count: self.joined.columns_amount(),
                })?;
        db.get_value(&self.rows[participant], local)
    }

    /// Reads every value in global column order.
    pub fn values<S: BackingStore>(&self, db: &Database<S>) -> ChainResult<Vec<Option<Value>>> {
        let mut values = Vec::with_capacity(self.joined.columns_amount());
        for row in &self.rows {
            values.extend(db.row_values(row)?);
        }
        Ok(values)
    }
}

/// Iterator over the values of every joined row.
///
/// Created by [`JoinedTable::tuples`]. Ends at exhaustion or after the
/// first error, and stays ended.
pub struct JoinIter<'j, 'd, S: BackingStore> {
    joined: &'j JoinedTable,
    db: &'d Database<S>,
    state: IterState<'j>,
}

enum IterState<'j> {
    Start,
    At(JoinedRow<'j>),
    Done,
}

impl<S: BackingStore> Iterator for JoinIter<'_, '_, S> {
    type Item = ChainResult<Vec<Option<Value>>>;

    fn next(&mut self) -> Option<Self::Item> {
        let next = match std::mem::replace(&mut self.state, IterState::Done) {
            IterState::Start => self.joined.first_row(self.db),
            IterState::At(row) => row.advance(self.db),
            IterState::Done => return None,
        };

        let row = match next {
            Ok(Some(row)) => row,
            Ok(None) => return None,
            Err(e) => return Some(Err(e)),
        };
        match row.values(self.db) {
            Ok(values) => {
                self.state = IterState::At(row);
                Some(Ok(values))
            }
            Err(e) => Some(Err(e)),
        }
    }
}

impl<S: BackingStore> FusedIterator for JoinIter<'_, '_, S> {}
