//! Command implementations.
//!
//! Each command runs against an open [`Database`] and returns either a
//! [`ResultSet`] to print or a short status message.

use anyhow::{anyhow, bail, Context, Result};
use chaindb_common::types::{Column, ColumnType, Value};
use chaindb_storage::file::BackingStore;
use chaindb_storage::{Database, JoinedTable, Table, TableSchema};
use tracing::{debug, info};

use crate::filter::{Condition, Predicate};
use crate::formatter::ResultSet;

/// Literal that stands for an absent value on the command line.
pub const NULL_LITERAL: &str = "null";

/// What a command produced.
#[derive(Debug, PartialEq)]
pub enum CommandResult {
    /// Rows to print in the selected output format.
    Rows(ResultSet),
    /// A status message.
    Message(String),
}

/// A join clause given as `TABLE:TABLE_COLUMN=JOINED_COLUMN`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinSpec {
    /// Table to join in.
    pub table: String,
    /// Column of that table.
    pub table_column: String,
    /// Column of the joined tables so far, optionally `table.column`.
    pub joined_column: String,
}

impl std::str::FromStr for JoinSpec {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let (table, predicate) = s
            .split_once(':')
            .ok_or_else(|| anyhow!("join '{s}' must look like TABLE:COLUMN=JOINED_COLUMN"))?;
        let (table_column, joined_column) = predicate
            .split_once('=')
            .ok_or_else(|| anyhow!("join '{s}' is missing '='"))?;
        if table.is_empty() || table_column.is_empty() || joined_column.is_empty() {
            bail!("join '{s}' has an empty part");
        }

        Ok(Self {
            table: table.to_string(),
            table_column: table_column.to_string(),
            joined_column: joined_column.to_string(),
        })
    }
}

/// Parses a `name:type` column definition.
pub fn parse_column(def: &str) -> Result<Column> {
    let (name, ty) = def
        .split_once(':')
        .ok_or_else(|| anyhow!("column '{def}' must look like NAME:TYPE"))?;
    if name.is_empty() {
        bail!("column '{def}' has an empty name");
    }
    Ok(Column::new(name, ty.parse::<ColumnType>()?))
}

/// Parses a command-line literal as a value of `column_type`.
///
/// `null` (any case) is the absent value.
pub fn parse_value(column_type: ColumnType, literal: &str) -> Result<Option<Value>> {
    if literal.eq_ignore_ascii_case(NULL_LITERAL) {
        return Ok(None);
    }

    let value = match column_type {
        ColumnType::Int => Value::Int(
            literal
                .parse()
                .with_context(|| format!("'{literal}' is not an int"))?,
        ),
        ColumnType::Uint => Value::Uint(
            literal
                .parse()
                .with_context(|| format!("'{literal}' is not a uint"))?,
        ),
        ColumnType::Num => Value::Num(
            literal
                .parse()
                .with_context(|| format!("'{literal}' is not a num"))?,
        ),
        ColumnType::Str => Value::str(literal),
    };
    Ok(Some(value))
}

fn column_of(table: &Table, name: &str) -> Result<(usize, ColumnType)> {
    let index = table
        .column_index(name)
        .ok_or_else(|| anyhow!("table '{}' has no column '{name}'", table.name()))?;
    Ok((index, table.columns()[index].column_type))
}

/// Lists every table with its schema, newest first.
pub fn list_tables<S: BackingStore>(db: &Database<S>) -> Result<CommandResult> {
    let rows = db
        .tables()?
        .into_iter()
        .map(|table| {
            let schema = table
                .columns()
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            vec![Some(Value::str(table.name())), Some(Value::str(schema))]
        })
        .collect();

    Ok(CommandResult::Rows(ResultSet {
        columns: vec!["table".to_string(), "columns".to_string()],
        rows,
    }))
}

/// Creates a table from `name:type` column definitions.
pub fn create_table<S: BackingStore>(
    db: &mut Database<S>,
    name: &str,
    columns: &[String],
) -> Result<CommandResult> {
    let mut schema = TableSchema::new(name);
    for def in columns {
        schema.columns.push(parse_column(def)?);
    }

    let table = db.add_table(schema)?;
    info!(table = name, position = %table.position(), "created table");
    Ok(CommandResult::Message(format!(
        "created table {name} ({} columns)",
        table.column_count()
    )))
}

/// Removes a table.
pub fn drop_table<S: BackingStore>(db: &mut Database<S>, name: &str) -> Result<CommandResult> {
    let table = db.table(name)?;
    db.remove_table(table)?;
    Ok(CommandResult::Message(format!("dropped table {name}")))
}

/// Appends a row; one literal per column.
pub fn insert<S: BackingStore>(
    db: &mut Database<S>,
    name: &str,
    literals: &[String],
) -> Result<CommandResult> {
    let table = db.table(name)?;
    if literals.len() != table.column_count() {
        bail!(
            "table '{name}' has {} columns, got {} values",
            table.column_count(),
            literals.len()
        );
    }

    let values = table
        .columns()
        .iter()
        .zip(literals)
        .map(|(column, literal)| parse_value(column.column_type, literal))
        .collect::<Result<Vec<_>>>()?;
    let row = db.insert_row(&table, &values)?;

    debug!(table = name, row = %row.position(), "inserted row");
    Ok(CommandResult::Message("inserted 1 row".to_string()))
}

/// Options of the `scan` command.
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    /// Tables to join in, in order.
    pub joins: Vec<JoinSpec>,
    /// Only rows matching this filter are returned.
    pub filter: Option<Condition>,
    /// Columns to return; empty means all.
    pub columns: Vec<String>,
    /// Matching rows to skip.
    pub offset: usize,
    /// Maximum number of rows to return.
    pub limit: Option<usize>,
}

/// Prints the rows of a table, optionally joined with further tables.
///
/// Rows are filtered first, then `offset` and `limit` apply, then the
/// selected columns are projected.
pub fn scan<S: BackingStore>(
    db: &Database<S>,
    name: &str,
    options: &ScanOptions,
) -> Result<CommandResult> {
    let mut joined = JoinedTable::wrap(db.table(name)?);
    for join in &options.joins {
        let table = db.table(&join.table)?;
        joined = joined.join_on(table, &join.table_column, &join.joined_column)?;
    }
    for participant in &joined.participants()[1..] {
        debug!(
            table = participant.table().name(),
            table_column = participant.table_column(),
            joined_column = participant.joined_column(),
            "joining"
        );
    }

    let qualify = !options.joins.is_empty();
    let headers: Vec<String> = joined
        .participants()
        .iter()
        .flat_map(|p| {
            let table = p.table().name();
            p.table().columns().iter().map(move |c| {
                if qualify {
                    format!("{table}.{}", c.name)
                } else {
                    c.name.clone()
                }
            })
        })
        .collect();

    let lookup = |column: &str| joined.column_index(column);
    let filter = bind_filter(options.filter.as_ref(), &lookup)?;
    let projection = if options.columns.is_empty() {
        (0..headers.len()).collect()
    } else {
        options
            .columns
            .iter()
            .map(|column| lookup(column).ok_or_else(|| anyhow!("unknown column '{column}'")))
            .collect::<Result<Vec<_>>>()?
    };

    let mut rows = Vec::new();
    let mut skipped = 0;
    for tuple in joined.tuples(db) {
        if options.limit.is_some_and(|limit| rows.len() >= limit) {
            break;
        }
        let values = tuple?;
        if !filter.as_ref().map_or(true, |p| p.matches(&values)) {
            continue;
        }
        if skipped < options.offset {
            skipped += 1;
            continue;
        }
        rows.push(projection.iter().map(|&i| values[i].clone()).collect());
    }

    Ok(CommandResult::Rows(ResultSet {
        columns: projection.iter().map(|&i| headers[i].clone()).collect(),
        rows,
    }))
}

fn bind_filter(
    filter: Option<&Condition>,
    lookup: &impl Fn(&str) -> Option<usize>,
) -> Result<Option<Predicate>> {
    filter.map(|condition| condition.bind(lookup)).transpose()
}

/// Removes every row matching `filter`, or every row when there is none.
pub fn delete<S: BackingStore>(
    db: &mut Database<S>,
    name: &str,
    filter: Option<&Condition>,
) -> Result<CommandResult> {
    let table = db.table(name)?;
    let scope = JoinedTable::wrap(table.clone());
    let filter = bind_filter(filter, &|column: &str| scope.column_index(column))?;

    let mut removed = 0;
    let mut cursor = db.first_row(&table)?;
    while let Some(row) = cursor {
        let values = db.row_values(&row)?;
        if filter.as_ref().map_or(true, |p| p.matches(&values)) {
            db.remove_row(&row)?;
            removed += 1;
        }
        cursor = db.next_row(row)?;
    }

    Ok(CommandResult::Message(format!("deleted {removed} rows")))
}

/// Sets columns on every row matching `filter`, or on every row when there
/// is none.
///
/// Each assignment is `COLUMN=VALUE`.
pub fn update<S: BackingStore>(
    db: &mut Database<S>,
    name: &str,
    filter: Option<&Condition>,
    assignments: &[String],
) -> Result<CommandResult> {
    let table = db.table(name)?;
    let scope = JoinedTable::wrap(table.clone());
    let filter = bind_filter(filter, &|column: &str| scope.column_index(column))?;

    let mut updates = Vec::with_capacity(assignments.len());
    for assignment in assignments {
        let (set_column, value) = assignment
            .split_once('=')
            .ok_or_else(|| anyhow!("assignment '{assignment}' must look like COLUMN=VALUE"))?;
        let (set_index, set_type) = column_of(&table, set_column)?;
        updates.push((set_index, parse_value(set_type, value)?));
    }
    if updates.is_empty() {
        bail!("update needs at least one --set COLUMN=VALUE");
    }

    let mut updated = 0;
    let mut cursor = db.first_row(&table)?;
    while let Some(row) = cursor {
        let values = db.row_values(&row)?;
        if filter.as_ref().map_or(true, |p| p.matches(&values)) {
            for (set_index, value) in &updates {
                db.set_value(&row, *set_index, value.as_ref())?;
            }
            updated += 1;
        }
        cursor = db.next_row(row)?;
    }

    Ok(CommandResult::Message(format!("updated {updated} rows")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chaindb_storage::file::MemoryFile;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(ToString::to_string).collect()
    }

    fn setup() -> Database<MemoryFile> {
        let mut db = Database::in_memory().unwrap();
        create_table(&mut db, "users", &strings(&["id:uint", "name:str"])).unwrap();
        create_table(&mut db, "posts", &strings(&["user_id:uint", "title:str"])).unwrap();
        for (id, name) in [("1", "ann"), ("2", "bob")] {
            insert(&mut db, "users", &strings(&[id, name])).unwrap();
        }
        for (user, title) in [("1", "hello"), ("1", "again"), ("3", "orphan")] {
            insert(&mut db, "posts", &strings(&[user, title])).unwrap();
        }
        db
    }

    fn rows(result: CommandResult) -> ResultSet {
        match result {
            CommandResult::Rows(rows) => rows,
            CommandResult::Message(m) => panic!("expected rows, got message {m}"),
        }
    }

    #[test]
    fn test_parse_value() {
        assert_eq!(
            parse_value(ColumnType::Int, "-5").unwrap(),
            Some(Value::Int(-5))
        );
        assert_eq!(parse_value(ColumnType::Uint, "NULL").unwrap(), None);
        assert_eq!(
            parse_value(ColumnType::Num, "1.5").unwrap(),
            Some(Value::Num(1.5))
        );
        assert_eq!(
            parse_value(ColumnType::Str, "x y").unwrap(),
            Some(Value::str("x y"))
        );
        assert!(parse_value(ColumnType::Uint, "-1").is_err());
    }

    #[test]
    fn test_parse_column() {
        assert_eq!(
            parse_column("score:num").unwrap(),
            Column::new("score", ColumnType::Num)
        );
        assert!(parse_column("score").is_err());
        assert!(parse_column("score:bool").is_err());
        assert!(parse_column(":int").is_err());
    }

    #[test]
    fn test_parse_join() {
        let join: JoinSpec = "posts:user_id=users.id".parse().unwrap();
        assert_eq!(join.table, "posts");
        assert_eq!(join.table_column, "user_id");
        assert_eq!(join.joined_column, "users.id");

        assert!("posts".parse::<JoinSpec>().is_err());
        assert!("posts:user_id".parse::<JoinSpec>().is_err());
        assert!("posts:=id".parse::<JoinSpec>().is_err());
    }

    #[test]
    fn test_list_tables() {
        let db = setup();
        let result = rows(list_tables(&db).unwrap());
        assert_eq!(
            result.rows[0],
            vec![
                Some(Value::str("posts")),
                Some(Value::str("user_id:uint, title:str"))
            ]
        );
        assert_eq!(result.rows.len(), 2);
    }

    #[test]
    fn test_scan_and_join() {
        let db = setup();

        let plain = rows(scan(&db, "users", &ScanOptions::default()).unwrap());
        assert_eq!(plain.columns, ["id", "name"]);
        assert_eq!(plain.rows.len(), 2);

        let options = ScanOptions {
            joins: vec!["posts:user_id=id".parse().unwrap()],
            ..ScanOptions::default()
        };
        let joined = rows(scan(&db, "users", &options).unwrap());
        assert_eq!(
            joined.columns,
            ["users.id", "users.name", "posts.user_id", "posts.title"]
        );
        let mut titles: Vec<_> = joined.rows.iter().map(|r| r[3].clone()).collect();
        titles.sort_by_key(|t| t.as_ref().map(ToString::to_string));
        assert_eq!(
            titles,
            vec![Some(Value::str("again")), Some(Value::str("hello"))]
        );
    }

    #[test]
    fn test_scan_filter_and_projection() {
        let db = setup();

        let options = ScanOptions {
            filter: Some("user_id <= 1 OR title = 'orphan'".parse().unwrap()),
            columns: strings(&["title"]),
            ..ScanOptions::default()
        };
        let result = rows(scan(&db, "posts", &options).unwrap());
        assert_eq!(result.columns, ["title"]);
        assert_eq!(
            result.rows,
            vec![
                vec![Some(Value::str("orphan"))],
                vec![Some(Value::str("again"))],
                vec![Some(Value::str("hello"))],
            ]
        );

        let options = ScanOptions {
            filter: Some("user_id > 1".parse().unwrap()),
            ..ScanOptions::default()
        };
        let result = rows(scan(&db, "posts", &options).unwrap());
        assert_eq!(
            result.rows,
            vec![vec![Some(Value::Uint(3)), Some(Value::str("orphan"))]]
        );
    }

    #[test]
    fn test_scan_join_with_qualified_names() {
        let db = setup();

        let options = ScanOptions {
            joins: vec!["posts:user_id=id".parse().unwrap()],
            filter: Some("posts.title <> 'hello'".parse().unwrap()),
            columns: strings(&["name", "posts.title"]),
            ..ScanOptions::default()
        };
        let result = rows(scan(&db, "users", &options).unwrap());
        assert_eq!(result.columns, ["users.name", "posts.title"]);
        assert_eq!(
            result.rows,
            vec![vec![Some(Value::str("ann")), Some(Value::str("again"))]]
        );
    }

    #[test]
    fn test_scan_offset_and_limit() {
        let db = setup();
        let page = |offset, limit| {
            let options = ScanOptions {
                columns: strings(&["title"]),
                offset,
                limit,
                ..ScanOptions::default()
            };
            rows(scan(&db, "posts", &options).unwrap()).rows
        };

        assert_eq!(page(0, Some(2)).len(), 2);
        assert_eq!(
            page(1, Some(1)),
            vec![vec![Some(Value::str("again"))]]
        );
        assert_eq!(
            page(2, None),
            vec![vec![Some(Value::str("hello"))]]
        );
        assert!(page(5, None).is_empty());
        assert!(page(0, Some(0)).is_empty());
    }

    #[test]
    fn test_scan_unknown_columns() {
        let db = setup();

        let options = ScanOptions {
            columns: strings(&["nope"]),
            ..ScanOptions::default()
        };
        assert!(scan(&db, "posts", &options).is_err());

        let options = ScanOptions {
            filter: Some("nope = 1".parse().unwrap()),
            ..ScanOptions::default()
        };
        assert!(scan(&db, "posts", &options).is_err());
    }

    #[test]
    fn test_insert_checks_arity_and_types() {
        let mut db = setup();
        assert!(insert(&mut db, "users", &strings(&["1"])).is_err());
        assert!(insert(&mut db, "users", &strings(&["one", "x"])).is_err());
        assert!(insert(&mut db, "nope", &strings(&["1", "x"])).is_err());
        assert!(insert(&mut db, "users", &strings(&["3", "null"])).is_ok());
    }

    #[test]
    fn test_delete() {
        let mut db = setup();
        let filter: Condition = "user_id = 1".parse().unwrap();
        let result = delete(&mut db, "posts", Some(&filter)).unwrap();
        assert_eq!(result, CommandResult::Message("deleted 2 rows".to_string()));

        let remaining = rows(scan(&db, "posts", &ScanOptions::default()).unwrap());
        assert_eq!(
            remaining.rows,
            vec![vec![Some(Value::Uint(3)), Some(Value::str("orphan"))]]
        );
    }

    #[test]
    fn test_delete_compound_filter_and_all() {
        let mut db = setup();
        let filter: Condition = "user_id = 3 OR title = 'again'".parse().unwrap();
        delete(&mut db, "posts", Some(&filter)).unwrap();

        let remaining = rows(scan(&db, "posts", &ScanOptions::default()).unwrap());
        assert_eq!(
            remaining.rows,
            vec![vec![Some(Value::Uint(1)), Some(Value::str("hello"))]]
        );

        let result = delete(&mut db, "posts", None).unwrap();
        assert_eq!(result, CommandResult::Message("deleted 1 rows".to_string()));
        assert!(rows(scan(&db, "posts", &ScanOptions::default()).unwrap())
            .rows
            .is_empty());
    }

    #[test]
    fn test_update() {
        let mut db = setup();
        let filter: Condition = "name = 'bob'".parse().unwrap();
        let result = update(
            &mut db,
            "users",
            Some(&filter),
            &strings(&["name=robert", "id=null"]),
        )
        .unwrap();
        assert_eq!(result, CommandResult::Message("updated 1 rows".to_string()));

        let users = rows(scan(&db, "users", &ScanOptions::default()).unwrap());
        assert!(users
            .rows
            .contains(&vec![None, Some(Value::str("robert"))]));
        assert!(update(&mut db, "users", Some(&filter), &[]).is_err());
        assert!(update(&mut db, "users", None, &strings(&["age=3"])).is_err());
    }

    #[test]
    fn test_update_by_range() {
        let mut db = setup();
        let filter: Condition = "id IS NOT NULL AND id < 2".parse().unwrap();
        update(&mut db, "users", Some(&filter), &strings(&["name=first"])).unwrap();

        let options = ScanOptions {
            filter: Some("name = 'first'".parse().unwrap()),
            columns: strings(&["id"]),
            ..ScanOptions::default()
        };
        let result = rows(scan(&db, "users", &options).unwrap());
        assert_eq!(result.rows, vec![vec![Some(Value::Uint(1))]]);
    }

    #[test]
    fn test_drop_table() {
        let mut db = setup();
        drop_table(&mut db, "posts").unwrap();
        assert!(scan(&db, "posts", &ScanOptions::default()).is_err());
        assert!(drop_table(&mut db, "posts").is_err());
    }
}
