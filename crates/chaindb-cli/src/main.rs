//! ChainDB Command-Line Interface
//!
//! Administers a ChainDB database file: create tables, insert, scan, join,
//! update, and delete rows.
//!
//! # Usage
//!
//! ```bash
//! # Create a database and a table
//! chaindb --db shop.chaindb init
//! chaindb --db shop.chaindb create users id:uint name:str
//!
//! # Insert and scan
//! chaindb --db shop.chaindb insert users 1 alice
//! chaindb --db shop.chaindb scan users
//!
//! # Join orders to users on orders.user_id = users.id, as JSON
//! chaindb --db shop.chaindb -o json scan users --join orders:user_id=id
//!
//! # Filter, project, and page
//! chaindb --db shop.chaindb scan users --where "id > 10 AND name <> 'bob'" \
//!     --columns id,name --offset 20 --limit 10
//! chaindb --db shop.chaindb delete users --where "name IS NULL"
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{anyhow, Result};
use chaindb_common::config::DatabaseConfig;
use chaindb_storage::Database;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod filter;
mod formatter;

use commands::{CommandResult, JoinSpec, ScanOptions};
use config::CliConfig;
use filter::Condition;
use formatter::OutputFormat;

/// ChainDB command-line interface
#[derive(Parser, Debug)]
#[command(
    name = "chaindb",
    version,
    about = "Command-line interface for ChainDB database files"
)]
struct Args {
    /// Database file
    #[arg(short = 'd', long, value_name = "PATH", env = "CHAINDB_PATH")]
    db: Option<PathBuf>,

    /// Configuration file path
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short = 'o', long, value_enum)]
    output: Option<OutputFormatArg>,

    /// Enable verbose output
    #[arg(short = 'v', long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create (or re-initialize) the database file
    Init,
    /// List tables newest first with their schemas
    Tables,
    /// Create a table
    Create {
        /// Table name
        table: String,
        /// Columns as NAME:TYPE (types: int, uint, num, str)
        #[arg(required = true)]
        columns: Vec<String>,
    },
    /// Remove a table
    Drop {
        /// Table name
        table: String,
    },
    /// Append a row; `null` stores an absent value
    Insert {
        /// Table name
        table: String,
        /// One value per column
        values: Vec<String>,
    },
    /// Print rows, optionally joined with further tables
    Scan {
        /// Table name
        table: String,
        /// Join clause TABLE:COLUMN=JOINED_COLUMN
        #[arg(long = "join", value_name = "JOIN")]
        joins: Vec<JoinSpec>,
        /// Row filter, e.g. "age >= 18 AND name <> 'bob'"
        #[arg(long = "where", value_name = "CONDITION")]
        filter: Option<Condition>,
        /// Comma-separated columns to print
        #[arg(long, value_name = "COLUMNS", value_delimiter = ',')]
        columns: Vec<String>,
        /// Matching rows to skip
        #[arg(long, default_value_t = 0)]
        offset: usize,
        /// Maximum number of rows to print
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Remove rows matching a filter (all rows without --where)
    Delete {
        /// Table name
        table: String,
        /// Row filter
        #[arg(long = "where", value_name = "CONDITION")]
        filter: Option<Condition>,
    },
    /// Update rows matching a filter (all rows without --where)
    Update {
        /// Table name
        table: String,
        /// Assignment COLUMN=VALUE
        #[arg(long = "set", value_name = "ASSIGNMENT", required = true)]
        assignments: Vec<String>,
        /// Row filter
        #[arg(long = "where", value_name = "CONDITION")]
        filter: Option<Condition>,
    },
}

/// Output format argument
#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormatArg {
    /// Display results in a formatted table
    Table,
    /// Display results as JSON
    Json,
    /// Display results as CSV
    Csv,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Table => OutputFormat::Table,
            OutputFormatArg::Json => OutputFormat::Json,
            OutputFormatArg::Csv => OutputFormat::Csv,
        }
    }
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let args = Args::parse();

    init_logging(args.verbose);

    let config = load_config(&args)?;
    let format = match args.output {
        Some(arg) => arg.into(),
        None => OutputFormat::from_name(&config.output_format)
            .ok_or_else(|| anyhow!("unknown output format '{}'", config.output_format))?,
    };

    let db_config = DatabaseConfig {
        create_if_missing: matches!(args.command, Command::Init | Command::Create { .. }),
        truncate_existing: matches!(args.command, Command::Init),
        ..DatabaseConfig::with_path(config.database_path()).sync_on_write(config.sync_on_write)
    };
    info!(path = %db_config.path.display(), "opening database");
    let mut db = Database::open_with_config(&db_config)?;

    let result = match &args.command {
        Command::Init => CommandResult::Message(format!(
            "initialized {}",
            db_config.path.display()
        )),
        Command::Tables => commands::list_tables(&db)?,
        Command::Create { table, columns } => commands::create_table(&mut db, table, columns)?,
        Command::Drop { table } => commands::drop_table(&mut db, table)?,
        Command::Insert { table, values } => commands::insert(&mut db, table, values)?,
        Command::Scan {
            table,
            joins,
            filter,
            columns,
            offset,
            limit,
        } => {
            let options = ScanOptions {
                joins: joins.clone(),
                filter: filter.clone(),
                columns: columns.clone(),
                offset: *offset,
                limit: *limit,
            };
            commands::scan(&db, table, &options)?
        }
        Command::Delete { table, filter } => commands::delete(&mut db, table, filter.as_ref())?,
        Command::Update {
            table,
            assignments,
            filter,
        } => commands::update(&mut db, table, filter.as_ref(), assignments)?,
    };

    match result {
        CommandResult::Rows(rows) => {
            print!("{}", with_newline(rows.render(format)));
        }
        CommandResult::Message(message) => println!("{message}"),
    }

    db.sync()?;
    Ok(())
}

fn with_newline(mut output: String) -> String {
    if !output.ends_with('\n') {
        output.push('\n');
    }
    output
}

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("chaindb=debug,chaindb_storage=debug")
        } else {
            EnvFilter::new("chaindb=warn,chaindb_storage=warn")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn load_config(args: &Args) -> Result<CliConfig> {
    let mut config = if let Some(path) = &args.config {
        CliConfig::from_file(path)?
    } else {
        CliConfig::discover()?
    };

    if let Some(db) = &args.db {
        config.database = Some(db.clone());
    }

    Ok(config)
}
