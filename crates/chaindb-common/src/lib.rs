//! # chaindb-common
//!
//! Common types, errors, and configuration for ChainDB.
//!
//! This crate provides the foundational types shared by the storage engine
//! and the command-line tool. It includes:
//!
//! - **Types**: file offsets (`Offset`), column schemas and scalar values
//! - **Errors**: unified error handling with `ChainError`
//! - **Config**: database configuration structures
//! - **Constants**: the on-disk format constants
//!
//! ## Example
//!
//! ```rust
//! use chaindb_common::types::{Column, ColumnType, Offset, Value};
//! use chaindb_common::error::ChainResult;
//!
//! fn example() -> ChainResult<()> {
//!     let column = Column::new("id", ColumnType::Uint);
//!     let value = Value::Uint(7);
//!     assert_eq!(value.column_type(), column.column_type);
//!     assert!(Offset::NULL.is_null());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod constants;
pub mod error;
pub mod types;

// Re-export commonly used items at the crate root
pub use constants::*;
pub use error::{ChainError, ChainResult};
pub use types::{Column, ColumnType, Offset, Value};
