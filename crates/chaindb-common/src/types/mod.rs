//! Type definitions for ChainDB.
//!
//! This module contains the core types shared by the storage engine and
//! its callers.

mod column;
mod offset;
mod value;

pub use column::{Column, ColumnType};
pub use offset::Offset;
pub use value::Value;
