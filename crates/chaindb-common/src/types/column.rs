//! Column schema types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ChainError;

/// Declared type of a column.
///
/// The discriminant is the byte stored in the table header, so the values
/// are part of the file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum ColumnType {
    /// Signed 64-bit integer.
    Int = 0,
    /// Unsigned 64-bit integer.
    Uint = 1,
    /// IEEE 754 double.
    Num = 2,
    /// Length-prefixed UTF-8 text.
    Str = 3,
}

impl ColumnType {
    /// All column types in tag order.
    pub const ALL: [Self; 4] = [Self::Int, Self::Uint, Self::Num, Self::Str];

    /// Returns the on-disk tag byte.
    #[inline]
    #[must_use]
    pub const fn as_byte(self) -> u8 {
        self as u8
    }

    /// Decodes a tag byte, returning `None` for unknown tags.
    #[must_use]
    pub const fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Self::Int),
            1 => Some(Self::Uint),
            2 => Some(Self::Num),
            3 => Some(Self::Str),
            _ => None,
        }
    }

    /// Returns the short type name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Uint => "uint",
            Self::Num => "num",
            Self::Str => "str",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ColumnType {
    type Err = ChainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|ty| ty.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ChainError::invalid_argument(format!("unknown column type '{s}'")))
    }
}

/// A named, typed column of a table schema.
///
/// Column order inside a schema defines the row slot order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Column {
    /// Column name.
    pub name: String,
    /// Declared type of every value stored in this column.
    #[serde(rename = "type")]
    pub column_type: ColumnType,
}

impl Column {
    /// Creates a new column.
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.column_type)
    }
}
