//! File offsets used in place of in-memory pointers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Byte position of a record inside a database file.
///
/// Every link in the file (root pointer, `next` fields, `first_row`, value
/// slots) is an offset. Offset 0 is reserved as the "end of list" / "no value"
/// sentinel; the file header guarantees no record ever lives there.
///
/// # Example
///
/// ```rust
/// use chaindb_common::types::Offset;
///
/// let offset = Offset::new(42);
/// assert_eq!(offset.as_u64(), 42);
/// assert!(!offset.is_null());
/// assert!(Offset::NULL.is_null());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Offset(u64);

impl Offset {
    /// The null offset: end of a list, or an absent value.
    pub const NULL: Self = Self(0);

    /// Creates a new `Offset` from a raw u64 value.
    #[inline]
    #[must_use]
    pub const fn new(offset: u64) -> Self {
        Self(offset)
    }

    /// Returns the raw u64 value.
    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Checks if this is the null sentinel.
    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    /// Returns `None` for the null sentinel.
    #[inline]
    #[must_use]
    pub const fn non_null(self) -> Option<Self> {
        if self.is_null() {
            None
        } else {
            Some(self)
        }
    }

    /// Returns the offset `delta` bytes further into the file.
    #[inline]
    #[must_use]
    pub const fn add(self, delta: u64) -> Self {
        Self(self.0 + delta)
    }

    /// Decodes an offset from its on-disk (little-endian) form.
    #[inline]
    #[must_use]
    pub fn from_le_bytes(bytes: [u8; 8]) -> Self {
        Self(u64::from_le_bytes(bytes))
    }

    /// Encodes the offset in its on-disk (little-endian) form.
    #[inline]
    #[must_use]
    pub fn to_le_bytes(self) -> [u8; 8] {
        self.0.to_le_bytes()
    }
}

impl fmt::Debug for Offset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "Offset(NULL)")
        } else {
            write!(f, "Offset({:#x})", self.0)
        }
    }
}

impl fmt::Display for Offset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl From<u64> for Offset {
    #[inline]
    fn from(offset: u64) -> Self {
        Self::new(offset)
    }
}

impl From<Offset> for u64 {
    #[inline]
    fn from(offset: Offset) -> Self {
        offset.0
    }
}
