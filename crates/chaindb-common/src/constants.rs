//! On-disk format constants for ChainDB.
//!
//! Every structure in a database file is addressed by byte offset, so these
//! sizes and positions are part of the file format and must never change.

// =============================================================================
// File Header
// =============================================================================

/// Magic signature written at offset 0 of every database file.
pub const MAGIC: [u8; 4] = [0xDE, 0xAD, 0xBA, 0xBE];

/// Byte offset of the root pointer (the newest table header).
pub const ROOT_POINTER_OFFSET: u64 = MAGIC.len() as u64;

/// Total size of the file header: signature plus root pointer.
pub const FILE_HEADER_SIZE: u64 = ROOT_POINTER_OFFSET + POINTER_SIZE;

// =============================================================================
// Records
// =============================================================================

/// Size of every offset field (`next`, `first_row`, value slots).
pub const POINTER_SIZE: u64 = 8;

/// Offset of the `first_row` field inside a table header.
pub const TABLE_FIRST_ROW_FIELD: u64 = POINTER_SIZE;

/// Offset of the first name byte inside a table header (after `next` and `first_row`).
pub const TABLE_NAME_FIELD: u64 = 2 * POINTER_SIZE;

/// Size of a fixed-width scalar value (int, uint, num).
pub const SCALAR_SIZE: usize = 8;

/// Size of the length prefix in front of every string.
pub const STRING_LENGTH_SIZE: usize = 2;

/// Longest string, in bytes, that fits behind the 16-bit length prefix.
pub const MAX_STRING_LEN: usize = u16::MAX as usize;

/// Largest number of columns a table header can describe.
pub const MAX_COLUMNS: usize = u16::MAX as usize;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_layout() {
        assert_eq!(ROOT_POINTER_OFFSET, 4);
        assert_eq!(FILE_HEADER_SIZE, 12);
        assert_eq!(TABLE_NAME_FIELD, 16);
    }
}
