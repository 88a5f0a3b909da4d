//! Value codec.
//!
//! Converts scalars and strings to and from their on-disk encoding:
//!
//! - int / uint / num: 8 raw little-endian bytes
//! - str: 16-bit little-endian length followed by the UTF-8 bytes
//!
//! Decoding is always driven by the column type from the schema; the bytes
//! of a value carry no tag of their own.

use bytes::{Buf, BufMut, BytesMut};
use chaindb_common::constants::{MAX_STRING_LEN, POINTER_SIZE, SCALAR_SIZE, STRING_LENGTH_SIZE};
use chaindb_common::error::{ChainError, ChainResult};
use chaindb_common::types::{ColumnType, Offset, Value};

use crate::file::BackingStore;

/// Sequential reader over a variable-length record.
///
/// Every read is bounds-checked by the store, so a corrupt length or link
/// surfaces as an error rather than an out-of-range access.
pub(crate) struct RecordReader<'a, S: BackingStore> {
    store: &'a mut S,
    position: Offset,
}

impl<'a, S: BackingStore> RecordReader<'a, S> {
    pub(crate) fn new(store: &'a mut S, position: Offset) -> Self {
        Self { store, position }
    }

    fn read_array<const N: usize>(&mut self) -> ChainResult<[u8; N]> {
        let mut buf = [0u8; N];
        self.store.read_exact_at(&mut buf, self.position)?;
        self.position = self.position.add(N as u64);
        Ok(buf)
    }

    pub(crate) fn read_u8(&mut self) -> ChainResult<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    pub(crate) fn read_u16(&mut self) -> ChainResult<u16> {
        let bytes = self.read_array::<STRING_LENGTH_SIZE>()?;
        Ok((&bytes[..]).get_u16_le())
    }

    pub(crate) fn read_offset(&mut self) -> ChainResult<Offset> {
        Ok(Offset::from_le_bytes(self.read_array::<8>()?))
    }

    pub(crate) fn read_string(&mut self) -> ChainResult<String> {
        let len = usize::from(self.read_u16()?);
        let mut buf = vec![0u8; len];
        self.store.read_exact_at(&mut buf, self.position)?;
        self.position = self.position.add(len as u64);
        String::from_utf8(buf).map_err(|e| {
            ChainError::format(format!("string is not valid UTF-8: {e}"))
        })
    }

    pub(crate) fn read_value(&mut self, column_type: ColumnType) -> ChainResult<Value> {
        let value = match column_type {
            ColumnType::Int => Value::Int((&self.read_array::<SCALAR_SIZE>()?[..]).get_i64_le()),
            ColumnType::Uint => {
                Value::Uint((&self.read_array::<SCALAR_SIZE>()?[..]).get_u64_le())
            }
            ColumnType::Num => Value::Num((&self.read_array::<SCALAR_SIZE>()?[..]).get_f64_le()),
            ColumnType::Str => Value::Str(self.read_string()?),
        };
        Ok(value)
    }
}

/// Appends a length-prefixed string to `buf`.
///
/// Fails with [`ChainError::StringTooLong`] before touching `buf` when the
/// string does not fit behind the 16-bit prefix.
pub(crate) fn encode_string(buf: &mut BytesMut, s: &str) -> ChainResult<()> {
    let len = u16::try_from(s.len()).map_err(|_| ChainError::StringTooLong {
        len: s.len(),
        max_len: MAX_STRING_LEN,
    })?;
    buf.reserve(STRING_LENGTH_SIZE + s.len());
    buf.put_u16_le(len);
    buf.put_slice(s.as_bytes());
    Ok(())
}

/// Appends the encoding of `value` to `buf`.
pub(crate) fn encode_value(buf: &mut BytesMut, value: &Value) -> ChainResult<()> {
    match value {
        Value::Int(v) => buf.put_i64_le(*v),
        Value::Uint(v) => buf.put_u64_le(*v),
        Value::Num(v) => buf.put_f64_le(*v),
        Value::Str(s) => encode_string(buf, s)?,
    }
    Ok(())
}

/// Appends an offset field to `buf`.
pub(crate) fn encode_offset(buf: &mut BytesMut, offset: Offset) {
    buf.put_slice(&offset.to_le_bytes());
}

/// Reads the 8-byte offset stored at `at`.
pub(crate) fn read_offset<S: BackingStore>(store: &mut S, at: Offset) -> ChainResult<Offset> {
    let mut buf = [0u8; POINTER_SIZE as usize];
    store.read_exact_at(&mut buf, at)?;
    Ok(Offset::from_le_bytes(buf))
}

/// Overwrites the 8-byte offset field at `at`.
pub(crate) fn write_offset<S: BackingStore>(
    store: &mut S,
    at: Offset,
    offset: Offset,
) -> ChainResult<()> {
    store.write_all_at(&offset.to_le_bytes(), at)?;
    Ok(())
}

/// Reads a length-prefixed string stored at `offset`.
pub fn read_string<S: BackingStore>(store: &mut S, offset: Offset) -> ChainResult<String> {
    RecordReader::new(store, offset).read_string()
}

/// Appends a length-prefixed string and returns the offset it was written at.
pub fn write_string<S: BackingStore>(store: &mut S, s: &str) -> ChainResult<Offset> {
    let mut buf = BytesMut::new();
    encode_string(&mut buf, s)?;
    Ok(store.append(&buf)?)
}

/// Reads the value stored at `offset`, decoding it as `column_type`.
pub fn decode_value<S: BackingStore>(
    store: &mut S,
    offset: Offset,
    column_type: ColumnType,
) -> ChainResult<Value> {
    RecordReader::new(store, offset).read_value(column_type)
}

/// Appends the encoding of `value` and returns the offset it was written at.
///
/// Nothing is appended when the value cannot be encoded.
pub fn encode_value_at_end<S: BackingStore>(store: &mut S, value: &Value) -> ChainResult<Offset> {
    let mut buf = BytesMut::with_capacity(SCALAR_SIZE);
    encode_value(&mut buf, value)?;
    Ok(store.append(&buf)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::MemoryFile;

    fn round_trip(value: &Value) -> Value {
        let mut store = MemoryFile::from_bytes(vec![0xFF; 3]);
        let offset = encode_value_at_end(&mut store, value).unwrap();
        assert_eq!(offset, Offset::new(3));
        decode_value(&mut store, offset, value.column_type()).unwrap()
    }

    #[test]
    fn test_scalar_encoding_is_little_endian() {
        let mut buf = BytesMut::new();
        encode_value(&mut buf, &Value::Uint(0x0102)).unwrap();
        assert_eq!(&buf[..], &[0x02, 0x01, 0, 0, 0, 0, 0, 0]);

        let mut buf = BytesMut::new();
        encode_value(&mut buf, &Value::Int(-1)).unwrap();
        assert_eq!(&buf[..], &[0xFF; 8]);
    }

    #[test]
    fn test_string_encoding() {
        let mut buf = BytesMut::new();
        encode_value(&mut buf, &Value::str("abc")).unwrap();
        assert_eq!(&buf[..], &[3, 0, b'a', b'b', b'c']);
    }

    #[test]
    fn test_value_round_trip() {
        assert_eq!(round_trip(&Value::Int(i64::MIN)), Value::Int(i64::MIN));
        assert_eq!(round_trip(&Value::Uint(u64::MAX)), Value::Uint(u64::MAX));
        assert_eq!(round_trip(&Value::Num(-0.125)), Value::Num(-0.125));
        assert_eq!(round_trip(&Value::str("")), Value::str(""));
        assert_eq!(round_trip(&Value::str("héllo")), Value::str("héllo"));
    }

    #[test]
    fn test_string_too_long_appends_nothing() {
        let mut store = MemoryFile::new();
        let long = "x".repeat(MAX_STRING_LEN + 1);

        let err = write_string(&mut store, &long).unwrap_err();
        assert!(matches!(err, ChainError::StringTooLong { .. }));
        assert_eq!(store.size(), 0);

        let max = "y".repeat(MAX_STRING_LEN);
        let offset = write_string(&mut store, &max).unwrap();
        assert_eq!(read_string(&mut store, offset).unwrap().len(), MAX_STRING_LEN);
    }

    #[test]
    fn test_truncated_string_is_rejected() {
        // Length prefix claims 10 bytes but only 2 follow.
        let mut store = MemoryFile::from_bytes(vec![10, 0, b'a', b'b']);
        let err = read_string(&mut store, Offset::NULL).unwrap_err();
        assert!(err.is_corruption());
    }

    #[test]
    fn test_invalid_utf8_is_format_error() {
        let mut store = MemoryFile::from_bytes(vec![2, 0, 0xC3, 0x28]);
        let err = read_string(&mut store, Offset::NULL).unwrap_err();
        assert!(matches!(err, ChainError::Format { .. }));
    }

    #[test]
    fn test_offset_fields() {
        let mut store = MemoryFile::from_bytes(vec![0; 16]);
        write_offset(&mut store, Offset::new(8), Offset::new(0xABCD)).unwrap();
        assert_eq!(
            read_offset(&mut store, Offset::new(8)).unwrap(),
            Offset::new(0xABCD)
        );
        assert_eq!(read_offset(&mut store, Offset::NULL).unwrap(), Offset::NULL);
    }
}
