//! Scalar values stored in table rows.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use super::column::ColumnType;

/// A single scalar stored in a row slot.
///
/// Every value carries its own tag, but decoding never infers the tag from
/// the bytes: the column schema decides how a slot is read. An absent value
/// (a zero slot) is represented as `Option::<Value>::None`, which is distinct
/// from any zero-valued scalar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Value {
    /// Signed 64-bit integer.
    Int(i64),
    /// Unsigned 64-bit integer.
    Uint(u64),
    /// IEEE 754 double.
    Num(f64),
    /// UTF-8 text.
    Str(String),
}

impl Value {
    /// Returns the column type this value can be stored under.
    #[must_use]
    pub const fn column_type(&self) -> ColumnType {
        match self {
            Self::Int(_) => ColumnType::Int,
            Self::Uint(_) => ColumnType::Uint,
            Self::Num(_) => ColumnType::Num,
            Self::Str(_) => ColumnType::Str,
        }
    }

    /// Creates a text value.
    pub fn str(s: impl Into<String>) -> Self {
        Self::Str(s.into())
    }

    /// Returns the text if this is a string value.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Join-predicate equality with cross-type coercion.
    ///
    /// - absent equals only absent
    /// - present values are equal when [`Value::compare`] finds them equal
    #[must_use]
    pub fn join_eq(a: Option<&Self>, b: Option<&Self>) -> bool {
        match (a, b) {
            (Some(a), Some(b)) => Self::compare(a, b) == Some(Ordering::Equal),
            (None, None) => true,
            _ => false,
        }
    }

    /// Orders two present values across types.
    ///
    /// - int and uint compare exactly, so a negative int is below every uint
    /// - int or uint against num compare after conversion to `f64`
    /// - text compares byte-wise, and only against text
    ///
    /// Returns `None` for text against a number and for NaN.
    #[must_use]
    pub fn compare(a: &Self, b: &Self) -> Option<Ordering> {
        match (a, b) {
            (Self::Int(x), Self::Int(y)) => Some(x.cmp(y)),
            (Self::Uint(x), Self::Uint(y)) => Some(x.cmp(y)),
            (Self::Int(i), Self::Uint(u)) => Some(i128::from(*i).cmp(&i128::from(*u))),
            (Self::Uint(u), Self::Int(i)) => Some(i128::from(*u).cmp(&i128::from(*i))),
            (Self::Str(x), Self::Str(y)) => Some(x.as_bytes().cmp(y.as_bytes())),
            (Self::Str(_), _) | (_, Self::Str(_)) => None,
            (x, y) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Uint(v) => Some(*v as f64),
            Self::Num(v) => Some(*v),
            Self::Str(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Uint(v) => write!(f, "{v}"),
            Self::Num(v) => write!(f, "{v}"),
            Self::Str(v) => f.write_str(v),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Self::Uint(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Num(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eq(a: &Value, b: &Value) -> bool {
        Value::join_eq(Some(a), Some(b))
    }

    #[test]
    fn test_column_type_tag() {
        assert_eq!(Value::Int(-1).column_type(), ColumnType::Int);
        assert_eq!(Value::Uint(1).column_type(), ColumnType::Uint);
        assert_eq!(Value::Num(1.5).column_type(), ColumnType::Num);
        assert_eq!(Value::str("x").column_type(), ColumnType::Str);
    }

    #[test]
    fn test_join_eq_absent() {
        assert!(Value::join_eq(None, None));
        assert!(!Value::join_eq(None, Some(&Value::Int(0))));
        assert!(!Value::join_eq(Some(&Value::Uint(0)), None));
    }

    #[test]
    fn test_join_eq_sign_aware() {
        assert!(eq(&Value::Int(5), &Value::Uint(5)));
        assert!(eq(&Value::Uint(5), &Value::Int(5)));
        assert!(!eq(&Value::Int(-1), &Value::Uint(u64::MAX)));
        assert!(!eq(&Value::Uint(u64::MAX), &Value::Int(-1)));
        assert!(!eq(&Value::Int(4), &Value::Uint(5)));
    }

    #[test]
    fn test_join_eq_numeric_coercion() {
        assert!(eq(&Value::Int(-3), &Value::Num(-3.0)));
        assert!(eq(&Value::Num(2.0), &Value::Uint(2)));
        assert!(!eq(&Value::Num(2.5), &Value::Int(2)));
    }

    #[test]
    fn test_join_eq_text() {
        assert!(eq(&Value::str("x"), &Value::str("x")));
        assert!(!eq(&Value::str("x"), &Value::str("X")));
        assert!(!eq(&Value::str("1"), &Value::Int(1)));
        assert!(!eq(&Value::Uint(1), &Value::str("1")));
    }

    #[test]
    fn test_compare_across_types() {
        assert_eq!(
            Value::compare(&Value::Int(-1), &Value::Uint(0)),
            Some(Ordering::Less)
        );
        assert_eq!(
            Value::compare(&Value::Uint(u64::MAX), &Value::Int(i64::MAX)),
            Some(Ordering::Greater)
        );
        assert_eq!(
            Value::compare(&Value::Num(2.5), &Value::Int(2)),
            Some(Ordering::Greater)
        );
        assert_eq!(
            Value::compare(&Value::Uint(3), &Value::Num(3.0)),
            Some(Ordering::Equal)
        );
        assert_eq!(
            Value::compare(&Value::str("apple"), &Value::str("banana")),
            Some(Ordering::Less)
        );
    }

    #[test]
    fn test_compare_unordered() {
        assert_eq!(Value::compare(&Value::str("1"), &Value::Int(1)), None);
        assert_eq!(Value::compare(&Value::Num(f64::NAN), &Value::Num(f64::NAN)), None);
        assert!(!eq(&Value::Num(f64::NAN), &Value::Num(f64::NAN)));
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Int(-7).to_string(), "-7");
        assert_eq!(Value::Num(1.5).to_string(), "1.5");
        assert_eq!(Value::str("hi").to_string(), "hi");
    }
}
