//! Row filters for `--where`.
//!
//! A filter is written as a SQL boolean expression over column names:
//!
//! ```text
//! age >= 18 AND (name = 'ann' OR name = 'bob')
//! posts.user_id <> 3
//! note IS NULL
//! ```
//!
//! Each comparison is `COLUMN OP VALUE` with `=`, `<>` (or `!=`), `<`, `>`,
//! `<=`, `>=`. Comparisons combine with `AND` and `OR` and may be nested in
//! parentheses. Literals are untyped: integers, decimals, `'text'`, and
//! `NULL`. They are compared with the stored value under the same
//! cross-type rules the join engine uses, so `score > 3` works on a num
//! column and `id = 7` on an int or uint column.

use std::cmp::Ordering;
use std::str::FromStr;

use anyhow::{anyhow, bail, Result};
use chaindb_common::types::Value;
use sqlparser::ast as sql_ast;
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser as SqlParser;
use sqlparser::tokenizer::Token;

/// Comparison operator of a filter leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// Equal.
    Eq,
    /// Not equal.
    NotEq,
    /// Less than.
    Lt,
    /// Greater than.
    Gt,
    /// Less than or equal.
    LtEq,
    /// Greater than or equal.
    GtEq,
}

impl CompareOp {
    fn from_sql_ast(op: &sql_ast::BinaryOperator) -> Option<Self> {
        match op {
            sql_ast::BinaryOperator::Eq => Some(Self::Eq),
            sql_ast::BinaryOperator::NotEq => Some(Self::NotEq),
            sql_ast::BinaryOperator::Lt => Some(Self::Lt),
            sql_ast::BinaryOperator::Gt => Some(Self::Gt),
            sql_ast::BinaryOperator::LtEq => Some(Self::LtEq),
            sql_ast::BinaryOperator::GtEq => Some(Self::GtEq),
            _ => None,
        }
    }

    /// Applies the operator to a stored value and a literal.
    ///
    /// Equality treats absent as a value of its own; ordering never holds
    /// when either side is absent or the two cannot be ordered.
    pub fn eval(self, stored: Option<&Value>, literal: Option<&Value>) -> bool {
        match self {
            Self::Eq => Value::join_eq(stored, literal),
            Self::NotEq => !Value::join_eq(stored, literal),
            Self::Lt | Self::Gt | Self::LtEq | Self::GtEq => {
                let (Some(stored), Some(literal)) = (stored, literal) else {
                    return false;
                };
                let Some(ordering) = Value::compare(stored, literal) else {
                    return false;
                };
                match self {
                    Self::Lt => ordering == Ordering::Less,
                    Self::Gt => ordering == Ordering::Greater,
                    Self::LtEq => ordering != Ordering::Greater,
                    _ => ordering != Ordering::Less,
                }
            }
        }
    }
}

/// A parsed `--where` expression over column names.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// `column op value`; `None` is the `NULL` literal.
    Compare {
        /// Column name, optionally `table.column`.
        column: String,
        /// Operator.
        op: CompareOp,
        /// Literal on the right-hand side.
        value: Option<Value>,
    },
    /// Both sides hold.
    And(Box<Condition>, Box<Condition>),
    /// Either side holds.
    Or(Box<Condition>, Box<Condition>),
}

impl FromStr for Condition {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let dialect = GenericDialect {};
        let mut parser = SqlParser::new(&dialect)
            .try_with_sql(s)
            .map_err(|e| anyhow!("invalid filter '{s}': {e}"))?;
        let expr = parser
            .parse_expr()
            .and_then(|expr| parser.expect_token(&Token::EOF).map(|()| expr))
            .map_err(|e| anyhow!("invalid filter '{s}': {e}"))?;
        Self::from_sql_ast(expr)
    }
}

impl Condition {
    fn from_sql_ast(expr: sql_ast::Expr) -> Result<Self> {
        match expr {
            sql_ast::Expr::Nested(inner) => Self::from_sql_ast(*inner),
            sql_ast::Expr::BinaryOp { left, op, right } => match op {
                sql_ast::BinaryOperator::And => Ok(Self::And(
                    Box::new(Self::from_sql_ast(*left)?),
                    Box::new(Self::from_sql_ast(*right)?),
                )),
                sql_ast::BinaryOperator::Or => Ok(Self::Or(
                    Box::new(Self::from_sql_ast(*left)?),
                    Box::new(Self::from_sql_ast(*right)?),
                )),
                other => {
                    let op = CompareOp::from_sql_ast(&other)
                        .ok_or_else(|| anyhow!("unsupported operator {other}"))?;
                    Ok(Self::Compare {
                        column: column_name(*left)?,
                        op,
                        value: literal(*right)?,
                    })
                }
            },
            sql_ast::Expr::IsNull(inner) => Ok(Self::Compare {
                column: column_name(*inner)?,
                op: CompareOp::Eq,
                value: None,
            }),
            sql_ast::Expr::IsNotNull(inner) => Ok(Self::Compare {
                column: column_name(*inner)?,
                op: CompareOp::NotEq,
                value: None,
            }),
            other => bail!("expected a comparison, got '{other}'"),
        }
    }

    /// Resolves column names to indices with `lookup`.
    pub fn bind(&self, lookup: &impl Fn(&str) -> Option<usize>) -> Result<Predicate> {
        Ok(match self {
            Self::Compare { column, op, value } => Predicate::Compare {
                index: lookup(column).ok_or_else(|| anyhow!("unknown column '{column}'"))?,
                op: *op,
                value: value.clone(),
            },
            Self::And(left, right) => {
                Predicate::And(Box::new(left.bind(lookup)?), Box::new(right.bind(lookup)?))
            }
            Self::Or(left, right) => {
                Predicate::Or(Box::new(left.bind(lookup)?), Box::new(right.bind(lookup)?))
            }
        })
    }
}

/// A [`Condition`] with column names resolved to value indices.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Compares the value at `index` with a literal.
    Compare {
        /// Index into the row's values.
        index: usize,
        /// Operator.
        op: CompareOp,
        /// Literal on the right-hand side.
        value: Option<Value>,
    },
    /// Both sides hold.
    And(Box<Predicate>, Box<Predicate>),
    /// Either side holds.
    Or(Box<Predicate>, Box<Predicate>),
}

impl Predicate {
    /// Evaluates the predicate against one row's values.
    pub fn matches(&self, values: &[Option<Value>]) -> bool {
        match self {
            Self::Compare { index, op, value } => {
                let stored = values.get(*index).and_then(Option::as_ref);
                op.eval(stored, value.as_ref())
            }
            Self::And(left, right) => left.matches(values) && right.matches(values),
            Self::Or(left, right) => left.matches(values) || right.matches(values),
        }
    }
}

fn column_name(expr: sql_ast::Expr) -> Result<String> {
    match expr {
        sql_ast::Expr::Identifier(ident) => Ok(ident.value),
        sql_ast::Expr::CompoundIdentifier(idents) if idents.len() == 2 => {
            Ok(format!("{}.{}", idents[0].value, idents[1].value))
        }
        other => bail!("expected a column name, got '{other}'"),
    }
}

fn literal(expr: sql_ast::Expr) -> Result<Option<Value>> {
    match expr {
        sql_ast::Expr::Value(sql_ast::Value::Null) => Ok(None),
        sql_ast::Expr::Value(sql_ast::Value::Number(n, _)) => number(&n).map(Some),
        sql_ast::Expr::Value(
            sql_ast::Value::SingleQuotedString(s) | sql_ast::Value::DoubleQuotedString(s),
        ) => Ok(Some(Value::Str(s))),
        sql_ast::Expr::UnaryOp {
            op: sql_ast::UnaryOperator::Minus,
            expr,
        } => match *expr {
            sql_ast::Expr::Value(sql_ast::Value::Number(n, _)) => {
                number(&format!("-{n}")).map(Some)
            }
            other => bail!("cannot negate '{other}'"),
        },
        other => bail!("expected a literal value, got '{other}'"),
    }
}

/// Integers become int, or uint past `i64::MAX`; anything else is a num.
fn number(text: &str) -> Result<Value> {
    if let Ok(v) = text.parse::<i64>() {
        Ok(Value::Int(v))
    } else if let Ok(v) = text.parse::<u64>() {
        Ok(Value::Uint(v))
    } else {
        text.parse::<f64>()
            .map(Value::Num)
            .map_err(|_| anyhow!("invalid number '{text}'"))
    }
}
