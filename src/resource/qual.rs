//! Column qualifiers
//!
//! A qualifier is a predicate the query planner hands to a table on one
//! column. The table may push it down to the upstream API; the host always
//! re-checks it on the returned rows.

use super::registry::ColumnType;
use anyhow::{anyhow, Result};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Comparison operator of a qualifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    NotEq,
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operator::Eq => write!(f, "="),
            Operator::NotEq => write!(f, "<>"),
        }
    }
}

/// Typed qualifier value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QualValue {
    String(String),
    Int64(i64),
    Bool(bool),
    Cidr(String),
    List(Vec<QualValue>),
}

impl QualValue {
    /// Parse text into the value type a column expects
    pub fn parse(text: &str, column_type: ColumnType) -> Result<Self> {
        match column_type {
            ColumnType::String => Ok(QualValue::String(text.to_string())),
            ColumnType::Cidr => Ok(QualValue::Cidr(text.to_string())),
            ColumnType::Int => text
                .trim()
                .parse()
                .map(QualValue::Int64)
                .map_err(|_| anyhow!("'{}' is not an integer", text)),
            ColumnType::Bool => match text.trim().to_ascii_lowercase().as_str() {
                "true" | "t" => Ok(QualValue::Bool(true)),
                "false" | "f" => Ok(QualValue::Bool(false)),
                _ => Err(anyhow!("'{}' is not a boolean", text)),
            },
            ColumnType::Json => Err(anyhow!("json columns cannot be qualified")),
        }
    }

    /// Parse a right-hand side: `(a,b,...)` is a list, anything else a scalar
    pub fn parse_operand(text: &str, column_type: ColumnType) -> Result<Self> {
        let trimmed = text.trim();
        let Some(inner) = trimmed.strip_prefix('(').and_then(|t| t.strip_suffix(')')) else {
            return Self::parse(text, column_type);
        };
        let items = inner
            .split(',')
            .map(|item| Self::parse(item.trim(), column_type))
            .collect::<Result<Vec<_>>>()?;
        if items.iter().all(|item| item.as_str().is_some_and(str::is_empty)) {
            return Err(anyhow!("empty list"));
        }
        Ok(QualValue::List(items))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            QualValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Whether a column value equals this value (any element for a list)
    fn equals(&self, value: &Value) -> bool {
        match self {
            QualValue::String(s) | QualValue::Cidr(s) => value.as_str() == Some(s.as_str()),
            QualValue::Int64(n) => value.as_i64() == Some(*n),
            QualValue::Bool(b) => value.as_bool() == Some(*b),
            QualValue::List(items) => items.iter().any(|item| item.equals(value)),
        }
    }
}

/// Predicate on one column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Qual {
    pub operator: Operator,
    pub value: QualValue,
}

impl Qual {
    pub fn eq(value: QualValue) -> Self {
        Self {
            operator: Operator::Eq,
            value,
        }
    }

    pub fn not_eq(value: QualValue) -> Self {
        Self {
            operator: Operator::NotEq,
            value,
        }
    }

    /// Evaluate against a column value; null never satisfies a qualifier
    pub fn matches(&self, value: &Value) -> bool {
        if value.is_null() {
            return false;
        }
        match self.operator {
            Operator::Eq => self.value.equals(value),
            Operator::NotEq => !self.value.equals(value),
        }
    }
}

/// Qualifiers of one query, at most one per column
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyColumnQuals(BTreeMap<String, Qual>);

impl KeyColumnQuals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, column: &str, qual: Qual) {
        self.0.insert(column.to_string(), qual);
    }

    pub fn with(mut self, column: &str, qual: Qual) -> Self {
        self.insert(column, qual);
        self
    }

    pub fn get(&self, column: &str) -> Option<&Qual> {
        self.0.get(column)
    }

    /// String value of an equality qualifier
    pub fn eq_string(&self, column: &str) -> Option<&str> {
        self.get(column)
            .filter(|q| q.operator == Operator::Eq)
            .and_then(|q| q.value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Qual)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether a row satisfies every qualifier; a missing column fails
    pub fn matches_row(&self, row: &Map<String, Value>) -> bool {
        self.iter()
            .all(|(column, qual)| row.get(column).is_some_and(|v| qual.matches(v)))
    }
}

impl FromIterator<(String, Qual)> for KeyColumnQuals {
    fn from_iter<T: IntoIterator<Item = (String, Qual)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Split `column=value` / `column<>value` / `column!=value`
pub fn split_expression(expr: &str) -> Result<(&str, Operator, &str)> {
    for (token, op) in [("<>", Operator::NotEq), ("!=", Operator::NotEq), ("=", Operator::Eq)] {
        if let Some((column, value)) = expr.split_once(token) {
            let column = column.trim();
            if column.is_empty() {
                break;
            }
            return Ok((column, op, value.trim()));
        }
    }
    Err(anyhow!("expected column=value or column<>value, got '{}'", expr))
}
