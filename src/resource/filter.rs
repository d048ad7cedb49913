//! Filter pushdown
//!
//! Translates column qualifiers into upstream filter parameters using the
//! declarative key-column mapping of a table.

use super::qual::{KeyColumnQuals, Operator, Qual, QualValue};
use super::registry::{ColumnType, KeyColumnDef};
use super::table::DefinitionError;
use std::str::FromStr;

/// Value type of a filterable column, each with its own coercion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterValueType {
    String,
    Int64,
    Boolean,
    Cidr,
}

impl FromStr for FilterValueType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "string" => Ok(FilterValueType::String),
            "int64" => Ok(FilterValueType::Int64),
            "boolean" => Ok(FilterValueType::Boolean),
            "cidr" => Ok(FilterValueType::Cidr),
            other => Err(other.to_string()),
        }
    }
}

impl FilterValueType {
    /// Column type a filter of this kind can be attached to
    pub fn column_type(self) -> ColumnType {
        match self {
            FilterValueType::String => ColumnType::String,
            FilterValueType::Int64 => ColumnType::Int,
            FilterValueType::Boolean => ColumnType::Bool,
            FilterValueType::Cidr => ColumnType::Cidr,
        }
    }

    /// Upstream values for a qualifier, or `None` if it cannot be pushed down
    pub fn coerce(self, qual: &Qual) -> Option<Vec<String>> {
        match (self, qual.operator, &qual.value) {
            // Values of one filter are OR-ed upstream
            (_, Operator::Eq, QualValue::List(values)) => {
                let mut coerced = Vec::with_capacity(values.len());
                for value in values {
                    coerced.extend(self.coerce(&Qual::eq(value.clone()))?);
                }
                Some(coerced).filter(|v| !v.is_empty())
            }
            (FilterValueType::String, Operator::Eq, QualValue::String(s)) => Some(vec![s.clone()]),
            (FilterValueType::Int64, Operator::Eq, QualValue::Int64(n)) => Some(vec![n.to_string()]),
            (FilterValueType::Boolean, Operator::Eq, QualValue::Bool(b)) => Some(vec![b.to_string()]),
            (FilterValueType::Boolean, Operator::NotEq, QualValue::Bool(b)) => {
                Some(vec![(!b).to_string()])
            }
            (FilterValueType::Cidr, Operator::Eq, QualValue::Cidr(c) | QualValue::String(c)) => {
                Some(vec![c.clone()])
            }
            _ => None,
        }
    }
}

/// Compiled mapping from a column to an upstream filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterKeyMap {
    pub column_name: String,
    pub filter_name: String,
    pub value_type: FilterValueType,
}

impl FilterKeyMap {
    pub fn from_def(def: &KeyColumnDef) -> Result<Self, DefinitionError> {
        let value_type = def
            .value_type
            .parse()
            .map_err(|value_type| DefinitionError::UnknownFilterType {
                column: def.name.clone(),
                value_type,
            })?;

        Ok(Self {
            column_name: def.name.clone(),
            filter_name: def.filter_name.clone(),
            value_type,
        })
    }
}

/// Filter sent to the upstream API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamFilter {
    pub name: String,
    pub values: Vec<String>,
}

impl UpstreamFilter {
    pub fn new(name: &str, values: Vec<String>) -> Self {
        Self {
            name: name.to_string(),
            values,
        }
    }
}

/// Build upstream filters for the qualifiers present
///
/// Output follows mapping order. Columns outside the mapping are ignored.
pub fn translate(quals: &KeyColumnQuals, mapping: &[FilterKeyMap]) -> Vec<UpstreamFilter> {
    mapping
        .iter()
        .filter_map(|key| {
            let qual = quals.get(&key.column_name)?;
            match key.value_type.coerce(qual) {
                Some(values) => Some(UpstreamFilter::new(&key.filter_name, values)),
                None => {
                    tracing::warn!(
                        "Cannot push down {} {} {:?} as {:?} filter",
                        key.column_name,
                        qual.operator,
                        qual.value,
                        key.value_type
                    );
                    None
                }
            }
        })
        .collect()
}
