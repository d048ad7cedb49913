//! Table binding
//!
//! Joins a JSON [`TableDef`] with the Rust transforms of its record type and
//! checks the definition once, before any query runs. Everything a query
//! needs afterwards (filter mapping, error policy, column transforms) is
//! already compiled.

use super::filter::FilterKeyMap;
use super::qual::{split_expression, KeyColumnQuals, Qual, QualValue};
use super::query::{Row, TransformData};
use super::registry::{ColumnDef, TableDef};
use crate::aws::error::has_error_code;
use anyhow::{anyhow, bail, Result};
use serde_json::Value;
use std::collections::HashSet;
use thiserror::Error;

/// Computes one column value from a hydrated record
pub type TransformFn<R> = fn(&TransformData<'_, R>) -> Value;

/// Defect in a table definition, reported at registration
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DefinitionError {
    #[error("table '{0}' is not registered")]
    UnknownTable(String),

    #[error("column '{column}' is declared twice in table '{table}'")]
    DuplicateColumn { table: String, column: String },

    #[error("{role} '{column}' is not a column of table '{table}'")]
    UnknownColumn {
        table: String,
        column: String,
        role: &'static str,
    },

    #[error("filter on column '{column}' has unknown value type '{value_type}'")]
    UnknownFilterType { column: String, value_type: String },

    #[error("filter on column '{column}' is {filter:?} but the column is {column_type:?}")]
    FilterTypeMismatch {
        column: String,
        filter: String,
        column_type: String,
    },

    #[error("column '{column}' of table '{table}' has no transform")]
    MissingTransform { table: String, column: String },
}

/// Error policy of the get path
#[derive(Debug, Clone)]
pub struct GetConfig {
    pub key_column: String,
    pub ignore_error_codes: Vec<String>,
}

impl GetConfig {
    /// Whether a get error means "no such row" for this table
    pub fn should_ignore_error(&self, error: &anyhow::Error) -> bool {
        has_error_code(error, &self.ignore_error_codes)
    }
}

/// Bound, validated table over record type `R`
pub struct Table<R> {
    pub def: TableDef,
    pub get: GetConfig,
    pub filter_map: Vec<FilterKeyMap>,
    columns: Vec<(ColumnDef, TransformFn<R>)>,
}

impl<R> std::fmt::Debug for Table<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Table")
            .field("name", &self.def.name)
            .field("columns", &self.columns.len())
            .field("filter_map", &self.filter_map)
            .finish()
    }
}

impl<R> Table<R> {
    /// Validate a definition and bind a transform to every column
    pub fn bind(
        def: TableDef,
        resolve: impl Fn(&str) -> Option<TransformFn<R>>,
    ) -> Result<Self, DefinitionError> {
        let mut seen = HashSet::new();
        for column in &def.columns {
            if !seen.insert(column.name.as_str()) {
                return Err(DefinitionError::DuplicateColumn {
                    table: def.name.clone(),
                    column: column.name.clone(),
                });
            }
        }

        let unknown = |column: &str, role: &'static str| DefinitionError::UnknownColumn {
            table: def.name.clone(),
            column: column.to_string(),
            role,
        };

        if def.column(&def.get.key_column).is_none() {
            return Err(unknown(&def.get.key_column, "get key column"));
        }

        let mut filter_map = Vec::with_capacity(def.list.key_columns.len());
        for key in &def.list.key_columns {
            let Some(column) = def.column(&key.name) else {
                return Err(unknown(&key.name, "list key column"));
            };
            let mapping = FilterKeyMap::from_def(key)?;
            if mapping.value_type.column_type() != column.column_type {
                return Err(DefinitionError::FilterTypeMismatch {
                    column: key.name.clone(),
                    filter: key.value_type.clone(),
                    column_type: format!("{:?}", column.column_type).to_lowercase(),
                });
            }
            filter_map.push(mapping);
        }

        let mut columns = Vec::with_capacity(def.columns.len());
        for column in &def.columns {
            let Some(transform) = resolve(&column.name) else {
                return Err(DefinitionError::MissingTransform {
                    table: def.name.clone(),
                    column: column.name.clone(),
                });
            };
            columns.push((column.clone(), transform));
        }

        let get = GetConfig {
            key_column: def.get.key_column.clone(),
            ignore_error_codes: def.get.ignore_error_codes.clone(),
        };

        tracing::debug!(
            "Bound table {} ({} columns, {} filters)",
            def.name,
            columns.len(),
            filter_map.len()
        );

        Ok(Self {
            def,
            get,
            filter_map,
            columns,
        })
    }

    pub fn column_defs(&self) -> impl Iterator<Item = &ColumnDef> {
        self.columns.iter().map(|(def, _)| def)
    }

    /// Build a row with the requested columns (all when empty)
    ///
    /// Unknown requested columns are skipped; the host validates projections.
    pub fn build_row(&self, data: &TransformData<'_, R>, requested: &[String]) -> Row {
        self.columns
            .iter()
            .filter(|(def, _)| requested.is_empty() || requested.iter().any(|c| c == &def.name))
            .map(|(def, transform)| (def.name.clone(), transform(data)))
            .collect()
    }

    /// Parse `column=value` / `column<>value` expressions into typed qualifiers
    ///
    /// At most one qualifier per column. `column=(a,b)` matches any listed value.
    pub fn parse_quals(&self, expressions: &[String]) -> Result<KeyColumnQuals> {
        let mut quals = KeyColumnQuals::new();
        for expr in expressions {
            let (column, operator, text) = split_expression(expr)?;
            let def = self
                .def
                .column(column)
                .ok_or_else(|| anyhow!("unknown column '{}' in '{}'", column, expr))?;
            if quals.get(column).is_some() {
                bail!("column '{}' is qualified more than once", column);
            }
            let value = QualValue::parse_operand(text, def.column_type)
                .map_err(|e| anyhow!("{} in '{}'", e, expr))?;
            quals.insert(column, Qual { operator, value });
        }
        Ok(quals)
    }

    /// Check a projection against the declared columns
    pub fn check_columns(&self, requested: &[String]) -> Result<()> {
        match requested.iter().find(|c| self.def.column(c).is_none()) {
            Some(unknown) => Err(anyhow!(
                "unknown column '{}' (table {} has: {})",
                unknown,
                self.def.name,
                self.column_defs().map(|c| c.name.as_str()).collect::<Vec<_>>().join(", ")
            )),
            None => Ok(()),
        }
    }

    /// Page size for a row budget
    ///
    /// Small budgets shrink the page, never below the upstream minimum.
    pub fn page_size_for_limit(&self, limit: Option<u64>) -> i64 {
        page_size_for_limit(limit, self.def.list.default_max_results, self.def.list.min_max_results)
    }
}

pub fn page_size_for_limit(limit: Option<u64>, default_max: i64, min_max: i64) -> i64 {
    match limit {
        Some(limit) if limit < default_max as u64 => (limit as i64).max(min_max),
        _ => default_max,
    }
}

/// Look up a registered definition by name
pub fn registered(name: &str) -> Result<TableDef, DefinitionError> {
    super::registry::get_table(name)
        .cloned()
        .ok_or_else(|| DefinitionError::UnknownTable(name.to_string()))
}
