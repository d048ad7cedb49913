//! Table Registry - Load table definitions from JSON
//!
//! Table metadata (columns, key columns, filter mapping, error policy) is
//! declared in embedded JSON files and parsed once on first access. Behaviour
//! that cannot be expressed as data (transforms, hydrate calls) is bound in
//! Rust by [`super::table::Table::bind`].

use serde::Deserialize;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Embedded table JSON files (compiled into the binary)
const TABLE_FILES: &[&str] = &[include_str!("../resources/aws_vpc_subnet.json")];

/// Declared semantic type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    String,
    Int,
    Bool,
    Json,
    Cidr,
}

/// Column definition from JSON
#[derive(Debug, Clone, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    #[serde(default)]
    pub description: String,
}

/// Single-item lookup configuration
#[derive(Debug, Clone, Deserialize)]
pub struct GetDef {
    /// Column whose equality qualifier selects the get path
    pub key_column: String,
    /// Upstream error codes that mean "no such row" rather than failure
    #[serde(default)]
    pub ignore_error_codes: Vec<String>,
}

/// Filterable list key column
///
/// `value_type` stays textual here; it is checked when the table is bound so
/// an unknown tag is reported as a definition error instead of a parse panic.
#[derive(Debug, Clone, Deserialize)]
pub struct KeyColumnDef {
    pub name: String,
    pub filter_name: String,
    pub value_type: String,
}

fn default_max_results() -> i64 {
    1000
}

fn default_min_max_results() -> i64 {
    5
}

/// Paginated list configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ListDef {
    #[serde(default)]
    pub key_columns: Vec<KeyColumnDef>,
    /// Page size requested when the row budget does not shrink it
    #[serde(default = "default_max_results")]
    pub default_max_results: i64,
    /// Smallest page size the upstream accepts
    #[serde(default = "default_min_max_results")]
    pub min_max_results: i64,
}

/// Table definition from JSON
#[derive(Debug, Clone, Deserialize)]
pub struct TableDef {
    pub name: String,
    pub description: String,
    pub get: GetDef,
    pub list: ListDef,
    pub columns: Vec<ColumnDef>,
}

impl TableDef {
    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// Root structure of resources/*.json
#[derive(Debug, Clone, Deserialize)]
pub struct TableConfig {
    #[serde(default)]
    pub tables: Vec<TableDef>,
}

/// All registered tables
#[derive(Debug, Clone, Default)]
pub struct Registry {
    pub tables: HashMap<String, TableDef>,
}

/// Global registry loaded from JSON
static REGISTRY: OnceLock<Registry> = OnceLock::new();

/// Get the table registry (loads from embedded JSON on first access)
pub fn get_registry() -> &'static Registry {
    REGISTRY.get_or_init(|| {
        let mut registry = Registry::default();

        for content in TABLE_FILES {
            let partial: TableConfig = serde_json::from_str(content)
                .unwrap_or_else(|e| panic!("Failed to parse embedded table JSON: {}", e));
            for table in partial.tables {
                tracing::debug!("Registered table {}", table.name);
                registry.tables.insert(table.name.clone(), table);
            }
        }

        registry
    })
}

/// Get a table definition by name
pub fn get_table(name: &str) -> Option<&'static TableDef> {
    get_registry().tables.get(name)
}

/// Get all table names, sorted
pub fn get_all_table_names() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = get_registry()
        .tables
        .keys()
        .map(|s| s.as_str())
        .collect();
    names.sort_unstable();
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_loads_successfully() {
        let registry = get_registry();
        assert!(!registry.tables.is_empty(), "Registry should have tables");
    }

    #[test]
    fn test_subnet_table_exists() {
        let table = get_table("aws_vpc_subnet").expect("aws_vpc_subnet should be registered");
        assert_eq!(table.description, "AWS VPC Subnet");
        assert_eq!(table.get.key_column, "subnet_id");
        assert_eq!(
            table.get.ignore_error_codes,
            vec!["InvalidSubnetID.Malformed", "InvalidSubnetID.NotFound"]
        );
        assert_eq!(table.list.default_max_results, 1000);
        assert_eq!(table.list.min_max_results, 5);
    }

    #[test]
    fn test_subnet_filter_vocabulary() {
        let table = get_table("aws_vpc_subnet").unwrap();
        let names: Vec<&str> = table.list.key_columns.iter().map(|k| k.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "availability_zone",
                "availability_zone_id",
                "available_ip_address_count",
                "cidr_block",
                "default_for_az",
                "outpost_arn",
                "owner_id",
                "state",
                "subnet_arn",
                "vpc_id",
            ]
        );
    }

    #[test]
    fn test_get_all_table_names() {
        assert!(get_all_table_names().contains(&"aws_vpc_subnet"));
    }

    #[test]
    fn test_unknown_column_type_fails_to_parse() {
        let bad = r#"{"name": "x", "type": "uuid"}"#;
        assert!(serde_json::from_str::<ColumnDef>(bad).is_err());
    }
}
