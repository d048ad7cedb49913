//! Resource table layer
//!
//! Tables are described by JSON definitions compiled into the binary and
//! bound to Rust transforms at startup. A query hands a table its qualifiers
//! and row budget; the table pushes what it can down to the upstream API and
//! streams rows into a sink.
//!
//! # Architecture
//!
//! - [`registry`] - Loads and caches table definitions from embedded JSON
//! - [`table`] - Validates a definition and binds column transforms
//! - [`qual`] - Column qualifiers handed over by the caller
//! - [`filter`] - Translates qualifiers into upstream filters
//! - [`query`] - Per-query state: budget, cancellation, row sink
//! - [`subnet`] - The `aws_vpc_subnet` table
//!
//! # Example
//!
//! ```ignore
//! use ec2_subnets::aws::Ec2Client;
//! use ec2_subnets::resource::{subnet, KeyColumnQuals, QueryContext, QueryData, Row};
//!
//! async fn all_subnets(client: &Ec2Client) -> anyhow::Result<Vec<Row>> {
//!     let table = subnet::subnet_table()?;
//!     let mut rows = Vec::new();
//!     let mut d = QueryData::new(&table, KeyColumnQuals::new(), QueryContext::default(), &client.region, &mut rows);
//!     subnet::execute(client, &mut d).await?;
//!     Ok(rows)
//! }
//! ```

pub mod filter;
pub mod qual;
pub mod query;
pub mod registry;
pub mod subnet;
pub mod table;

pub use filter::{translate, FilterKeyMap, FilterValueType, UpstreamFilter};
pub use qual::{split_expression, KeyColumnQuals, Operator, Qual, QualValue};
pub use query::{
    Delivery, Hydrated, QualFilter, QueryContext, QueryData, Row, RowSink, TransformData,
};
pub use registry::{get_all_table_names, get_registry, get_table, ColumnDef, ColumnType, TableDef};
pub use table::{DefinitionError, GetConfig, Table, TransformFn};
