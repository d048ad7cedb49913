//! Per-query state
//!
//! [`QueryData`] carries everything a hydrate call needs for one query: the
//! qualifiers, the row budget, the region, and the sink rows are streamed
//! into. It also tracks how many rows were streamed so list calls can stop
//! paginating as soon as the caller has enough. Rows a sink filters out do
//! not count toward the budget.

use super::qual::KeyColumnQuals;
use super::table::Table;
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;

/// One output row: column name to value, in column order
pub type Row = Map<String, Value>;

/// Fetched record tagged with the path that produced it
#[derive(Debug, Clone, PartialEq)]
pub enum Hydrated<R> {
    /// Element of a list page
    List(R),
    /// Result of a keyed get
    Get(R),
}

impl<R> Hydrated<R> {
    pub fn item(&self) -> &R {
        match self {
            Hydrated::List(item) | Hydrated::Get(item) => item,
        }
    }
}

/// Outcome of handing a row to a sink
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Row accepted; counts toward the budget
    Sent,
    /// Row rejected by the consumer; does not count
    Filtered,
    /// Consumer is gone; the query stops
    Closed,
}

/// Destination of streamed rows
pub trait RowSink {
    fn send_row(&mut self, row: Row) -> Delivery;
}

impl RowSink for Vec<Row> {
    fn send_row(&mut self, row: Row) -> Delivery {
        self.push(row);
        Delivery::Sent
    }
}

/// Re-checks qualifiers on every row before passing it on
///
/// Rows are built with the qualified columns as well as the requested ones;
/// the extra columns are dropped after the check.
pub struct QualFilter<'s> {
    quals: KeyColumnQuals,
    columns: Vec<String>,
    inner: &'s mut dyn RowSink,
}

impl<'s> QualFilter<'s> {
    /// `columns` is the caller's projection; empty means all
    pub fn new(quals: KeyColumnQuals, columns: Vec<String>, inner: &'s mut dyn RowSink) -> Self {
        Self {
            quals,
            columns,
            inner,
        }
    }

    /// Columns the rows must carry for the check to see every qualified column
    pub fn fetch_columns(&self) -> Vec<String> {
        let mut columns = self.columns.clone();
        if columns.is_empty() || self.quals.is_empty() {
            return columns;
        }
        for (column, _) in self.quals.iter() {
            if !columns.iter().any(|c| c == column) {
                columns.push(column.to_string());
            }
        }
        columns
    }
}

impl RowSink for QualFilter<'_> {
    fn send_row(&mut self, mut row: Row) -> Delivery {
        if !self.quals.matches_row(&row) {
            return Delivery::Filtered;
        }
        if !self.columns.is_empty() {
            row.retain(|column, _| self.columns.iter().any(|c| c == column));
        }
        self.inner.send_row(row)
    }
}

/// Caller-side context of a query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryContext {
    /// Columns to produce; empty means all
    pub columns: Vec<String>,
    /// Row budget for the whole query
    pub limit: Option<u64>,
}

/// Streamed-row accounting and cancellation
#[derive(Debug, Clone)]
pub struct QueryStatus {
    limit: Option<u64>,
    rows_streamed: u64,
    cancel: CancellationToken,
}

impl QueryStatus {
    pub fn new(limit: Option<u64>, cancel: CancellationToken) -> Self {
        Self {
            limit,
            rows_streamed: 0,
            cancel,
        }
    }

    /// Rows the caller still wants; zero once cancelled
    pub fn rows_remaining(&self) -> u64 {
        if self.cancel.is_cancelled() {
            return 0;
        }
        match self.limit {
            Some(limit) => limit.saturating_sub(self.rows_streamed),
            None => u64::MAX,
        }
    }

    pub fn rows_streamed(&self) -> u64 {
        self.rows_streamed
    }

    fn row_streamed(&mut self) {
        self.rows_streamed += 1;
    }

    fn cancel(&mut self) {
        self.cancel.cancel();
    }
}

/// Transform input for one column of one row
pub struct TransformData<'a, R> {
    pub hydrated: &'a Hydrated<R>,
    pub region: &'a str,
}

/// State of one query execution against a table
pub struct QueryData<'a, R> {
    table: &'a Table<R>,
    pub quals: KeyColumnQuals,
    pub context: QueryContext,
    pub region: String,
    status: QueryStatus,
    sink: &'a mut dyn RowSink,
}

impl<'a, R> QueryData<'a, R> {
    pub fn new(
        table: &'a Table<R>,
        quals: KeyColumnQuals,
        context: QueryContext,
        region: &str,
        sink: &'a mut dyn RowSink,
    ) -> Self {
        let status = QueryStatus::new(context.limit, CancellationToken::new());
        Self {
            table,
            quals,
            context,
            region: region.to_string(),
            status,
            sink,
        }
    }

    /// Share an external cancellation token (Ctrl-C, host shutdown)
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.status = QueryStatus::new(self.context.limit, cancel);
        self
    }

    pub fn table(&self) -> &'a Table<R> {
        self.table
    }

    /// Stream a record produced by the list path
    pub fn stream_list_item(&mut self, item: R) {
        self.stream(Hydrated::List(item));
    }

    /// Stream a record produced by the get path
    pub fn stream_get_item(&mut self, item: R) {
        self.stream(Hydrated::Get(item));
    }

    fn stream(&mut self, hydrated: Hydrated<R>) {
        if self.status.rows_remaining() == 0 {
            return;
        }

        let data = TransformData {
            hydrated: &hydrated,
            region: &self.region,
        };
        let row = self.table.build_row(&data, &self.context.columns);

        match self.sink.send_row(row) {
            Delivery::Sent => self.status.row_streamed(),
            Delivery::Filtered => {}
            Delivery::Closed => {
                tracing::debug!("Row sink closed, cancelling query on {}", self.table.def.name);
                self.status.cancel();
            }
        }
    }

    /// Remaining row budget after the rows streamed so far
    pub fn rows_remaining(&self) -> u64 {
        self.status.rows_remaining()
    }

    pub fn rows_streamed(&self) -> u64 {
        self.status.rows_streamed()
    }

    /// Equality string qualifier of a key column
    pub fn key_column_qual_string(&self, column: &str) -> Option<&str> {
        self.quals.eq_string(column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unlimited_budget() {
        let status = QueryStatus::new(None, CancellationToken::new());
        assert_eq!(status.rows_remaining(), u64::MAX);
    }

    #[test]
    fn test_budget_counts_down() {
        let mut status = QueryStatus::new(Some(2), CancellationToken::new());
        assert_eq!(status.rows_remaining(), 2);
        status.row_streamed();
        assert_eq!(status.rows_remaining(), 1);
        status.row_streamed();
        assert_eq!(status.rows_remaining(), 0);
        status.row_streamed();
        assert_eq!(status.rows_remaining(), 0);
    }

    #[test]
    fn test_cancellation_zeroes_budget() {
        let token = CancellationToken::new();
        let status = QueryStatus::new(None, token.clone());
        token.cancel();
        assert_eq!(status.rows_remaining(), 0);
    }

    fn row(state: &str, title: &str) -> Row {
        serde_json::json!({"subnet_id": "subnet-1", "state": state, "title": title})
            .as_object()
            .cloned()
            .unwrap()
    }

    #[test]
    fn test_qual_filter_rejects_without_forwarding() {
        let quals = KeyColumnQuals::new().with(
            "state",
            crate::resource::Qual::not_eq(crate::resource::QualValue::String("available".into())),
        );
        let mut rows = Vec::new();
        let mut filter = QualFilter::new(quals, Vec::new(), &mut rows);

        assert_eq!(filter.send_row(row("available", "a")), Delivery::Filtered);
        assert_eq!(filter.send_row(row("pending", "b")), Delivery::Sent);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["title"], "b");
    }

    #[test]
    fn test_qual_filter_projects_after_check() {
        let quals = KeyColumnQuals::new().with(
            "title",
            crate::resource::Qual::eq(crate::resource::QualValue::String("web".into())),
        );
        let mut rows = Vec::new();
        let mut filter = QualFilter::new(quals, vec!["subnet_id".to_string()], &mut rows);
        assert_eq!(
            filter.fetch_columns(),
            vec!["subnet_id".to_string(), "title".to_string()]
        );

        assert_eq!(filter.send_row(row("pending", "web")), Delivery::Sent);
        assert_eq!(filter.send_row(row("pending", "db")), Delivery::Filtered);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].keys().collect::<Vec<_>>(), vec!["subnet_id"]);
    }

    #[test]
    fn test_qual_filter_keeps_all_columns_without_projection() {
        let mut rows = Vec::new();
        let filter = QualFilter::new(KeyColumnQuals::new(), Vec::new(), &mut rows);
        assert!(filter.fetch_columns().is_empty());
    }

    #[test]
    fn test_hydrated_item() {
        assert_eq!(*Hydrated::List(3).item(), 3);
        assert_eq!(*Hydrated::Get("x").item(), "x");
    }
}
