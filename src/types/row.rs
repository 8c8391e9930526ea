use std::collections::HashMap;
use std::iter;

use tracing::warn;

use crate::error::{FetcherError, Result};

/// Rows as handed back by a connection, before they are keyed by column.
/// Values are rendered to text by the connection; `None` is SQL NULL.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawQueryResult {
    /// Column names in order
    pub columns: Vec<String>,
    /// Rows, each a vector of values in column order
    pub rows: Vec<Vec<Option<String>>>,
}

impl RawQueryResult {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Option<String>>>) -> Self {
        Self { columns, rows }
    }

    pub fn empty() -> Self {
        Self::default()
    }
}

/// A single result row, mapping column name to value.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    values: HashMap<String, Option<String>>,
}

impl Row {
    /// Keys `values` by `columns`. Every declared column is present: a
    /// short row is padded with NULL and surplus values are dropped.
    pub(crate) fn new(columns: &[String], values: Vec<Option<String>>) -> Self {
        if values.len() != columns.len() {
            warn!(
                columns = columns.len(),
                values = values.len(),
                "row width does not match column count"
            );
        }
        let values = columns
            .iter()
            .cloned()
            .zip(values.into_iter().chain(iter::repeat(None)))
            .collect();
        Self { values }
    }

    /// Gets a value by column name. `Ok(None)` means the column holds NULL.
    pub fn get(&self, column: &str) -> Result<Option<&str>> {
        self.values
            .get(column)
            .map(|v| v.as_deref())
            .ok_or_else(|| FetcherError::ColumnNotFound(column.to_string()))
    }

    /// Returns all column names in this row.
    pub fn columns(&self) -> Vec<&str> {
        self.values.keys().map(|s| s.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Ordered rows returned by a query.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl QueryResult {
    /// Keys every raw row by column name, keeping row order.
    pub fn from_raw(raw: RawQueryResult) -> Self {
        let rows = raw
            .rows
            .into_iter()
            .map(|values| Row::new(&raw.columns, values))
            .collect();
        Self {
            columns: raw.columns,
            rows,
        }
    }

    /// Extracts a single row from the result.
    /// Returns an error if the result contains zero or more than one row.
    pub fn single_row(self) -> Result<Row> {
        let actual = self.rows.len();
        let mut rows = self.rows.into_iter();
        match (rows.next(), rows.next()) {
            (Some(row), None) => Ok(row),
            _ => Err(FetcherError::UnexpectedRowCount {
                expected: 1,
                actual,
            }),
        }
    }

    pub fn rows(self) -> Vec<Row> {
        self.rows
    }

    pub fn rows_ref(&self) -> &[Row] {
        &self.rows
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
