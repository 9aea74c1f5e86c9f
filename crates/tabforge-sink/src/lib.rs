//! Tabforge Sink: relational persistence for transformed and raw tables.
//!
//! A sink provisions the destination table on first use (column types
//! inferred from the cell values, plus a surrogate `id` key) and then bulk
//! inserts every row in one transaction.

pub mod ddl;
pub mod sqlite;

pub use ddl::{column_sql_type, SqlType};
pub use sqlite::SqliteSink;

use std::collections::HashMap;
use tabforge_core::Table;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("SINK/invalid identifier '{0}'")]
    InvalidIdentifier(String),
    #[error("SINK/column '{0}' collides with another column after lowercasing")]
    DuplicateColumn(String),
    #[error("SINK/column name '{0}' is reserved for the surrogate key")]
    ReservedColumn(String),
    #[error("SINK/sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

pub trait TableSink: Send {
    /// Provision `name` if needed and append every row of `table`.
    /// Returns the number of rows written.
    fn persist(&mut self, name: &str, table: &Table) -> Result<usize, SinkError>;
}

/// In-process sink; tables are appended under their normalized name
#[derive(Debug, Default)]
pub struct MemorySink {
    tables: HashMap<String, Vec<Table>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn batches(&self, name: &str) -> &[Table] {
        self.tables.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn rows(&self, name: &str) -> usize {
        self.batches(name).iter().map(Table::num_rows).sum()
    }
}

impl TableSink for MemorySink {
    fn persist(&mut self, name: &str, table: &Table) -> Result<usize, SinkError> {
        let name = ddl::identifier(name)?;
        ddl::column_identifiers(table)?;
        let rows = table.num_rows();
        self.tables.entry(name.clone()).or_default().push(table.clone());
        info!(table = %name, rows, "table buffered in memory");
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabforge_core::{Column, Value};

    #[test]
    fn test_memory_sink_appends() {
        let table = Table::from_columns(vec![Column::new("V1", vec![Value::Float(1.0)])]).unwrap();
        let mut sink = MemorySink::new();
        sink.persist("Results", &table).unwrap();
        sink.persist("results", &table).unwrap();
        assert_eq!(sink.rows("results"), 2);
        assert_eq!(sink.batches("missing").len(), 0);
    }

    #[test]
    fn test_memory_sink_rejects_bad_names() {
        let table = Table::from_columns(vec![Column::new("x", vec![Value::Int(1)])]).unwrap();
        let err = MemorySink::new().persist("drop table;", &table).unwrap_err();
        assert!(err.to_string().starts_with("SINK/invalid identifier"));
    }
}
