//! SQLite implementation of [`TableSink`].

use crate::ddl::{column_identifiers, create_table_sql, identifier, insert_sql, quoted};
use crate::{SinkError, TableSink};
use rusqlite::types::Value as SqlValue;
use rusqlite::{params_from_iter, Connection};
use std::path::Path;
use tabforge_core::{Table, Value};
use tracing::{debug, info};

pub struct SqliteSink {
    conn: Connection,
}

impl SqliteSink {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SinkError> {
        let conn = Connection::open(path.as_ref())?;
        info!(path = %path.as_ref().display(), "sqlite sink opened");
        Ok(Self { conn })
    }

    pub fn in_memory() -> Result<Self, SinkError> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn row_count(&self, name: &str) -> Result<usize, SinkError> {
        let name = identifier(name)?;
        let count: i64 = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {}", quoted(&name)), [], |row| row.get(0))?;
        Ok(count.max(0) as usize)
    }
}

fn sql_value(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Int(i) => SqlValue::Integer(*i),
        Value::Float(f) if f.is_nan() => SqlValue::Null,
        Value::Float(f) => SqlValue::Real(*f),
        Value::Text(s) => SqlValue::Text(s.clone()),
    }
}

impl TableSink for SqliteSink {
    fn persist(&mut self, name: &str, table: &Table) -> Result<usize, SinkError> {
        let name = identifier(name)?;
        let columns = column_identifiers(table)?;

        let create = create_table_sql(&name, table, &columns);
        debug!(sql = %create, "provisioning table");
        self.conn.execute(&create, [])?;

        let insert = insert_sql(&name, &columns);
        let rows = table.num_rows();
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(&insert)?;
            for row in 0..rows {
                let params = table.columns().iter().map(|c| sql_value(&c.values[row]));
                stmt.execute(params_from_iter(params))?;
            }
        }
        tx.commit()?;

        info!(table = %name, rows, "rows persisted");
        Ok(rows)
    }
}
