//! Table provisioning: identifiers, column type inference, SQL text.

use crate::SinkError;
use std::collections::HashSet;
use std::fmt;
use tabforge_core::{Column, Table, Value};

pub const SURROGATE_KEY: &str = "id";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    Integer,
    Real,
    Boolean,
    Text,
}

impl SqlType {
    pub fn as_str(self) -> &'static str {
        match self {
            SqlType::Integer => "INTEGER",
            SqlType::Real => "REAL",
            SqlType::Boolean => "BOOLEAN",
            SqlType::Text => "TEXT",
        }
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Type from the kinds of the present cells. Ints mixed with floats widen to
/// REAL; any text, any other mix, or no present cell at all is TEXT.
pub fn column_sql_type(column: &Column) -> SqlType {
    let mut kinds = column.present().map(|v| match v {
        Value::Bool(_) => SqlType::Boolean,
        Value::Int(_) => SqlType::Integer,
        Value::Float(_) => SqlType::Real,
        _ => SqlType::Text,
    });
    let Some(first) = kinds.next() else {
        return SqlType::Text;
    };
    kinds.fold(first, |acc, kind| match (acc, kind) {
        (a, b) if a == b => a,
        (SqlType::Integer, SqlType::Real) | (SqlType::Real, SqlType::Integer) => SqlType::Real,
        _ => SqlType::Text,
    })
}

/// Lowercased `[a-z_][a-z0-9_]*`
pub fn identifier(name: &str) -> Result<String, SinkError> {
    let lowered = name.trim().to_lowercase();
    let mut chars = lowered.chars();
    let valid = matches!(chars.next(), Some(c) if c.is_ascii_lowercase() || c == '_')
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if valid {
        Ok(lowered)
    } else {
        Err(SinkError::InvalidIdentifier(name.to_string()))
    }
}

/// Double-quoted so keywords like `order` stay usable as names
pub fn quoted(ident: &str) -> String {
    format!("\"{ident}\"")
}

pub fn column_identifiers(table: &Table) -> Result<Vec<String>, SinkError> {
    let mut seen = HashSet::new();
    table
        .columns()
        .iter()
        .map(|c| {
            let ident = identifier(&c.name)?;
            if ident == SURROGATE_KEY {
                return Err(SinkError::ReservedColumn(c.name.clone()));
            }
            if !seen.insert(ident.clone()) {
                return Err(SinkError::DuplicateColumn(c.name.clone()));
            }
            Ok(ident)
        })
        .collect()
}

pub fn create_table_sql(name: &str, table: &Table, columns: &[String]) -> String {
    let mut defs = vec![format!("{} INTEGER PRIMARY KEY AUTOINCREMENT", quoted(SURROGATE_KEY))];
    defs.extend(
        table
            .columns()
            .iter()
            .zip(columns)
            .map(|(column, ident)| format!("{} {}", quoted(ident), column_sql_type(column))),
    );
    format!("CREATE TABLE IF NOT EXISTS {} ({})", quoted(name), defs.join(", "))
}

pub fn insert_sql(name: &str, columns: &[String]) -> String {
    let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{i}")).collect();
    let names: Vec<String> = columns.iter().map(|c| quoted(c)).collect();
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quoted(name),
        names.join(", "),
        placeholders.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn col(values: Vec<Value>) -> Column {
        Column::new("c", values)
    }

    #[test]
    fn test_column_types() {
        assert_eq!(column_sql_type(&col(vec![Value::Int(1), Value::Null])), SqlType::Integer);
        assert_eq!(column_sql_type(&col(vec![Value::Int(1), Value::Float(0.5)])), SqlType::Real);
        assert_eq!(column_sql_type(&col(vec![Value::Bool(true)])), SqlType::Boolean);
        assert_eq!(column_sql_type(&col(vec![Value::Bool(true), Value::Int(1)])), SqlType::Text);
        assert_eq!(column_sql_type(&col(vec![Value::Text("a".into())])), SqlType::Text);
        assert_eq!(column_sql_type(&col(vec![Value::Null])), SqlType::Text);
    }

    #[test]
    fn test_identifiers() {
        assert_eq!(identifier("Amount").unwrap(), "amount");
        assert_eq!(identifier("_v1").unwrap(), "_v1");
        assert!(identifier("1abc").is_err());
        assert!(identifier("a-b").is_err());
        assert!(identifier("").is_err());
    }

    #[test]
    fn test_reserved_and_colliding_columns() {
        let reserved = Table::from_columns(vec![Column::new("ID", vec![])]).unwrap();
        assert!(matches!(column_identifiers(&reserved), Err(SinkError::ReservedColumn(_))));

        let clash = Table::from_columns(vec![
            Column::new("Amount", vec![]),
            Column::new("amount", vec![]),
        ])
        .unwrap();
        assert!(matches!(column_identifiers(&clash), Err(SinkError::DuplicateColumn(_))));
    }

    #[test]
    fn test_sql_text() {
        let table = Table::from_columns(vec![
            Column::new("V1", vec![Value::Float(1.0)]),
            Column::new("label", vec![Value::Int(0)]),
        ])
        .unwrap();
        let columns = column_identifiers(&table).unwrap();
        assert_eq!(
            create_table_sql("results", &table, &columns),
            r#"CREATE TABLE IF NOT EXISTS "results" ("id" INTEGER PRIMARY KEY AUTOINCREMENT, "v1" REAL, "label" INTEGER)"#
        );
        assert_eq!(
            insert_sql("results", &columns),
            r#"INSERT INTO "results" ("v1", "label") VALUES (?1, ?2)"#
        );
    }
}
