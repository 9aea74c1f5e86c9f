//! Tabular data model shared by every stage.
//!
//! A `Table` is a list of named columns of equal length. Cells are loosely
//! typed `Value`s so the engine can hold datasets of unknown shape.

use crate::error::TableError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json};
use std::collections::HashSet;
use std::fmt;

/// A single cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    /// Missing means `Null` or a NaN float
    pub fn is_missing(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Float(f) => f.is_nan(),
            _ => false,
        }
    }

    /// Numeric view of the cell. Booleans count as 0/1, text is never numeric.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) if !f.is_nan() => Some(*f),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Float(_))
    }

    /// Lenient numeric coercion: numbers and booleans as-is, text parsed
    /// after trimming, anything else `None`.
    pub fn coerce_f64(&self) -> Option<f64> {
        match self {
            Value::Text(s) => s.trim().parse::<f64>().ok().filter(|f| !f.is_nan()),
            other => other.as_f64(),
        }
    }

    /// Infer a typed cell from a raw text field (CSV style).
    pub fn infer(raw: &str) -> Value {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Value::Null;
        }
        match trimmed {
            "true" | "True" | "TRUE" => return Value::Bool(true),
            "false" | "False" | "FALSE" => return Value::Bool(false),
            "NaN" | "nan" | "NULL" | "null" | "NA" => return Value::Null,
            _ => {}
        }
        if let Ok(i) = trimmed.parse::<i64>() {
            return Value::Int(i);
        }
        if let Ok(f) = trimmed.parse::<f64>() {
            return Value::Float(f);
        }
        Value::Text(raw.to_string())
    }

    fn from_json(value: &Json) -> Value {
        match value {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(*b),
            Json::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => n.as_f64().map(Value::Float).unwrap_or(Value::Null),
            },
            Json::String(s) => Value::Text(s.clone()),
            other => Value::Text(other.to_string()),
        }
    }

    fn to_json(&self) -> Json {
        match self {
            Value::Null => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Int(i) => Json::from(*i),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(Json::Number)
                .unwrap_or(Json::Null),
            Value::Text(s) => Json::String(s.clone()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, ""),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Text(s) => write!(f, "{}", s),
        }
    }
}

/// A named column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub values: Vec<Value>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Iterate only over non-missing cells
    pub fn present(&self) -> impl Iterator<Item = &Value> {
        self.values.iter().filter(|v| !v.is_missing())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Column-oriented table with unique names and equal column lengths
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<Column>,
}

impl Table {
    /// An empty table (zero columns)
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table, checking name uniqueness and length agreement
    pub fn from_columns(columns: Vec<Column>) -> Result<Self, TableError> {
        let mut seen = HashSet::new();
        let rows = columns.first().map(Column::len);
        for column in &columns {
            if !seen.insert(column.name.as_str()) {
                return Err(TableError::DuplicateColumn(column.name.clone()));
            }
            if let Some(expected) = rows {
                if column.len() != expected {
                    return Err(TableError::LengthMismatch {
                        column: column.name.clone(),
                        expected,
                        got: column.len(),
                    });
                }
            }
        }
        Ok(Self { columns })
    }

    /// Build a table from JSON objects. Column order follows first appearance
    /// across the records; absent keys become `Null`.
    pub fn from_records(records: &[Map<String, Json>]) -> Self {
        let mut names: Vec<String> = Vec::new();
        let mut seen = HashSet::new();
        for record in records {
            for key in record.keys() {
                if seen.insert(key.clone()) {
                    names.push(key.clone());
                }
            }
        }

        let columns = names
            .into_iter()
            .map(|name| {
                let values = records
                    .iter()
                    .map(|r| r.get(&name).map(Value::from_json).unwrap_or(Value::Null))
                    .collect();
                Column { name, values }
            })
            .collect();

        Self { columns }
    }

    /// Rows as JSON objects in column order
    pub fn to_records(&self) -> Vec<Map<String, Json>> {
        (0..self.num_rows())
            .map(|row| {
                self.columns
                    .iter()
                    .map(|c| (c.name.clone(), c.values[row].to_json()))
                    .collect()
            })
            .collect()
    }

    pub fn num_rows(&self) -> usize {
        self.columns.first().map(Column::len).unwrap_or(0)
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Case-insensitive lookup, first match in column order
    pub fn column_ci(&self, name: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Insert a column, replacing any column with the same name in place
    pub fn set_column(&mut self, column: Column) -> Result<(), TableError> {
        let position = self.columns.iter().position(|c| c.name == column.name);
        let others = self.columns.len() - usize::from(position.is_some());
        if others > 0 && column.len() != self.num_rows() {
            return Err(TableError::LengthMismatch {
                expected: self.num_rows(),
                got: column.len(),
                column: column.name,
            });
        }
        match position {
            Some(idx) => self.columns[idx] = column,
            None => self.columns.push(column),
        }
        Ok(())
    }

    pub fn rename(&mut self, from: &str, to: &str) -> Result<(), TableError> {
        if from == to {
            return self
                .column(from)
                .map(|_| ())
                .ok_or_else(|| TableError::UnknownColumn(from.to_string()));
        }
        if self.has_column(to) {
            return Err(TableError::DuplicateColumn(to.to_string()));
        }
        let column = self
            .columns
            .iter_mut()
            .find(|c| c.name == from)
            .ok_or_else(|| TableError::UnknownColumn(from.to_string()))?;
        column.name = to.to_string();
        Ok(())
    }

    /// Project onto `names` in the given order
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<Table, TableError> {
        let columns = names
            .iter()
            .map(|name| {
                self.column(name.as_ref())
                    .cloned()
                    .ok_or_else(|| TableError::UnknownColumn(name.as_ref().to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Table::from_columns(columns)
    }

    pub fn drop_columns<S: AsRef<str>>(&mut self, names: &[S]) -> Result<(), TableError> {
        for name in names {
            if !self.has_column(name.as_ref()) {
                return Err(TableError::UnknownColumn(name.as_ref().to_string()));
            }
        }
        self.columns
            .retain(|c| !names.iter().any(|n| n.as_ref() == c.name));
        Ok(())
    }

    /// Replace every missing cell with `fill`
    pub fn fill_missing(&mut self, fill: &Value) {
        for column in &mut self.columns {
            for value in &mut column.values {
                if value.is_missing() {
                    *value = fill.clone();
                }
            }
        }
    }

    /// Stable content hash over names and cells
    pub fn content_hash(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        for column in &self.columns {
            hasher.update(column.name.as_bytes());
            hasher.update(&[0]);
            for value in &column.values {
                let tag: u8 = match value {
                    Value::Null => 0,
                    Value::Bool(_) => 1,
                    Value::Int(_) => 2,
                    Value::Float(_) => 3,
                    Value::Text(_) => 4,
                };
                hasher.update(&[tag]);
                hasher.update(value.to_string().as_bytes());
                hasher.update(&[0]);
            }
        }
        format!("blake3:{}", hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Table {
        Table::from_columns(vec![
            Column::new("a", vec![Value::Int(1), Value::Null]),
            Column::new("b", vec![Value::Text("x".into()), Value::Float(2.5)]),
        ])
        .unwrap()
    }

    #[test]
    fn test_infer_cells() {
        assert_eq!(Value::infer(""), Value::Null);
        assert_eq!(Value::infer("42"), Value::Int(42));
        assert_eq!(Value::infer("4.5"), Value::Float(4.5));
        assert_eq!(Value::infer("True"), Value::Bool(true));
        assert_eq!(Value::infer("hello"), Value::Text("hello".into()));
    }

    #[test]
    fn test_from_columns_rejects_ragged() {
        let err = Table::from_columns(vec![
            Column::new("a", vec![Value::Int(1)]),
            Column::new("b", vec![]),
        ])
        .unwrap_err();
        assert!(matches!(err, TableError::LengthMismatch { .. }));
    }

    #[test]
    fn test_from_columns_rejects_duplicates() {
        let err = Table::from_columns(vec![
            Column::new("a", vec![Value::Int(1)]),
            Column::new("a", vec![Value::Int(2)]),
        ])
        .unwrap_err();
        assert!(matches!(err, TableError::DuplicateColumn(_)));
    }

    #[test]
    fn test_records_fill_absent_keys() {
        let records: Vec<Map<String, Json>> = vec![
            json!({"x": 1, "y": "a"}).as_object().unwrap().clone(),
            json!({"x": 2.5}).as_object().unwrap().clone(),
        ];
        let table = Table::from_records(&records);
        assert_eq!(table.column_names(), vec!["x", "y"]);
        assert_eq!(table.column("y").unwrap().values[1], Value::Null);
        assert_eq!(table.column("x").unwrap().values[1], Value::Float(2.5));
    }

    #[test]
    fn test_select_orders_and_rejects_unknown() {
        let table = sample();
        let projected = table.select(&["b", "a"]).unwrap();
        assert_eq!(projected.column_names(), vec!["b", "a"]);
        assert!(table.select(&["zzz"]).is_err());
    }

    #[test]
    fn test_rename_and_fill() {
        let mut table = sample();
        table.rename("a", "c").unwrap();
        assert!(table.has_column("c"));
        assert!(table.rename("c", "b").is_err());

        table.fill_missing(&Value::Int(0));
        assert_eq!(table.column("c").unwrap().values[1], Value::Int(0));
    }

    #[test]
    fn test_set_column_checks_length() {
        let mut table = sample();
        let err = table
            .set_column(Column::new("z", vec![Value::Int(1)]))
            .unwrap_err();
        assert_eq!(
            err,
            TableError::LengthMismatch {
                column: "z".into(),
                expected: 2,
                got: 1,
            }
        );
        table
            .set_column(Column::new("a", vec![Value::Int(7), Value::Int(8)]))
            .unwrap();
        assert_eq!(table.column_names(), vec!["a", "b"]);
    }

    #[test]
    fn test_content_hash_distinguishes_types() {
        let a = Table::from_columns(vec![Column::new("a", vec![Value::Int(1)])]).unwrap();
        let b = Table::from_columns(vec![Column::new("a", vec![Value::Text("1".into())])]).unwrap();
        assert_ne!(a.content_hash(), b.content_hash());
        assert_eq!(a.content_hash(), a.clone().content_hash());
    }
}
