//! Ingestion: CSV and JSON records into a `Table`.
//!
//! Cells are typed per field with `Value::infer`, so a column can hold a mix
//! of kinds the way a raw export usually does.

use serde_json::{Map, Value as Json};
use std::io::Read;
use tabforge_core::{Column, Table, TableError, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("record {row} has {got} fields, header has {expected}")]
    Ragged {
        row: usize,
        expected: usize,
        got: usize,
    },
    #[error("duplicate header '{0}'")]
    DuplicateHeader(String),
    #[error("expected a JSON array of objects")]
    NotRecords,
    #[error(transparent)]
    Table(TableError),
}

/// Read a headed CSV document
pub fn read_csv<R: Read>(reader: R) -> Result<Table, IngestError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.trim().to_string()).collect();
    let mut values: Vec<Vec<Value>> = vec![Vec::new(); headers.len()];

    for (row, record) in rdr.records().enumerate() {
        let record = record?;
        if record.len() != headers.len() {
            return Err(IngestError::Ragged {
                row,
                expected: headers.len(),
                got: record.len(),
            });
        }
        for (idx, field) in record.iter().enumerate() {
            values[idx].push(Value::infer(field));
        }
    }

    let columns = headers
        .into_iter()
        .zip(values)
        .map(|(name, values)| Column::new(name, values))
        .collect();
    Table::from_columns(columns).map_err(|e| match e {
        TableError::DuplicateColumn(name) => IngestError::DuplicateHeader(name),
        other => IngestError::Table(other),
    })
}

pub fn read_csv_str(content: &str) -> Result<Table, IngestError> {
    read_csv(content.as_bytes())
}

/// Accept a JSON array of flat objects
pub fn from_json(value: &Json) -> Result<Table, IngestError> {
    let array = value.as_array().ok_or(IngestError::NotRecords)?;
    let records: Vec<Map<String, Json>> = array
        .iter()
        .map(|v| v.as_object().cloned().ok_or(IngestError::NotRecords))
        .collect::<Result<_, _>>()?;
    Ok(Table::from_records(&records))
}
