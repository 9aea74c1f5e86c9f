//! Unified Error Model
use thiserror::Error;

/// Profiling failed; the only error that escapes `transform`
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClassificationError {
    #[error("input table has no columns")]
    EmptyInput,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TableError {
    #[error("duplicate column '{0}'")]
    DuplicateColumn(String),

    #[error("unknown column '{0}'")]
    UnknownColumn(String),

    #[error("column '{column}' has {got} rows, expected {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        got: usize,
    },
}

/// A table that cannot be turned into the target schema
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaMismatch {
    #[error("missing target columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("column '{column}' row {row}: non-numeric value '{value}'")]
    NonNumeric {
        column: String,
        row: usize,
        value: String,
    },

    #[error("label row {row}: '{value}' is not 0 or 1")]
    LabelOutOfDomain { row: usize, value: String },
}

#[derive(Error, Debug)]
pub enum TabforgeError {
    #[error("CLASSIFY/{0}")]
    Classification(#[from] ClassificationError),

    #[error("TABLE/{0}")]
    Table(#[from] TableError),

    #[error("SCHEMA/{0}")]
    Schema(#[from] SchemaMismatch),

    #[error("INGEST/{0}")]
    Ingest(String),

    #[error("SINK/{0}")]
    Sink(String),

    #[error("CONFIG/{0}")]
    Config(String),
}
