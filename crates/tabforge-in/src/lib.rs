//! Tabforge-IN: ingestion and schema classification
//!
//! Turns raw tabular input into a `Table` and profiles it:
//! - CSV / JSON record ingestion with per-cell type inference
//! - column role assignment (text, categorical, numerical, boolean)
//! - target column detection
//! - coarse dataset category (job postings, financial, ...)
//!
//! # Example
//!
//! ```
//! use tabforge_in::{ingest, SchemaClassifier};
//! use tabforge_core::DataType;
//!
//! let table = ingest::read_csv_str("job_id,title,fraudulent\nj1,Engineer,0\n").unwrap();
//! let profile = SchemaClassifier::default().classify(&table).unwrap();
//! assert_eq!(profile.data_type, DataType::JobPostings);
//! assert_eq!(profile.target_column.as_deref(), Some("fraudulent"));
//! ```

pub mod classifier;
pub mod ingest;
pub mod patterns;

pub use classifier::{ColumnRole, SchemaClassifier};
pub use ingest::IngestError;
