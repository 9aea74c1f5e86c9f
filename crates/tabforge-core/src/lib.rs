//! Tabforge Core: table model, target schema and shared data model
//!
//! Everything the schema-transformation stages exchange lives here: the
//! loosely typed `Table`, the strongly typed `TargetFrame`, the classifier's
//! `SchemaProfile`, engine configuration and the stage trace.

pub mod config;
pub mod context;
pub mod data_model;
pub mod error;
pub mod schema;
pub mod table;
pub mod trace;

pub use config::{BreakerConfig, ClassifierConfig, EngineConfig, ProviderConfig, RetryConfig, SandboxConfig};
pub use context::TransformContext;
pub use data_model::{CodeOrigin, DataType, GeneratedCode, SchemaProfile};
pub use error::{ClassificationError, SchemaMismatch, TableError, TabforgeError};
pub use schema::{target_columns, FeatureMatrix, Label, TargetFrame, AMOUNT_COLUMN, FEATURE_COUNT, LABEL_COLUMN};
pub use table::{Column, Table, Value};
pub use trace::{StageProof, StageTrace};

/// Engine version
pub const TABFORGE_VERSION: &str = "1.0.0";
