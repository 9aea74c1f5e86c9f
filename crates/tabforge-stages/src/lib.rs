//! Tabforge Stages: fallback synthesis and the transformation orchestrator.
//!
//! # Pipeline Flow
//!
//! ```text
//! Table → classify → prompt → generate → execute → validate → TargetFrame
//!            │          └──────────┴─────────┴─────────┘
//!            │                    any failure
//!            ↓                         ↓
//!    ClassificationError           fallback → TargetFrame
//! ```
//!
//! Every stage the request visits is recorded as a `StageProof`.
//!
//! # Example
//!
//! ```
//! use tabforge_core::{Column, EngineConfig, Table, Value};
//! use tabforge_stages::TransformationOrchestrator;
//!
//! # tokio_test_run(async {
//! let table = Table::from_columns(vec![
//!     Column::new("amount", vec![Value::Float(12.0)]),
//!     Column::new("fraud", vec![Value::Int(1)]),
//! ]).unwrap();
//!
//! let orchestrator = TransformationOrchestrator::builder(EngineConfig::default()).build().unwrap();
//! let result = orchestrator.transform_offline(&table).await.unwrap();
//! assert_eq!(result.table().num_columns(), 30);
//! # });
//! # fn tokio_test_run<F: std::future::Future>(f: F) {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f);
//! # }
//! ```

pub mod capabilities;
pub mod fallback;
pub mod model;
pub mod orchestrator;
pub mod result;

pub use capabilities::{
    CodeExecutor, CodeSource, FallbackStrategy, PromptSelector, SchemaCheck, SchemaProfiler,
};
pub use fallback::FallbackSynthesizer;
pub use model::{score, FraudModel, ModelError, Scored};
pub use orchestrator::{OrchestratorBuilder, TransformationOrchestrator};
pub use result::{FallbackReason, LabelDistribution, TransformationResult};
