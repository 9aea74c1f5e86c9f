//! tabforge-sandbox: run generated transformation programs safely.
//!
//! Programs are written in a small table language (see `dsl.pest`) bound to
//! the working table `df`. The language has no filesystem, network, process
//! or import facility; the only callable functions are the [`Primitive`]s.
//! Every failure, including a parse error, comes back as
//! [`ExecutionOutcome::Failed`].

pub mod ast;
pub mod interpreter;
pub mod parser;

pub use ast::{Primitive, Program};
pub use interpreter::Interpreter;
pub use parser::parse_program;

use std::panic::{catch_unwind, AssertUnwindSafe};
use tabforge_core::{SandboxConfig, Table, TableError};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExecutionError {
    #[error("EXEC/parse: {0}")]
    Parse(String),
    #[error("EXEC/unknown primitive '{0}'")]
    UnknownPrimitive(String),
    #[error("EXEC/{name} takes {expected} argument(s), got {got}")]
    Arity {
        name: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("EXEC/unknown column '{0}'")]
    UnknownColumn(String),
    #[error("EXEC/type: {0}")]
    Type(String),
    #[error("EXEC/program has {got} statements, limit is {limit}")]
    TooManyStatements { got: usize, limit: usize },
    #[error("EXEC/expression nested deeper than {limit}")]
    TooDeep { limit: usize },
    #[error("EXEC/interpreter panicked: {0}")]
    Panicked(String),
    #[error("EXEC/{0}")]
    Table(#[from] TableError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionOutcome {
    Success { table: Table, columns: Vec<String> },
    Failed(ExecutionError),
}

impl ExecutionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ExecutionOutcome::Success { .. })
    }
}

#[derive(Debug, Clone, Default)]
pub struct SandboxedExecutor {
    config: SandboxConfig,
}

impl SandboxedExecutor {
    pub fn new(config: SandboxConfig) -> Self {
        Self { config }
    }

    /// Run `code` against a copy of `input`. The caller's table is never touched.
    pub fn execute(&self, code: &str, input: &Table) -> ExecutionOutcome {
        match self.run(code, input) {
            Ok(table) => {
                let columns = table.column_names();
                debug!(columns = columns.len(), rows = table.num_rows(), "program executed");
                ExecutionOutcome::Success { table, columns }
            }
            Err(err) => {
                warn!(error = %err, "program execution failed");
                ExecutionOutcome::Failed(err)
            }
        }
    }

    fn run(&self, code: &str, input: &Table) -> Result<Table, ExecutionError> {
        let program = parse_program(code)?;
        if program.statements.len() > self.config.max_statements {
            return Err(ExecutionError::TooManyStatements {
                got: program.statements.len(),
                limit: self.config.max_statements,
            });
        }
        let working = input.clone();
        catch_unwind(AssertUnwindSafe(|| Interpreter::new(working).run(&program)))
            .unwrap_or_else(|payload| {
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                Err(ExecutionError::Panicked(message))
            })
    }
}
