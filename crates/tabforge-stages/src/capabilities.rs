//! Capability seams of the orchestrator.
//!
//! Each collaborator is injected behind one narrow trait so a test can swap
//! a single stage without touching the others.

use async_trait::async_trait;
use tabforge_codegen::{CodeGenerationClient, GenerationError};
use tabforge_core::{ClassificationError, GeneratedCode, SchemaProfile, Table, TargetFrame};
use tabforge_in::SchemaClassifier;
use tabforge_out::{PromptError, PromptSpec, PromptStrategySelector};
use tabforge_quality::{SchemaValidator, SchemaVerdict};
use tabforge_sandbox::{ExecutionOutcome, SandboxedExecutor};

use crate::fallback::FallbackSynthesizer;

pub trait SchemaProfiler: Send + Sync {
    fn profile(&self, table: &Table) -> Result<SchemaProfile, ClassificationError>;
}

pub trait PromptSelector: Send + Sync {
    fn select(&self, profile: &SchemaProfile) -> Result<PromptSpec, PromptError>;
}

#[async_trait]
pub trait CodeSource: Send + Sync {
    /// Breaker state; an open source is skipped without building a prompt
    fn is_open(&self) -> bool;

    async fn generate(&self, prompt: &str) -> Result<GeneratedCode, GenerationError>;
}

pub trait CodeExecutor: Send + Sync {
    fn execute(&self, code: &str, input: &Table) -> ExecutionOutcome;
}

pub trait SchemaCheck: Send + Sync {
    fn validate(&self, table: &Table) -> bool;

    /// Conformant frame, or the verdict explaining the rejection
    fn accept(&self, table: &Table, expected_rows: Option<usize>) -> Result<TargetFrame, SchemaVerdict>;
}

/// Must be total: every profiled table yields a frame
pub trait FallbackStrategy: Send + Sync {
    fn synthesize(&self, table: &Table, profile: &SchemaProfile) -> TargetFrame;
}

impl SchemaProfiler for SchemaClassifier {
    fn profile(&self, table: &Table) -> Result<SchemaProfile, ClassificationError> {
        self.classify(table)
    }
}

impl PromptSelector for PromptStrategySelector {
    fn select(&self, profile: &SchemaProfile) -> Result<PromptSpec, PromptError> {
        PromptStrategySelector::select(self, profile)
    }
}

#[async_trait]
impl CodeSource for CodeGenerationClient {
    fn is_open(&self) -> bool {
        self.breaker().is_open()
    }

    async fn generate(&self, prompt: &str) -> Result<GeneratedCode, GenerationError> {
        CodeGenerationClient::generate(self, prompt).await
    }
}

impl CodeExecutor for SandboxedExecutor {
    fn execute(&self, code: &str, input: &Table) -> ExecutionOutcome {
        SandboxedExecutor::execute(self, code, input)
    }
}

impl SchemaCheck for SchemaValidator {
    fn validate(&self, table: &Table) -> bool {
        SchemaValidator::validate(self, table)
    }

    fn accept(&self, table: &Table, expected_rows: Option<usize>) -> Result<TargetFrame, SchemaVerdict> {
        SchemaValidator::accept(self, table, expected_rows)
    }
}

impl FallbackStrategy for FallbackSynthesizer {
    fn synthesize(&self, table: &Table, profile: &SchemaProfile) -> TargetFrame {
        FallbackSynthesizer::synthesize(self, table, profile)
    }
}
