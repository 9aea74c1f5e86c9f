//! TransformationResult and the reasons a request degraded to fallback.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tabforge_codegen::GenerationError;
use tabforge_core::{CodeOrigin, GeneratedCode, Label, SchemaProfile, StageProof, Table, TargetFrame};
use thiserror::Error;

/// Why the generated path was abandoned
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FallbackReason {
    #[error("offline mode requested")]
    Offline,
    #[error("circuit breaker open")]
    CircuitOpen,
    #[error("code generation exhausted after {attempts} attempts")]
    GenerationExhausted { attempts: u32 },
    #[error("code generation failed: {message}")]
    GenerationFailed { message: String },
    #[error("prompt selection failed: {message}")]
    PromptFailed { message: String },
    #[error("generated program failed: {message}")]
    ExecutionError { message: String },
    #[error("generated table rejected: {detail}")]
    ValidationMismatch { missing: Vec<String>, detail: String },
}

impl FallbackReason {
    /// Stable label, used for metrics and stage verdicts
    pub fn kind(&self) -> &'static str {
        match self {
            FallbackReason::Offline => "offline",
            FallbackReason::CircuitOpen => "circuit_open",
            FallbackReason::GenerationExhausted { .. } => "generation_exhausted",
            FallbackReason::GenerationFailed { .. } => "generation_failed",
            FallbackReason::PromptFailed { .. } => "prompt_failed",
            FallbackReason::ExecutionError { .. } => "execution_error",
            FallbackReason::ValidationMismatch { .. } => "validation_mismatch",
        }
    }
}

impl From<GenerationError> for FallbackReason {
    fn from(err: GenerationError) -> Self {
        match err {
            GenerationError::CircuitOpen => FallbackReason::CircuitOpen,
            GenerationError::Exhausted { attempts } => FallbackReason::GenerationExhausted { attempts },
            GenerationError::Failed(message) => FallbackReason::GenerationFailed { message },
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LabelDistribution {
    pub legit: usize,
    pub fraud: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransformationResult {
    pub frame: TargetFrame,
    pub source: CodeOrigin,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<FallbackReason>,
    pub profile: SchemaProfile,
    pub trace_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub stages: Vec<StageProof>,
    /// Program that produced `frame`, if it was generated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<GeneratedCode>,
}

impl TransformationResult {
    /// `V1..V28, Amount, label` in canonical order
    pub fn table(&self) -> Table {
        self.frame.to_table()
    }

    pub fn num_rows(&self) -> usize {
        self.frame.num_rows()
    }

    pub fn is_fallback(&self) -> bool {
        self.source == CodeOrigin::Fallback
    }

    pub fn label_distribution(&self) -> LabelDistribution {
        self.frame
            .labels()
            .iter()
            .fold(LabelDistribution::default(), |mut dist, label| {
                match label {
                    Label::Legit => dist.legit += 1,
                    Label::Fraud => dist.fraud += 1,
                }
                dist
            })
    }

    pub fn pipeline_id(&self) -> String {
        self.stages
            .iter()
            .map(|s| s.id.as_str())
            .collect::<Vec<_>>()
            .join("→")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_errors_map_to_reasons() {
        assert_eq!(FallbackReason::from(GenerationError::CircuitOpen), FallbackReason::CircuitOpen);
        let exhausted = FallbackReason::from(GenerationError::Exhausted { attempts: 3 });
        assert_eq!(exhausted.kind(), "generation_exhausted");
        assert_eq!(exhausted.to_string(), "code generation exhausted after 3 attempts");
    }

    #[test]
    fn test_reason_serializes_with_kind_tag() {
        let reason = FallbackReason::ValidationMismatch {
            missing: vec!["V11".into()],
            detail: "failed checks: target_columns".into(),
        };
        let json = serde_json::to_value(&reason).unwrap();
        assert_eq!(json["kind"], "validation_mismatch");
        assert_eq!(json["missing"][0], "V11");
    }
}
