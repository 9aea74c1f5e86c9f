//! TransformationOrchestrator: classify → prompt → generate → execute →
//! validate, degrading to the deterministic fallback on any failure after
//! classification.

use chrono::Utc;
use std::sync::Arc;
use tabforge_codegen::{CircuitBreaker, CodeGenerationClient, CodeGenerator, DisabledGenerator};
use tabforge_core::trace::hash_text;
use tabforge_core::{
    ClassificationError, CodeOrigin, EngineConfig, GeneratedCode, SchemaProfile, StageTrace, Table,
    TargetFrame, TransformContext,
};
use tabforge_in::SchemaClassifier;
use tabforge_out::{PromptError, PromptStrategySelector};
use tabforge_quality::SchemaValidator;
use tabforge_sandbox::{ExecutionOutcome, SandboxedExecutor};
use tracing::{info, warn};

use crate::capabilities::{
    CodeExecutor, CodeSource, FallbackStrategy, PromptSelector, SchemaCheck, SchemaProfiler,
};
use crate::fallback::FallbackSynthesizer;
use crate::result::{FallbackReason, TransformationResult};

pub struct TransformationOrchestrator {
    profiler: Arc<dyn SchemaProfiler>,
    prompts: Arc<dyn PromptSelector>,
    generator: Arc<dyn CodeSource>,
    executor: Arc<dyn CodeExecutor>,
    validator: Arc<dyn SchemaCheck>,
    fallback: Arc<dyn FallbackStrategy>,
    breaker: Arc<CircuitBreaker>,
}

pub struct OrchestratorBuilder {
    config: EngineConfig,
    generator: Arc<dyn CodeGenerator>,
    breaker: Option<Arc<CircuitBreaker>>,
    profiler: Option<Arc<dyn SchemaProfiler>>,
    prompts: Option<Arc<dyn PromptSelector>>,
    executor: Option<Arc<dyn CodeExecutor>>,
    validator: Option<Arc<dyn SchemaCheck>>,
    fallback: Option<Arc<dyn FallbackStrategy>>,
}

impl OrchestratorBuilder {
    pub fn with_generator(mut self, generator: Arc<dyn CodeGenerator>) -> Self {
        self.generator = generator;
        self
    }

    /// Share a breaker across orchestrators; by default each gets its own
    pub fn with_breaker(mut self, breaker: Arc<CircuitBreaker>) -> Self {
        self.breaker = Some(breaker);
        self
    }

    pub fn with_profiler(mut self, profiler: Arc<dyn SchemaProfiler>) -> Self {
        self.profiler = Some(profiler);
        self
    }

    pub fn with_prompts(mut self, prompts: Arc<dyn PromptSelector>) -> Self {
        self.prompts = Some(prompts);
        self
    }

    pub fn with_executor(mut self, executor: Arc<dyn CodeExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    pub fn with_validator(mut self, validator: Arc<dyn SchemaCheck>) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn with_fallback(mut self, fallback: Arc<dyn FallbackStrategy>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    pub fn build(self) -> Result<TransformationOrchestrator, PromptError> {
        let config = self.config;
        let breaker = self
            .breaker
            .unwrap_or_else(|| Arc::new(CircuitBreaker::new(config.breaker.clone())));
        let prompts = match self.prompts {
            Some(prompts) => prompts,
            None => Arc::new(PromptStrategySelector::builtin()?),
        };
        let client = CodeGenerationClient::new(self.generator, breaker.clone(), &config.retry);

        Ok(TransformationOrchestrator {
            profiler: self
                .profiler
                .unwrap_or_else(|| Arc::new(SchemaClassifier::new(config.classifier.clone()))),
            prompts,
            generator: Arc::new(client),
            executor: self
                .executor
                .unwrap_or_else(|| Arc::new(SandboxedExecutor::new(config.sandbox.clone()))),
            validator: self.validator.unwrap_or_else(|| Arc::new(SchemaValidator::new())),
            fallback: self.fallback.unwrap_or_else(|| Arc::new(FallbackSynthesizer::new())),
            breaker,
        })
    }
}

impl TransformationOrchestrator {
    pub fn builder(config: EngineConfig) -> OrchestratorBuilder {
        OrchestratorBuilder {
            config,
            generator: Arc::new(DisabledGenerator),
            breaker: None,
            profiler: None,
            prompts: None,
            executor: None,
            validator: None,
            fallback: None,
        }
    }

    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }

    /// Run one request. Only a failed classification is surfaced.
    pub async fn transform(&self, input: &Table) -> Result<TransformationResult, ClassificationError> {
        self.run(input, TransformContext::new()).await
    }

    /// Classify and synthesize without touching the generator or the breaker
    pub async fn transform_offline(&self, input: &Table) -> Result<TransformationResult, ClassificationError> {
        self.run(input, TransformContext::offline()).await
    }

    pub async fn run(
        &self,
        input: &Table,
        ctx: TransformContext,
    ) -> Result<TransformationResult, ClassificationError> {
        let mut trace = StageTrace::new();
        let input_hash = input.content_hash();

        let timer = trace.start("classify", input_hash.clone(), true);
        let profile = self.profiler.profile(input)?;
        let profile_hash = hash_text(&serde_json::to_string(&profile).unwrap_or_default());
        trace.push(timer.finish(profile_hash.clone()));

        let attempt = if ctx.offline {
            Err(FallbackReason::Offline)
        } else {
            self.generated_path(input, &profile, profile_hash, &mut trace).await
        };

        let (frame, source, fallback_reason, code) = match attempt {
            Ok((frame, code)) => (frame, CodeOrigin::Generated, None, Some(code)),
            Err(reason) => {
                warn!(trace_id = %ctx.trace_id, reason = %reason, "falling back to deterministic synthesis");
                let timer = trace.start("fallback", input_hash, true);
                let frame = self.fallback.synthesize(input, &profile);
                trace.push(timer.verdict(frame_hash(&frame), reason.kind()));
                (frame, CodeOrigin::Fallback, Some(reason), None)
            }
        };

        info!(
            trace_id = %ctx.trace_id,
            data_type = %profile.data_type,
            path = ?source,
            rows = frame.num_rows(),
            pipeline = %trace.pipeline_id(),
            "transformation complete"
        );

        Ok(TransformationResult {
            frame,
            source,
            fallback_reason,
            profile,
            trace_id: ctx.trace_id,
            started_at: ctx.started_at,
            finished_at: Utc::now(),
            stages: trace.into_stages(),
            code,
        })
    }

    async fn generated_path(
        &self,
        input: &Table,
        profile: &SchemaProfile,
        profile_hash: String,
        trace: &mut StageTrace,
    ) -> Result<(TargetFrame, GeneratedCode), FallbackReason> {
        if self.generator.is_open() {
            return Err(FallbackReason::CircuitOpen);
        }

        let timer = trace.start("prompt", profile_hash, true);
        let prompt = match self.prompts.select(profile) {
            Ok(prompt) => prompt,
            Err(err) => {
                trace.push(timer.verdict(String::new(), "FAIL"));
                return Err(FallbackReason::PromptFailed { message: err.to_string() });
            }
        };
        let prompt_hash = hash_text(&prompt.text);
        trace.push(timer.finish(prompt_hash.clone()));
        info!(template = prompt.template.as_str(), "prompt selected");

        let timer = trace.start("generate", prompt_hash, false);
        let code = match self.generator.generate(&prompt.text).await {
            Ok(code) => code,
            Err(err) => {
                trace.push(timer.verdict(String::new(), "FAIL"));
                return Err(err.into());
            }
        };
        trace.push(timer.finish(code.hash()));

        let timer = trace.start("execute", code.hash(), true);
        let table = match self.executor.execute(&code.text, input) {
            ExecutionOutcome::Success { table, .. } => table,
            ExecutionOutcome::Failed(err) => {
                trace.push(timer.verdict(String::new(), "FAIL"));
                return Err(FallbackReason::ExecutionError { message: err.to_string() });
            }
        };
        let table_hash = table.content_hash();
        trace.push(timer.finish(table_hash.clone()));

        let timer = trace.start("validate", table_hash, true);
        if !self.validator.validate(&table) {
            warn!(columns = ?table.column_names(), "generated table lacks target columns");
        }
        match self.validator.accept(&table, Some(input.num_rows())) {
            Ok(frame) => {
                trace.push(timer.verdict(frame_hash(&frame), "OK"));
                Ok((frame, code))
            }
            Err(verdict) => {
                trace.push(timer.verdict(String::new(), verdict.verdict.clone()));
                Err(FallbackReason::ValidationMismatch {
                    missing: verdict.missing,
                    detail: verdict.summary,
                })
            }
        }
    }
}

fn frame_hash(frame: &TargetFrame) -> String {
    frame.to_table().content_hash()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabforge_core::{Column, Value};

    fn table() -> Table {
        Table::from_columns(vec![
            Column::new("amount", vec![Value::Float(10.0), Value::Float(20.0)]),
            Column::new("fraud", vec![Value::Int(0), Value::Int(1)]),
        ])
        .unwrap()
    }

    #[tokio::test]
    async fn test_disabled_generator_falls_back() {
        let orchestrator = TransformationOrchestrator::builder(EngineConfig::default()).build().unwrap();
        let result = orchestrator.transform(&table()).await.unwrap();

        assert!(result.is_fallback());
        assert!(matches!(result.fallback_reason, Some(FallbackReason::GenerationFailed { .. })));
        assert_eq!(result.pipeline_id(), "classify→prompt→generate→fallback");
        assert_eq!(result.frame.amount(), &[10.0, 20.0]);
        // non-retryable failures leave the breaker alone
        assert_eq!(orchestrator.breaker().consecutive_failures(), 0);
    }

    #[tokio::test]
    async fn test_offline_skips_generation() {
        let orchestrator = TransformationOrchestrator::builder(EngineConfig::default()).build().unwrap();
        let result = orchestrator.transform_offline(&table()).await.unwrap();

        assert_eq!(result.fallback_reason, Some(FallbackReason::Offline));
        assert_eq!(result.pipeline_id(), "classify→fallback");
        assert_eq!(result.stages[1].verdict.as_deref(), Some("offline"));
        assert_eq!(result.label_distribution().fraud, 1);
    }

    #[tokio::test]
    async fn test_empty_input_is_the_only_error() {
        let orchestrator = TransformationOrchestrator::builder(EngineConfig::default()).build().unwrap();
        let err = orchestrator.transform(&Table::new()).await.unwrap_err();
        assert_eq!(err, ClassificationError::EmptyInput);
    }
}
