//! CodeGenerationClient: breaker gate, retry loop and fence unwrapping
//! around a [`CodeGenerator`].

use std::sync::Arc;
use tabforge_core::{GeneratedCode, RetryConfig};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::breaker::CircuitBreaker;
use crate::fence::unwrap_fenced;
use crate::provider::{CodeGenerator, ProviderError};
use crate::retry::RetryPolicy;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    #[error("GENERATE/circuit breaker open")]
    CircuitOpen,
    #[error("GENERATE/exhausted after {attempts} attempts")]
    Exhausted { attempts: u32 },
    #[error("GENERATE/failed: {0}")]
    Failed(String),
}

pub struct CodeGenerationClient {
    generator: Arc<dyn CodeGenerator>,
    breaker: Arc<CircuitBreaker>,
    retry: RetryPolicy,
}

impl CodeGenerationClient {
    pub fn new(
        generator: Arc<dyn CodeGenerator>,
        breaker: Arc<CircuitBreaker>,
        retry: &RetryConfig,
    ) -> Self {
        Self {
            generator,
            breaker,
            retry: RetryPolicy::from_config(retry),
        }
    }

    pub fn with_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.retry
    }

    pub async fn generate(&self, prompt: &str) -> Result<GeneratedCode, GenerationError> {
        if !self.breaker.try_acquire() {
            warn!(provider = self.generator.name(), "circuit breaker open, skipping generation");
            return Err(GenerationError::CircuitOpen);
        }

        for attempt in 0..self.retry.max_attempts {
            match self.attempt(prompt).await {
                Ok(raw) => {
                    self.breaker.record_success();
                    let code = unwrap_fenced(&raw);
                    info!(
                        provider = self.generator.name(),
                        attempt = attempt + 1,
                        chars = code.len(),
                        "code generated"
                    );
                    debug!(code = %code, "generated program");
                    return Ok(GeneratedCode::generated(code));
                }
                Err(ProviderError::Overloaded(reason)) => {
                    self.breaker.record_failure();
                    if self.retry.is_last(attempt) {
                        warn!(
                            attempt = attempt + 1,
                            max_attempts = self.retry.max_attempts,
                            %reason,
                            "provider overloaded, no attempts left"
                        );
                    } else {
                        let delay = self.retry.delay(attempt);
                        warn!(
                            attempt = attempt + 1,
                            max_attempts = self.retry.max_attempts,
                            delay_ms = delay.as_millis() as u64,
                            %reason,
                            "provider overloaded, retrying"
                        );
                        tokio::time::sleep(delay).await;
                    }
                }
                Err(ProviderError::Other(reason)) => {
                    warn!(%reason, "code generation failed");
                    return Err(GenerationError::Failed(reason));
                }
            }
        }

        Err(GenerationError::Exhausted {
            attempts: self.retry.max_attempts,
        })
    }

    async fn attempt(&self, prompt: &str) -> Result<String, ProviderError> {
        match self.retry.attempt_timeout {
            Some(limit) => tokio::time::timeout(limit, self.generator.invoke(prompt))
                .await
                .unwrap_or_else(|_| {
                    Err(ProviderError::Overloaded(format!(
                        "attempt timed out after {}s",
                        limit.as_secs()
                    )))
                }),
            None => self.generator.invoke(prompt).await,
        }
    }
}
