//! The external code-generation service seen through one narrow trait.

use async_trait::async_trait;
use thiserror::Error;

/// Failure of a single `invoke` call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// Overloaded or rate limited; the call may be retried
    #[error("PROVIDER/overloaded: {0}")]
    Overloaded(String),
    #[error("PROVIDER/{0}")]
    Other(String),
}

#[async_trait]
pub trait CodeGenerator: Send + Sync {
    fn name(&self) -> &str;

    /// Send `prompt`, return the raw response text
    async fn invoke(&self, prompt: &str) -> Result<String, ProviderError>;
}

/// Stand-in when no provider is configured; every call fails without retry
#[derive(Debug, Clone, Default)]
pub struct DisabledGenerator;

#[async_trait]
impl CodeGenerator for DisabledGenerator {
    fn name(&self) -> &str {
        "disabled"
    }

    async fn invoke(&self, _prompt: &str) -> Result<String, ProviderError> {
        Err(ProviderError::Other("no code generator configured".to_string()))
    }
}
