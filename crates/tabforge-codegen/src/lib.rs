//! tabforge-codegen: resilient access to the code-generation service.
//!
//! [`CodeGenerationClient::generate`] checks the shared [`CircuitBreaker`],
//! calls the [`CodeGenerator`] up to `max_attempts` times with exponential
//! backoff on overload, and returns the response with any code fence removed.

pub mod anthropic;
pub mod breaker;
pub mod client;
pub mod fence;
pub mod provider;
pub mod retry;

pub use anthropic::AnthropicGenerator;
pub use breaker::{BreakerSnapshot, CircuitBreaker};
pub use client::{CodeGenerationClient, GenerationError};
pub use fence::unwrap_fenced;
pub use provider::{CodeGenerator, DisabledGenerator, ProviderError};
pub use retry::RetryPolicy;
