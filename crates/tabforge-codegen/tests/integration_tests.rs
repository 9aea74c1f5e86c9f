//! Integration tests for tabforge-codegen: retry loop and breaker against a
//! scripted generator. Time is paused so backoff sleeps complete instantly.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tabforge_codegen::{
    CircuitBreaker, CodeGenerationClient, CodeGenerator, GenerationError, ProviderError,
};
use tabforge_core::{BreakerConfig, CodeOrigin, RetryConfig};
use tokio::time::Instant;

/// Replays a fixed script; repeats the last entry once the script runs out
struct ScriptedGenerator {
    script: Mutex<VecDeque<Result<String, ProviderError>>>,
    last: Result<String, ProviderError>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl ScriptedGenerator {
    fn new(script: Vec<Result<String, ProviderError>>) -> Self {
        let last = script
            .last()
            .cloned()
            .unwrap_or_else(|| Err(ProviderError::Other("empty script".into())));
        Self {
            script: Mutex::new(script.into()),
            last,
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    fn always(result: Result<String, ProviderError>) -> Self {
        Self::new(vec![result])
    }

    fn slow(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CodeGenerator for ScriptedGenerator {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn invoke(&self, _prompt: &str) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let next = self.script.lock().unwrap().pop_front();
        next.unwrap_or_else(|| self.last.clone())
    }
}

fn overloaded() -> Result<String, ProviderError> {
    Err(ProviderError::Overloaded("529 overloaded".into()))
}

fn client(generator: Arc<ScriptedGenerator>) -> (CodeGenerationClient, Arc<CircuitBreaker>) {
    let breaker = Arc::new(CircuitBreaker::new(BreakerConfig::default()));
    let client = CodeGenerationClient::new(generator, breaker.clone(), &RetryConfig::default());
    (client, breaker)
}

// =============================================================================
// Retry loop
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_persistent_overload_exhausts_attempts() {
    let generator = Arc::new(ScriptedGenerator::always(overloaded()));
    let (client, breaker) = client(generator.clone());

    let started = Instant::now();
    let err = client.generate("prompt").await.unwrap_err();
    let elapsed = started.elapsed();

    assert_eq!(err, GenerationError::Exhausted { attempts: 3 });
    assert_eq!(generator.calls(), 3);
    assert_eq!(breaker.consecutive_failures(), 3);
    // sleeps after attempts 0 and 1 only: 1s + 2s plus jitter below 1s each
    assert!(elapsed >= Duration::from_secs(3), "{elapsed:?}");
    assert!(elapsed < Duration::from_secs(5), "{elapsed:?}");
}

#[tokio::test(start_paused = true)]
async fn test_overload_then_success() {
    let generator = Arc::new(ScriptedGenerator::new(vec![
        overloaded(),
        Ok("```python\ndf[\"V1\"] = 1\n```".into()),
    ]));
    let (client, breaker) = client(generator.clone());

    let code = client.generate("prompt").await.unwrap();
    assert_eq!(code.text, "df[\"V1\"] = 1");
    assert_eq!(code.origin, CodeOrigin::Generated);
    assert_eq!(generator.calls(), 2);
    assert_eq!(breaker.consecutive_failures(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_non_transient_error_fails_immediately() {
    let generator = Arc::new(ScriptedGenerator::always(Err(ProviderError::Other(
        "invalid_request_error".into(),
    ))));
    let (client, breaker) = client(generator.clone());

    let err = client.generate("prompt").await.unwrap_err();
    assert!(matches!(err, GenerationError::Failed(ref m) if m == "invalid_request_error"));
    assert_eq!(generator.calls(), 1);
    assert_eq!(breaker.consecutive_failures(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_attempt_timeout_counts_as_overload() {
    let generator =
        Arc::new(ScriptedGenerator::always(Ok("df = df".into())).slow(Duration::from_secs(600)));
    let (client, breaker) = client(generator.clone());

    let err = client.generate("prompt").await.unwrap_err();
    assert_eq!(err, GenerationError::Exhausted { attempts: 3 });
    assert_eq!(breaker.consecutive_failures(), 3);
}

// =============================================================================
// Circuit breaker
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_open_breaker_skips_the_service() {
    let generator = Arc::new(ScriptedGenerator::always(overloaded()));
    let (client, breaker) = client(generator.clone());

    client.generate("prompt").await.unwrap_err();
    assert!(breaker.is_open());

    tokio::time::advance(Duration::from_secs(30)).await;
    let err = client.generate("prompt").await.unwrap_err();
    assert_eq!(err, GenerationError::CircuitOpen);
    assert_eq!(generator.calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_breaker_resets_after_open_duration() {
    let generator = Arc::new(ScriptedGenerator::new(vec![
        overloaded(),
        overloaded(),
        overloaded(),
        Ok("df = df.copy()".into()),
    ]));
    let (client, breaker) = client(generator.clone());

    client.generate("prompt").await.unwrap_err();
    tokio::time::advance(Duration::from_secs(61)).await;

    let code = client.generate("prompt").await.unwrap();
    assert_eq!(code.text, "df = df.copy()");
    assert_eq!(generator.calls(), 4);
    assert_eq!(breaker.consecutive_failures(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_breaker_is_shared_between_clients() {
    let breaker = Arc::new(CircuitBreaker::new(BreakerConfig {
        failure_threshold: 2,
        open_duration_secs: 60,
    }));
    let failing = Arc::new(ScriptedGenerator::always(overloaded()));
    let healthy = Arc::new(ScriptedGenerator::always(Ok("df = df".into())));

    let a = CodeGenerationClient::new(failing, breaker.clone(), &RetryConfig::default());
    let b = CodeGenerationClient::new(healthy.clone(), breaker.clone(), &RetryConfig::default());

    a.generate("prompt").await.unwrap_err();
    assert_eq!(b.generate("prompt").await.unwrap_err(), GenerationError::CircuitOpen);
    assert_eq!(healthy.calls(), 0);
}
