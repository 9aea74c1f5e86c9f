//! Engine configuration.
//!
//! Every field has a default so a partial YAML document (or none at all)
//! yields a working engine.

use crate::error::TabforgeError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub breaker: BreakerConfig,
    pub retry: RetryConfig,
    pub classifier: ClassifierConfig,
    pub sandbox: SandboxConfig,
    pub provider: ProviderConfig,
}

impl EngineConfig {
    /// Parse from YAML content
    pub fn from_yaml(yaml: &str) -> Result<Self, TabforgeError> {
        serde_yaml::from_str(yaml).map_err(|e| TabforgeError::Config(e.to_string()))
    }

    /// Load from a YAML file
    pub fn load(path: &str) -> Result<Self, TabforgeError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| TabforgeError::Config(format!("failed to read {}: {}", path, e)))?;
        Self::from_yaml(&content)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BreakerConfig {
    /// Consecutive retryable failures before the breaker opens
    pub failure_threshold: u32,
    /// How long the breaker stays open after the last failure
    pub open_duration_secs: u64,
}

impl BreakerConfig {
    pub fn open_duration(&self) -> Duration {
        Duration::from_secs(self.open_duration_secs)
    }
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            open_duration_secs: 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    /// Upper bound for a single provider call; `None` waits indefinitely
    pub attempt_timeout_secs: Option<u64>,
}

impl RetryConfig {
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    pub fn attempt_timeout(&self) -> Option<Duration> {
        self.attempt_timeout_secs.map(Duration::from_secs)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1000,
            attempt_timeout_secs: Some(120),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Mean string length above which a text column is free text
    pub text_length_threshold: f64,
    /// `V<digits>` columns needed for the already-formatted short-circuit
    pub already_formatted_min_v_columns: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            text_length_threshold: 20.0,
            already_formatted_min_v_columns: 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxConfig {
    pub max_statements: usize,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self { max_statements: 512 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Environment variable holding the API key
    pub api_key_env: String,
    pub base_url: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            model: "claude-3-5-sonnet-20241022".to_string(),
            max_tokens: 4096,
            temperature: 0.1,
            api_key_env: "ANTHROPIC_API_KEY".to_string(),
            base_url: "https://api.anthropic.com/v1".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.breaker.failure_threshold, 3);
        assert_eq!(config.breaker.open_duration(), Duration::from_secs(60));
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.retry.base_delay(), Duration::from_secs(1));
        assert_eq!(config.classifier.text_length_threshold, 20.0);
    }

    #[test]
    fn test_partial_yaml() {
        let yaml = r#"
breaker:
  failure_threshold: 5
retry:
  base_delay_ms: 10
  attempt_timeout_secs: ~
"#;
        let config = EngineConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.breaker.failure_threshold, 5);
        assert_eq!(config.breaker.open_duration_secs, 60);
        assert_eq!(config.retry.base_delay_ms, 10);
        assert_eq!(config.retry.attempt_timeout(), None);
        assert_eq!(config.retry.max_attempts, 3);
    }

    #[test]
    fn test_bad_yaml() {
        let err = EngineConfig::from_yaml("breaker: [1, 2").unwrap_err();
        assert!(err.to_string().starts_with("CONFIG/"));
    }
}
