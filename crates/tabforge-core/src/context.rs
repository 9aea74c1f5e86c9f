//! Execution Context: per-request state threaded through the stages
use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct TransformContext {
    pub trace_id: String,
    pub started_at: DateTime<Utc>,
    /// Skip the code-generation path entirely
    pub offline: bool,
}

impl TransformContext {
    pub fn new() -> Self {
        Self {
            trace_id: uuid::Uuid::new_v4().to_string(),
            started_at: Utc::now(),
            offline: false,
        }
    }

    pub fn offline() -> Self {
        Self {
            offline: true,
            ..Self::new()
        }
    }
}

impl Default for TransformContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offline_context() {
        let online = TransformContext::new();
        let offline = TransformContext::offline();
        assert!(!online.offline);
        assert!(offline.offline);
        assert_ne!(online.trace_id, offline.trace_id);
    }
}
