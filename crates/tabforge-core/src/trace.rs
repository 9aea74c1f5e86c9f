//! Stage trace: hashes and latency for every stage a transformation visits
use serde::{Deserialize, Serialize};
use std::time::Instant;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageProof {
    pub id: String,
    pub in_hash: String,
    pub out_hash: String,
    pub deterministic: bool,
    pub latency_ms: u64,
    pub verdict: Option<String>,
}

/// Timer for a stage in flight; finish it with [`StageTimer::finish`]
pub struct StageTimer {
    id: &'static str,
    in_hash: String,
    deterministic: bool,
    start: Instant,
}

impl StageTimer {
    pub fn verdict(self, out_hash: impl Into<String>, verdict: impl Into<String>) -> StageProof {
        self.close(out_hash.into(), Some(verdict.into()))
    }

    pub fn finish(self, out_hash: impl Into<String>) -> StageProof {
        self.close(out_hash.into(), None)
    }

    fn close(self, out_hash: String, verdict: Option<String>) -> StageProof {
        StageProof {
            id: self.id.to_string(),
            in_hash: self.in_hash,
            out_hash,
            deterministic: self.deterministic,
            latency_ms: self.start.elapsed().as_millis() as u64,
            verdict,
        }
    }
}

/// Ordered list of stage proofs for a single request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StageTrace {
    stages: Vec<StageProof>,
}

impl StageTrace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&self, id: &'static str, in_hash: impl Into<String>, deterministic: bool) -> StageTimer {
        StageTimer {
            id,
            in_hash: in_hash.into(),
            deterministic,
            start: Instant::now(),
        }
    }

    pub fn push(&mut self, proof: StageProof) {
        self.stages.push(proof);
    }

    pub fn stages(&self) -> &[StageProof] {
        &self.stages
    }

    /// `classify→prompt→generate→...` style id of the path taken
    pub fn pipeline_id(&self) -> String {
        self.stages
            .iter()
            .map(|s| s.id.as_str())
            .collect::<Vec<_>>()
            .join("→")
    }

    pub fn into_stages(self) -> Vec<StageProof> {
        self.stages
    }
}

pub fn hash_text(text: &str) -> String {
    format!("blake3:{}", blake3::hash(text.as_bytes()))
}
