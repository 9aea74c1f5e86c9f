//! Prometheus registry for `/metrics`.
use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};
use tabforge_stages::TransformationResult;

pub struct Metrics {
    registry: Registry,
    transforms: IntCounterVec,
    fallbacks: IntCounterVec,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();
        let transforms = IntCounterVec::new(
            Opts::new("tabforge_transforms_total", "Completed transformations by path"),
            &["path"],
        )?;
        let fallbacks = IntCounterVec::new(
            Opts::new("tabforge_fallbacks_total", "Fallback syntheses by reason"),
            &["reason"],
        )?;
        registry.register(Box::new(transforms.clone()))?;
        registry.register(Box::new(fallbacks.clone()))?;
        Ok(Self {
            registry,
            transforms,
            fallbacks,
        })
    }

    pub fn record(&self, result: &TransformationResult) {
        let path = if result.is_fallback() { "fallback" } else { "generated" };
        self.transforms.with_label_values(&[path]).inc();
        if let Some(reason) = &result.fallback_reason {
            self.fallbacks.with_label_values(&[reason.kind()]).inc();
        }
    }

    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).to_string())
    }
}
