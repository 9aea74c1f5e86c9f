//! Binary entrypoint for the Tabforge API server.
use anyhow::Context;
use std::sync::Arc;
use tabforge_api::{run, AppState};
use tabforge_codegen::{AnthropicGenerator, CodeGenerator, DisabledGenerator};
use tabforge_core::EngineConfig;
use tabforge_sink::SqliteSink;
use tabforge_stages::TransformationOrchestrator;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match std::env::var("TABFORGE_CONFIG") {
        Ok(path) => EngineConfig::load(&path).with_context(|| format!("loading {path}"))?,
        Err(_) => EngineConfig::default(),
    };

    let generator: Arc<dyn CodeGenerator> = match AnthropicGenerator::from_env(config.provider.clone()) {
        Ok(generator) => Arc::new(generator),
        Err(e) => {
            tracing::warn!(error = %e, "code generation disabled, every request will use the fallback");
            Arc::new(DisabledGenerator)
        }
    };

    let engine = TransformationOrchestrator::builder(config)
        .with_generator(generator)
        .build()
        .context("loading prompt templates")?;
    let mut state = AppState::new(engine)?;

    if let Ok(path) = std::env::var("TABFORGE_DB") {
        let sink = SqliteSink::open(&path).with_context(|| format!("opening {path}"))?;
        state = state.with_sink(Box::new(sink));
    }

    // Default listen address can be overridden with TABFORGE_ADDR
    let addr = std::env::var("TABFORGE_ADDR").unwrap_or_else(|_| "0.0.0.0:8787".to_string());
    run(&addr, state).await
}
