//! Tabforge API /v1: thin HTTP surface over the orchestrator
pub mod handlers;
pub mod metrics;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::{Arc, Mutex};
use tabforge_sink::TableSink;
use tabforge_stages::TransformationOrchestrator;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use metrics::Metrics;

pub type SharedSink = Arc<Mutex<Box<dyn TableSink>>>;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<TransformationOrchestrator>,
    pub sink: Option<SharedSink>,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(engine: TransformationOrchestrator) -> Result<Self, prometheus::Error> {
        Ok(Self {
            engine: Arc::new(engine),
            sink: None,
            metrics: Arc::new(Metrics::new()?),
        })
    }

    pub fn with_sink(mut self, sink: Box<dyn TableSink>) -> Self {
        self.sink = Some(Arc::new(Mutex::new(sink)));
        self
    }
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/v1/transform", post(handlers::transform))
        .route("/v1/transform/csv", post(handlers::transform_csv))
        .route("/v1/breaker", get(handlers::breaker))
        .route("/v1/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn run(addr: &str, state: AppState) -> anyhow::Result<()> {
    let app = create_app(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("Tabforge API listening on {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}
