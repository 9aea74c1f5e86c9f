//! API Handlers
use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tabforge_core::{Table, TransformContext};
use tabforge_in::ingest;
use tabforge_sink::SinkError;
use tabforge_stages::TransformationResult;
use tracing::{error, info};

use crate::AppState;

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Unprocessable(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m),
            ApiError::Unprocessable(m) => (StatusCode::UNPROCESSABLE_ENTITY, m),
            ApiError::Internal(m) => (StatusCode::INTERNAL_SERVER_ERROR, m),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct TransformRequest {
    /// JSON array of flat objects
    pub records: Value,
    #[serde(default)]
    pub offline: bool,
    pub persist_as: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TransformParams {
    #[serde(default)]
    pub offline: bool,
    pub persist_as: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Persisted {
    pub table: String,
    pub rows: usize,
}

#[derive(Debug, Serialize)]
pub struct TransformResponse {
    pub trace_id: String,
    pub source: tabforge_core::CodeOrigin,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<tabforge_stages::FallbackReason>,
    pub data_type: tabforge_core::DataType,
    pub pipeline: String,
    pub rows: usize,
    pub columns: Vec<String>,
    pub records: Vec<Map<String, Value>>,
    pub label_distribution: tabforge_stages::LabelDistribution,
    pub stages: Vec<tabforge_core::StageProof>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persisted: Option<Persisted>,
}

pub async fn transform(
    State(state): State<AppState>,
    Json(request): Json<TransformRequest>,
) -> Result<Json<TransformResponse>, ApiError> {
    let table = ingest::from_json(&request.records).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let params = TransformParams {
        offline: request.offline,
        persist_as: request.persist_as,
    };
    run_transform(&state, table, params).await.map(Json)
}

pub async fn transform_csv(
    State(state): State<AppState>,
    Query(params): Query<TransformParams>,
    body: String,
) -> Result<Json<TransformResponse>, ApiError> {
    let table = ingest::read_csv_str(&body).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    run_transform(&state, table, params).await.map(Json)
}

async fn run_transform(
    state: &AppState,
    table: Table,
    params: TransformParams,
) -> Result<TransformResponse, ApiError> {
    let ctx = if params.offline {
        TransformContext::offline()
    } else {
        TransformContext::new()
    };
    let result = state
        .engine
        .run(&table, ctx)
        .await
        .map_err(|e| ApiError::Unprocessable(format!("CLASSIFY/{e}")))?;
    state.metrics.record(&result);

    let persisted = match params.persist_as {
        Some(name) => Some(persist(state, &name, &result)?),
        None => None,
    };
    Ok(response(result, persisted))
}

fn persist(state: &AppState, name: &str, result: &TransformationResult) -> Result<Persisted, ApiError> {
    let Some(sink) = &state.sink else {
        return Err(ApiError::BadRequest("no storage sink configured".into()));
    };
    let mut sink = sink
        .lock()
        .map_err(|_| ApiError::Internal("storage sink poisoned".into()))?;
    let rows = sink.persist(name, &result.table()).map_err(|e| match &e {
        SinkError::Sqlite(_) => {
            error!(error = %e, "persist failed");
            ApiError::Internal(e.to_string())
        }
        _ => ApiError::BadRequest(e.to_string()),
    })?;
    info!(table = name, rows, trace_id = %result.trace_id, "result persisted");
    Ok(Persisted {
        table: name.to_lowercase(),
        rows,
    })
}

fn response(result: TransformationResult, persisted: Option<Persisted>) -> TransformResponse {
    let table = result.table();
    TransformResponse {
        pipeline: result.pipeline_id(),
        label_distribution: result.label_distribution(),
        rows: table.num_rows(),
        columns: table.column_names(),
        records: table.to_records(),
        trace_id: result.trace_id,
        source: result.source,
        fallback_reason: result.fallback_reason,
        data_type: result.profile.data_type,
        stages: result.stages,
        persisted,
    }
}

pub async fn breaker(State(state): State<AppState>) -> Json<tabforge_codegen::BreakerSnapshot> {
    Json(state.engine.breaker().snapshot())
}

pub async fn metrics(State(state): State<AppState>) -> Result<Response, ApiError> {
    let body = state
        .metrics
        .encode()
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], body).into_response())
}

pub async fn health() -> (StatusCode, Json<Value>) {
    (
        StatusCode::OK,
        Json(json!({ "status": "ok", "version": tabforge_core::TABFORGE_VERSION })),
    )
}
