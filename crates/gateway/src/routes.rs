//! API handlers.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::header,
    response::IntoResponse,
    Json,
};
use serde_json::{json, Value};

use agent_gateway_core::types::{ExecutionEnvelope, ExecutionRequest};

use crate::error::ApiError;
use crate::state::AppState;

/// `GET /api/agents`
pub async fn list_agents(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "agents": state.dispatcher.registry().summaries() }))
}

/// `GET /api/agents/:id/options`
pub async fn describe_options(
    State(state): State<AppState>,
    Path(agent_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let options = state.dispatcher.registry().describe_options(&agent_id)?;
    Ok(Json(json!({ "agent": agent_id, "options": options })))
}

/// `POST /api/execute`
///
/// Agent failures are answered with 200 and `success: false`; only requests
/// rejected before invocation map to an error status.
pub async fn execute(
    State(state): State<AppState>,
    payload: Result<Json<ExecutionRequest>, JsonRejection>,
) -> Result<Json<ExecutionEnvelope>, ApiError> {
    let Json(request) = payload?;
    let agent = request.agent.clone();

    tracing::info!(agent = %agent, "Execute request");
    let outcome = state.dispatcher.execute(request).await?;

    Ok(Json(
        ExecutionEnvelope::from_result(agent, outcome.result).with_cached(outcome.cached),
    ))
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "agents": state.dispatcher.registry().len(),
    }))
}

/// `GET /metrics`
pub async fn metrics(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let handle = state.metrics.as_ref().ok_or(ApiError::MetricsUnavailable)?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        handle.render(),
    ))
}
