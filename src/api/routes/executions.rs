use axum::{
    extract::{Path, Query, State},
    Json,
};
use crate::api::AppState;
use crate::errors::AgentrailError;
use crate::tracker::{AgentExecution, ExecutionFilter};

pub async fn list_executions(
    State(state): State<AppState>,
    Query(filter): Query<ExecutionFilter>,
) -> Result<Json<Vec<AgentExecution>>, AgentrailError> {
    Ok(Json(state.manager.tracker().list_executions(&filter).await?))
}

pub async fn get_execution(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<AgentExecution>, AgentrailError> {
    Ok(Json(state.manager.tracker().get_execution(&id).await?))
}
