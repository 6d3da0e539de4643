use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use crate::agents::AgentInput;
use crate::api::auth::UserId;
use crate::api::AppState;
use crate::engine::AgentChain;
use crate::errors::AgentrailError;
use crate::tracker::{AgentChainExecution, ChainExecutionFilter};

pub async fn list_chains(State(state): State<AppState>) -> Json<Vec<AgentChain>> {
    Json(state.manager.list_chains().await)
}

pub async fn create_chain(
    State(state): State<AppState>,
    Json(chain): Json<AgentChain>,
) -> Result<(StatusCode, Json<AgentChain>), AgentrailError> {
    let chain = state.manager.create_chain(chain).await?;
    Ok((StatusCode::CREATED, Json(chain)))
}

pub async fn get_chain(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<AgentChain>, AgentrailError> {
    Ok(Json(state.manager.get_chain(&id).await?))
}

pub async fn execute_chain(
    State(state): State<AppState>,
    Path(id): Path<String>,
    UserId(user_id): UserId,
    Json(input): Json<AgentInput>,
) -> Result<Json<AgentChainExecution>, AgentrailError> {
    let ctx = state.shutdown.child_token();
    let execution = state.manager.execute_chain(&ctx, &id, &input, &user_id).await?;
    Ok(Json(execution))
}

pub async fn resume_chain(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<AgentChainExecution>, AgentrailError> {
    let ctx = state.shutdown.child_token();
    Ok(Json(state.manager.resume_chain(&ctx, &id).await?))
}

pub async fn get_chain_execution(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<AgentChainExecution>, AgentrailError> {
    Ok(Json(state.manager.tracker().get_chain_execution(&id).await?))
}

pub async fn list_chain_executions(
    State(state): State<AppState>,
    Query(filter): Query<ChainExecutionFilter>,
) -> Result<Json<Vec<AgentChainExecution>>, AgentrailError> {
    Ok(Json(state.manager.tracker().list_chain_executions(&filter).await?))
}
