use axum::{
    extract::{Path, State},
    Json,
};
use crate::agents::{AgentInfo, AgentInput};
use crate::api::auth::UserId;
use crate::api::AppState;
use crate::errors::AgentrailError;
use crate::tracker::AgentExecution;

pub async fn list_agents(State(state): State<AppState>) -> Json<Vec<AgentInfo>> {
    Json(state.manager.list_agents().await)
}

/// Runs the agent and returns its execution record. A failed agent run is still a
/// recorded execution and comes back with status `failed`.
pub async fn execute_agent(
    State(state): State<AppState>,
    Path(agent_type): Path<String>,
    UserId(user_id): UserId,
    Json(input): Json<AgentInput>,
) -> Result<Json<AgentExecution>, AgentrailError> {
    let ctx = state.shutdown.child_token();
    let execution = state
        .manager
        .execute_agent(&ctx, &agent_type, &input, &user_id)
        .await?;
    Ok(Json(execution))
}
