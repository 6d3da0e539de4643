use axum::{
    extract::{Query, State},
    Json,
};
use crate::api::models::MetricsQuery;
use crate::api::AppState;
use crate::errors::AgentrailError;
use crate::tracker::ExecutionMetrics;

pub async fn get_metrics(
    State(state): State<AppState>,
    Query(query): Query<MetricsQuery>,
) -> Result<Json<ExecutionMetrics>, AgentrailError> {
    let filter = query.into_filter()?;
    Ok(Json(state.manager.tracker().get_execution_metrics(&filter).await?))
}
