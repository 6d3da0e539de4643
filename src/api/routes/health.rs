use axum::Json;
use crate::api::models::HealthResponse;

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "agentrail",
        version: env!("CARGO_PKG_VERSION"),
        git_hash: env!("GIT_HASH"),
        built_at: env!("BUILD_TIMESTAMP"),
    })
}
