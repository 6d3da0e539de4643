pub mod auth;
pub mod errors;
pub mod models;
pub mod routes;

use std::sync::Arc;
use axum::routing::{get, post};
use axum::Router;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use crate::config::AgentrailConfig;
use crate::db::Database;
use crate::engine::{build_manager, Manager};
use crate::errors::AgentrailError;

#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<Manager>,
    /// Cancelled on shutdown; every run started through the API gets a child token.
    pub shutdown: CancellationToken,
    pub api_token: Option<String>,
}

impl AppState {
    pub fn new(manager: Arc<Manager>) -> Self {
        Self {
            manager,
            shutdown: CancellationToken::new(),
            api_token: None,
        }
    }

    pub fn with_api_token(mut self, token: Option<String>) -> Self {
        self.api_token = token.filter(|t| !t.is_empty());
        self
    }
}

pub async fn create_app_state(config: &AgentrailConfig) -> Result<AppState, AgentrailError> {
    let db = Database::new(&config.database.path)?;
    let manager = build_manager(db, config).await?;
    Ok(AppState::new(manager).with_api_token(config.server.api_token.clone()))
}

pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/api/agents", get(routes::agents::list_agents))
        .route("/api/agents/:agent_type/execute", post(routes::agents::execute_agent))
        .route("/api/chains", get(routes::chains::list_chains).post(routes::chains::create_chain))
        .route("/api/chains/:id", get(routes::chains::get_chain))
        .route("/api/chains/:id/execute", post(routes::chains::execute_chain))
        .route("/api/chain-executions", get(routes::chains::list_chain_executions))
        .route("/api/chain-executions/:id", get(routes::chains::get_chain_execution))
        .route("/api/chain-executions/:id/resume", post(routes::chains::resume_chain))
        .route("/api/executions", get(routes::executions::list_executions))
        .route("/api/executions/:id", get(routes::executions::get_execution))
        .route("/api/metrics", get(routes::metrics::get_metrics))
        .route_layer(axum::middleware::from_fn_with_state(state.clone(), auth::api_auth_middleware));

    Router::new()
        .route("/api/health", get(routes::health::health_check))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
