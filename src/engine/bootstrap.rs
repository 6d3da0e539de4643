use std::sync::Arc;
use crate::agents::enabled_agents;
use crate::config::AgentrailConfig;
use crate::db::Database;
use crate::errors::AgentrailError;
use crate::tracker::ExecutionTracker;
use super::Manager;
use tracing::info;

/// Build a manager over `db` with the configured built-in agents and chains registered.
pub async fn build_manager(db: Database, config: &AgentrailConfig) -> Result<Arc<Manager>, AgentrailError> {
    let tracker = Arc::new(ExecutionTracker::new(Arc::new(db)));
    let manager = Arc::new(Manager::new(tracker));

    for agent in enabled_agents(config.agents.enabled.as_deref()) {
        manager.register_agent(agent).await?;
    }
    for chain in &config.chains {
        manager.create_chain(chain.clone()).await.map_err(|e| {
            AgentrailError::Config(format!("chain '{}' could not be created: {}", chain.name, e))
        })?;
    }

    info!(
        agents = manager.list_agents().await.len(),
        chains = config.chains.len(),
        "Manager ready"
    );
    Ok(manager)
}
