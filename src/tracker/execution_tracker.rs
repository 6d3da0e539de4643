use std::sync::Arc;
use chrono::{DateTime, SubsecRound, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use crate::agents::{AgentInput, AgentOutput, Payload};
use crate::engine::AgentChain;
use crate::errors::AgentrailError;
use super::metrics::compute_metrics;
use super::store::*;
use super::types::*;
use tracing::{debug, info};

/// Current time at the precision the store keeps.
pub(crate) fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

fn encode<T: Serialize>(field: &str, value: &T) -> Result<String, AgentrailError> {
    serde_json::to_string(value).map_err(|e| AgentrailError::serialization(field, e))
}

fn decode<T: DeserializeOwned>(field: &str, text: &str) -> Result<T, AgentrailError> {
    serde_json::from_str(text).map_err(|e| AgentrailError::serialization(field, e))
}

fn corrupt(id: &str, err: AgentrailError) -> AgentrailError {
    AgentrailError::Persistence(format!("record {} is unreadable: {}", id, err))
}

fn execution_from_row(row: ExecutionRow) -> Result<AgentExecution, AgentrailError> {
    let status = row.status.parse::<ExecutionStatus>().map_err(|e| corrupt(&row.id, e))?;
    let input: AgentInput = decode("input", &row.input)?;
    let output: Option<AgentOutput> = row.output.as_deref().map(|o| decode("output", o)).transpose()?;
    let metadata: Payload = decode("metadata", &row.metadata)?;
    Ok(AgentExecution {
        id: row.id,
        agent_type: row.agent_type,
        agent_name: row.agent_name,
        status,
        input,
        output,
        started_at: row.started_at,
        completed_at: row.completed_at,
        duration_ms: row.duration_ms,
        error: row.error,
        user_id: row.user_id,
        parent_execution_id: row.parent_execution_id,
        metadata,
    })
}

/// Durable record keeper for agent and chain executions.
///
/// Every state change is written to the store before the updated record is
/// handed back. Reads return exactly what was written.
pub struct ExecutionTracker {
    store: Arc<dyn ExecutionStore>,
}

impl ExecutionTracker {
    pub fn new(store: Arc<dyn ExecutionStore>) -> Self {
        Self { store }
    }

    pub async fn start_execution(
        &self,
        agent_type: &str,
        agent_name: &str,
        input: &AgentInput,
        user_id: &str,
    ) -> Result<AgentExecution, AgentrailError> {
        let execution = AgentExecution {
            id: uuid::Uuid::new_v4().to_string(),
            agent_type: agent_type.to_string(),
            agent_name: agent_name.to_string(),
            status: ExecutionStatus::Running,
            input: input.clone(),
            output: None,
            started_at: now(),
            completed_at: None,
            duration_ms: None,
            error: String::new(),
            user_id: user_id.to_string(),
            parent_execution_id: input.parent_execution_id.clone(),
            metadata: Payload::new(),
        };

        let row = ExecutionRow {
            id: execution.id.clone(),
            agent_type: execution.agent_type.clone(),
            agent_name: execution.agent_name.clone(),
            status: execution.status.as_str().to_string(),
            input: encode("input", &execution.input)?,
            output: None,
            started_at: execution.started_at,
            completed_at: None,
            duration_ms: None,
            error: String::new(),
            user_id: execution.user_id.clone(),
            parent_execution_id: execution.parent_execution_id.clone(),
            metadata: encode("metadata", &execution.metadata)?,
        };
        self.store.insert_execution(&row).await?;

        debug!(execution_id = %execution.id, agent_type, "Execution started");
        Ok(execution)
    }

    /// Persist the terminal state of an execution and return the stored record.
    ///
    /// A non-empty `error` forces status `failed` whatever `status` says.
    pub async fn update_execution(
        &self,
        execution_id: &str,
        status: ExecutionStatus,
        output: Option<&AgentOutput>,
        error: Option<&str>,
    ) -> Result<AgentExecution, AgentrailError> {
        let row = self
            .store
            .get_execution(execution_id)
            .await?
            .ok_or_else(|| AgentrailError::NotFound(format!("execution '{}'", execution_id)))?;
        let mut execution = execution_from_row(row)?;
        if execution.is_terminal() {
            return Err(AgentrailError::InvalidArgument(format!(
                "execution '{}' is already {}",
                execution_id, execution.status
            )));
        }
        if !status.is_terminal() && error.is_none() {
            return Err(AgentrailError::InvalidArgument(format!(
                "execution '{}' can only move to a terminal status",
                execution_id
            )));
        }

        let output = output.cloned().unwrap_or_default();
        execution.finish(status, output, error, now());

        let update = ExecutionUpdate {
            id: execution.id.clone(),
            status: execution.status.as_str().to_string(),
            output: execution.output.as_ref().map(|o| encode("output", o)).transpose()?,
            completed_at: execution.completed_at.unwrap_or_else(now),
            duration_ms: execution.duration_ms.unwrap_or_default(),
            error: execution.error.clone(),
        };
        if !self.store.update_execution(&update).await? {
            return Err(AgentrailError::NotFound(format!("execution '{}'", execution_id)));
        }

        debug!(
            execution_id,
            status = %execution.status,
            duration_ms = execution.duration_ms.unwrap_or_default(),
            "Execution finished"
        );
        Ok(execution)
    }

    pub async fn get_execution(&self, execution_id: &str) -> Result<AgentExecution, AgentrailError> {
        let row = self
            .store
            .get_execution(execution_id)
            .await?
            .ok_or_else(|| AgentrailError::NotFound(format!("execution '{}'", execution_id)))?;
        execution_from_row(row)
    }

    pub async fn list_executions(&self, filter: &ExecutionFilter) -> Result<Vec<AgentExecution>, AgentrailError> {
        self.store
            .query_executions(filter)
            .await?
            .into_iter()
            .map(execution_from_row)
            .collect()
    }

    pub async fn get_execution_metrics(&self, filter: &MetricsFilter) -> Result<ExecutionMetrics, AgentrailError> {
        if filter.start_date > filter.end_date {
            return Err(AgentrailError::InvalidArgument(format!(
                "metrics start date {} is after end date {}",
                filter.start_date, filter.end_date
            )));
        }
        let samples = self.store.metric_samples(filter).await?;
        let metrics = compute_metrics(&samples, filter);
        info!(
            total = metrics.total_executions,
            successful = metrics.successful_executions,
            "Computed execution metrics"
        );
        Ok(metrics)
    }

    /// Start a chain run. The chain definition is stored with the run so a
    /// resume replays exactly the steps the run began with.
    pub async fn start_chain_execution(
        &self,
        chain: &AgentChain,
        input: &AgentInput,
        user_id: &str,
    ) -> Result<AgentChainExecution, AgentrailError> {
        let execution = AgentChainExecution {
            id: uuid::Uuid::new_v4().to_string(),
            chain_id: chain.id.clone(),
            status: ChainExecutionStatus::Running,
            current_step: 0,
            input: input.clone(),
            step_executions: Vec::new(),
            started_at: now(),
            completed_at: None,
            error: String::new(),
            user_id: user_id.to_string(),
        };
        let row = ChainExecutionRow {
            id: execution.id.clone(),
            chain_id: execution.chain_id.clone(),
            status: execution.status.as_str().to_string(),
            current_step: 0,
            input: encode("input", &execution.input)?,
            chain: encode("chain", chain)?,
            started_at: execution.started_at,
            completed_at: None,
            error: String::new(),
            user_id: execution.user_id.clone(),
        };
        self.store.insert_chain_execution(&row).await?;

        debug!(chain_execution_id = %execution.id, chain_id = %chain.id, "Chain execution started");
        Ok(execution)
    }

    /// Checkpoint a chain execution. `current_step` may not move backwards and a
    /// terminal record is never rewritten. Returns the completion time, if terminal.
    pub async fn update_chain_execution(
        &self,
        chain_execution_id: &str,
        current_step: usize,
        status: ChainExecutionStatus,
        error: Option<&str>,
    ) -> Result<Option<DateTime<Utc>>, AgentrailError> {
        let existing = self
            .store
            .get_chain_execution(chain_execution_id)
            .await?
            .ok_or_else(|| AgentrailError::NotFound(format!("chain execution '{}'", chain_execution_id)))?;
        let existing_status = existing
            .status
            .parse::<ChainExecutionStatus>()
            .map_err(|e| corrupt(chain_execution_id, e))?;
        if existing_status.is_terminal() {
            return Err(AgentrailError::InvalidArgument(format!(
                "chain execution '{}' is already {}",
                chain_execution_id, existing_status
            )));
        }
        if current_step < existing.current_step {
            return Err(AgentrailError::InvalidArgument(format!(
                "chain execution '{}' cannot move back from step {} to {}",
                chain_execution_id, existing.current_step, current_step
            )));
        }

        let completed_at = status.is_terminal().then(now);
        let update = ChainExecutionUpdate {
            id: chain_execution_id.to_string(),
            status: status.as_str().to_string(),
            current_step,
            completed_at,
            error: error.unwrap_or_default().to_string(),
        };
        if !self.store.update_chain_execution(&update).await? {
            return Err(AgentrailError::NotFound(format!("chain execution '{}'", chain_execution_id)));
        }
        debug!(chain_execution_id, current_step, status = %status, "Chain checkpoint written");
        Ok(completed_at)
    }

    /// Append a step execution snapshot to a chain execution.
    pub async fn record_chain_step(
        &self,
        chain_execution_id: &str,
        position: usize,
        execution: &AgentExecution,
    ) -> Result<(), AgentrailError> {
        let snapshot = encode("step_snapshot", execution)?;
        self.store
            .append_chain_step(chain_execution_id, position, &execution.id, &snapshot)
            .await
    }

    pub async fn get_chain_execution(&self, chain_execution_id: &str) -> Result<AgentChainExecution, AgentrailError> {
        let row = self
            .store
            .get_chain_execution(chain_execution_id)
            .await?
            .ok_or_else(|| AgentrailError::NotFound(format!("chain execution '{}'", chain_execution_id)))?;
        self.chain_from_row(row).await
    }

    /// The chain definition a chain execution was started with.
    pub async fn chain_definition(&self, chain_execution_id: &str) -> Result<AgentChain, AgentrailError> {
        let row = self
            .store
            .get_chain_execution(chain_execution_id)
            .await?
            .ok_or_else(|| AgentrailError::NotFound(format!("chain execution '{}'", chain_execution_id)))?;
        decode("chain", &row.chain)
    }

    pub async fn list_chain_executions(
        &self,
        filter: &ChainExecutionFilter,
    ) -> Result<Vec<AgentChainExecution>, AgentrailError> {
        let rows = self.store.query_chain_executions(filter).await?;
        let mut executions = Vec::with_capacity(rows.len());
        for row in rows {
            executions.push(self.chain_from_row(row).await?);
        }
        Ok(executions)
    }

    async fn chain_from_row(&self, row: ChainExecutionRow) -> Result<AgentChainExecution, AgentrailError> {
        let status = row.status.parse::<ChainExecutionStatus>().map_err(|e| corrupt(&row.id, e))?;
        let input: AgentInput = decode("input", &row.input)?;
        let step_executions = self
            .store
            .chain_steps(&row.id)
            .await?
            .iter()
            .map(|snapshot| decode::<AgentExecution>("step_snapshot", snapshot))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(AgentChainExecution {
            id: row.id,
            chain_id: row.chain_id,
            status,
            current_step: row.current_step,
            input,
            step_executions,
            started_at: row.started_at,
            completed_at: row.completed_at,
            error: row.error,
            user_id: row.user_id,
        })
    }
}
