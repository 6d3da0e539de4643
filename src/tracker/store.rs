use async_trait::async_trait;
use chrono::{DateTime, Utc};
use crate::errors::AgentrailError;
use super::types::{ChainExecutionFilter, ExecutionFilter, MetricSample, MetricsFilter};

/// An agent execution as stored. Open-ended payloads are kept as encoded JSON text.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionRow {
    pub id: String,
    pub agent_type: String,
    pub agent_name: String,
    pub status: String,
    pub input: String,
    pub output: Option<String>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub duration_ms: Option<u64>,
    pub error: String,
    pub user_id: String,
    pub parent_execution_id: Option<String>,
    pub metadata: String,
}

/// Terminal write-back for an agent execution.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionUpdate {
    pub id: String,
    pub status: String,
    pub output: Option<String>,
    pub completed_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChainExecutionRow {
    pub id: String,
    pub chain_id: String,
    pub status: String,
    pub current_step: usize,
    pub input: String,
    /// The chain definition the run was started with.
    pub chain: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error: String,
    pub user_id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChainExecutionUpdate {
    pub id: String,
    pub status: String,
    pub current_step: usize,
    pub completed_at: Option<DateTime<Utc>>,
    pub error: String,
}

/// Durable store the tracker writes through.
///
/// Implementations must store the JSON text columns verbatim and return
/// `Persistence` errors for any read or write failure.
#[async_trait]
pub trait ExecutionStore: Send + Sync {
    async fn insert_execution(&self, row: &ExecutionRow) -> Result<(), AgentrailError>;

    async fn get_execution(&self, id: &str) -> Result<Option<ExecutionRow>, AgentrailError>;

    /// Returns false when no record has the given id.
    async fn update_execution(&self, update: &ExecutionUpdate) -> Result<bool, AgentrailError>;

    /// Matching executions, newest first, with the filter's pagination applied.
    async fn query_executions(&self, filter: &ExecutionFilter) -> Result<Vec<ExecutionRow>, AgentrailError>;

    async fn metric_samples(&self, filter: &MetricsFilter) -> Result<Vec<MetricSample>, AgentrailError>;

    async fn insert_chain_execution(&self, row: &ChainExecutionRow) -> Result<(), AgentrailError>;

    async fn get_chain_execution(&self, id: &str) -> Result<Option<ChainExecutionRow>, AgentrailError>;

    /// Returns false when no record has the given id.
    async fn update_chain_execution(&self, update: &ChainExecutionUpdate) -> Result<bool, AgentrailError>;

    async fn query_chain_executions(
        &self,
        filter: &ChainExecutionFilter,
    ) -> Result<Vec<ChainExecutionRow>, AgentrailError>;

    async fn append_chain_step(
        &self,
        chain_execution_id: &str,
        position: usize,
        execution_id: &str,
        snapshot: &str,
    ) -> Result<(), AgentrailError>;

    /// Step snapshots of a chain execution, ordered by position.
    async fn chain_steps(&self, chain_execution_id: &str) -> Result<Vec<String>, AgentrailError>;
}
