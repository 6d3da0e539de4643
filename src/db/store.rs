use async_trait::async_trait;
use crate::errors::AgentrailError;
use crate::tracker::store::*;
use crate::tracker::types::{ChainExecutionFilter, ExecutionFilter, MetricSample, MetricsFilter};
use super::Database;

#[async_trait]
impl ExecutionStore for Database {
    async fn insert_execution(&self, row: &ExecutionRow) -> Result<(), AgentrailError> {
        Database::insert_execution(self, row)
    }

    async fn get_execution(&self, id: &str) -> Result<Option<ExecutionRow>, AgentrailError> {
        Database::get_execution(self, id)
    }

    async fn update_execution(&self, update: &ExecutionUpdate) -> Result<bool, AgentrailError> {
        Database::update_execution(self, update)
    }

    async fn query_executions(&self, filter: &ExecutionFilter) -> Result<Vec<ExecutionRow>, AgentrailError> {
        Database::query_executions(self, filter)
    }

    async fn metric_samples(&self, filter: &MetricsFilter) -> Result<Vec<MetricSample>, AgentrailError> {
        Database::metric_samples(self, filter)
    }

    async fn insert_chain_execution(&self, row: &ChainExecutionRow) -> Result<(), AgentrailError> {
        Database::insert_chain_execution(self, row)
    }

    async fn get_chain_execution(&self, id: &str) -> Result<Option<ChainExecutionRow>, AgentrailError> {
        Database::get_chain_execution(self, id)
    }

    async fn update_chain_execution(&self, update: &ChainExecutionUpdate) -> Result<bool, AgentrailError> {
        Database::update_chain_execution(self, update)
    }

    async fn query_chain_executions(
        &self,
        filter: &ChainExecutionFilter,
    ) -> Result<Vec<ChainExecutionRow>, AgentrailError> {
        Database::query_chain_executions(self, filter)
    }

    async fn append_chain_step(
        &self,
        chain_execution_id: &str,
        position: usize,
        execution_id: &str,
        snapshot: &str,
    ) -> Result<(), AgentrailError> {
        Database::append_chain_step(self, chain_execution_id, position, execution_id, snapshot)
    }

    async fn chain_steps(&self, chain_execution_id: &str) -> Result<Vec<String>, AgentrailError> {
        Database::chain_steps(self, chain_execution_id)
    }
}
