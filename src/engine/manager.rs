use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use crate::agents::{Agent, AgentInfo, AgentInput, AgentOutput, Payload};
use crate::errors::AgentrailError;
use crate::tracker::execution_tracker::now;
use crate::tracker::{
    AgentChainExecution, AgentExecution, ChainExecutionStatus, ExecutionStatus, ExecutionTracker,
};
use super::chain::AgentChain;
use super::context::{absorb_step_output, build_step_input, replay};
use tracing::{debug, error, info, warn};

fn tracking(action: &'static str) -> impl Fn(AgentrailError) -> AgentrailError {
    move |e| AgentrailError::Tracking(format!("could not {}: {}", action, e))
}

/// Runs agents and chains and records every run through the tracker.
///
/// Registry and chain store locks are held only for the map access itself,
/// never across an agent run or a tracker call.
pub struct Manager {
    agents: RwLock<HashMap<String, Arc<dyn Agent>>>,
    chains: RwLock<HashMap<String, AgentChain>>,
    tracker: Arc<ExecutionTracker>,
}

impl Manager {
    pub fn new(tracker: Arc<ExecutionTracker>) -> Self {
        Self {
            agents: RwLock::new(HashMap::new()),
            chains: RwLock::new(HashMap::new()),
            tracker,
        }
    }

    pub fn tracker(&self) -> &Arc<ExecutionTracker> {
        &self.tracker
    }

    /// Register an agent under its type tag. A later registration for the same tag wins.
    pub async fn register_agent(&self, agent: Arc<dyn Agent>) -> Result<(), AgentrailError> {
        let agent_type = agent.agent_type().to_string();
        if agent_type.trim().is_empty() {
            return Err(AgentrailError::InvalidArgument("agent has an empty type tag".into()));
        }
        let replaced = self.agents.write().await.insert(agent_type.clone(), agent).is_some();
        info!(agent_type = %agent_type, replaced, "Agent registered");
        Ok(())
    }

    pub async fn get_agent(&self, agent_type: &str) -> Result<Arc<dyn Agent>, AgentrailError> {
        self.agents
            .read()
            .await
            .get(agent_type)
            .cloned()
            .ok_or_else(|| AgentrailError::NotFound(format!("agent type '{}'", agent_type)))
    }

    /// Registered agents ordered by type tag.
    pub async fn list_agents(&self) -> Vec<AgentInfo> {
        let mut infos: Vec<AgentInfo> = self
            .agents
            .read()
            .await
            .values()
            .map(|agent| AgentInfo::of(agent.as_ref()))
            .collect();
        infos.sort_by(|a, b| a.agent_type.cmp(&b.agent_type));
        infos
    }

    /// Run one agent and record the run.
    ///
    /// Returns `Ok` whenever a tracking record was started, including when the
    /// agent failed: check `status` and `error` on the returned execution.
    /// `Err` means the agent type is unknown or the start could not be recorded.
    pub async fn execute_agent(
        &self,
        ctx: &CancellationToken,
        agent_type: &str,
        input: &AgentInput,
        user_id: &str,
    ) -> Result<AgentExecution, AgentrailError> {
        let agent = self.get_agent(agent_type).await?;
        let mut execution = self
            .tracker
            .start_execution(agent_type, agent.name(), input, user_id)
            .await
            .map_err(tracking("record execution start"))?;
        info!(execution_id = %execution.id, agent_type, user_id, "Agent execution started");

        let (status, output, err) = match agent.execute(ctx, input).await {
            Ok(output) => (ExecutionStatus::Completed, output, None),
            Err(e) => {
                warn!(execution_id = %execution.id, agent_type, error = %e, "Agent execution failed");
                (ExecutionStatus::Failed, AgentOutput::failed(&e), Some(e.to_string()))
            }
        };

        match self
            .tracker
            .update_execution(&execution.id, status, Some(&output), err.as_deref())
            .await
        {
            Ok(stored) => execution = stored,
            Err(e) => {
                error!(
                    execution_id = %execution.id,
                    error = %e,
                    "Failed to persist terminal execution state"
                );
                execution.finish(status, output, err.as_deref(), now());
            }
        }

        info!(
            execution_id = %execution.id,
            agent_type,
            status = %execution.status,
            duration_ms = execution.duration_ms.unwrap_or_default(),
            "Agent execution finished"
        );
        Ok(execution)
    }

    /// Validate and store a chain. Steps are put in `order`; an empty id gets a fresh one.
    pub async fn create_chain(&self, mut chain: AgentChain) -> Result<AgentChain, AgentrailError> {
        {
            let agents = self.agents.read().await;
            if let Some(step) = chain.steps.iter().find(|s| !agents.contains_key(&s.agent_type)) {
                return Err(AgentrailError::InvalidArgument(format!(
                    "chain step '{}' references unregistered agent type '{}'",
                    step.name, step.agent_type
                )));
            }
        }
        if chain.id.trim().is_empty() {
            chain.id = uuid::Uuid::new_v4().to_string();
        }
        chain.steps.sort_by_key(|s| s.order);
        let created = now();
        chain.created_at = created;
        chain.updated_at = created;

        let mut chains = self.chains.write().await;
        if chains.contains_key(&chain.id) {
            return Err(AgentrailError::InvalidArgument(format!("chain '{}' already exists", chain.id)));
        }
        chains.insert(chain.id.clone(), chain.clone());
        drop(chains);

        info!(chain_id = %chain.id, steps = chain.steps.len(), "Chain created");
        Ok(chain)
    }

    pub async fn get_chain(&self, chain_id: &str) -> Result<AgentChain, AgentrailError> {
        self.chains
            .read()
            .await
            .get(chain_id)
            .cloned()
            .ok_or_else(|| AgentrailError::NotFound(format!("chain '{}'", chain_id)))
    }

    /// Stored chains, oldest first.
    pub async fn list_chains(&self) -> Vec<AgentChain> {
        let mut chains: Vec<AgentChain> = self.chains.read().await.values().cloned().collect();
        chains.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        chains
    }

    /// Run every step of a chain in order.
    ///
    /// A failing step stops the chain with `StepFailure`, which carries the
    /// partially populated chain execution, unless the step is continue-on-fail.
    /// Cancellation is checked before each step; the running step is never interrupted.
    pub async fn execute_chain(
        &self,
        ctx: &CancellationToken,
        chain_id: &str,
        input: &AgentInput,
        user_id: &str,
    ) -> Result<AgentChainExecution, AgentrailError> {
        let chain = self.get_chain(chain_id).await?;
        let execution = self
            .tracker
            .start_chain_execution(&chain, input, user_id)
            .await
            .map_err(tracking("record chain start"))?;
        info!(
            chain_execution_id = %execution.id,
            chain_id,
            steps = chain.steps.len(),
            "Chain execution started"
        );
        self.run_steps(ctx, &chain, execution, 0, Payload::new(), input.clone()).await
    }

    /// Continue a chain execution left `running` from its last recorded step.
    ///
    /// Steps come from the definition stored with the run, not from the chain
    /// store, so a chain redefined since the run started does not change it.
    pub async fn resume_chain(
        &self,
        ctx: &CancellationToken,
        chain_execution_id: &str,
    ) -> Result<AgentChainExecution, AgentrailError> {
        let execution = self.tracker.get_chain_execution(chain_execution_id).await?;
        if execution.is_terminal() {
            return Err(AgentrailError::InvalidArgument(format!(
                "chain execution '{}' is already {}",
                chain_execution_id, execution.status
            )));
        }
        let chain = self.tracker.chain_definition(chain_execution_id).await?;
        let start = execution.step_executions.len();
        if start > chain.steps.len() {
            return Err(AgentrailError::Internal(format!(
                "chain execution '{}' recorded {} steps but chain '{}' has {}",
                chain_execution_id,
                start,
                chain.id,
                chain.steps.len()
            )));
        }

        // A fatal step whose failure was recorded but never checkpointed.
        let unrecorded_failure = match (execution.step_executions.last(), start.checked_sub(1)) {
            (Some(last), Some(i)) if last.status == ExecutionStatus::Failed && !chain.steps[i].continue_on_fail => {
                Some((i, last.error.clone()))
            }
            _ => None,
        };
        if let Some((i, message)) = unrecorded_failure {
            return Err(self.abort_chain(execution, i, &chain.steps[i].agent_type, message).await);
        }

        let (running_context, current_input) = replay(&execution.input, &execution.step_executions);
        info!(chain_execution_id, chain_id = %chain.id, from_step = start, "Resuming chain execution");
        self.run_steps(ctx, &chain, execution, start, running_context, current_input).await
    }

    async fn run_steps(
        &self,
        ctx: &CancellationToken,
        chain: &AgentChain,
        mut execution: AgentChainExecution,
        start: usize,
        mut running_context: Payload,
        mut current_input: AgentInput,
    ) -> Result<AgentChainExecution, AgentrailError> {
        let user_id = execution.user_id.clone();

        for (i, step) in chain.steps.iter().enumerate().skip(start) {
            if ctx.is_cancelled() {
                let message = format!("chain cancelled before step {}", i);
                self.checkpoint(&mut execution, i, ChainExecutionStatus::Cancelled, Some(&message)).await?;
                warn!(chain_execution_id = %execution.id, step = i, "Chain execution cancelled");
                return Err(AgentrailError::Cancelled(message));
            }
            self.checkpoint(&mut execution, i, ChainExecutionStatus::Running, None).await?;

            let step_input = build_step_input(step, &current_input, &running_context, &execution.id);
            debug!(chain_execution_id = %execution.id, step = i, agent_type = %step.agent_type, "Running chain step");
            let step_execution = match self.execute_agent(ctx, &step.agent_type, &step_input, &user_id).await {
                Ok(step_execution) => step_execution,
                Err(e) => return Err(self.abort_chain(execution, i, &step.agent_type, e.to_string()).await),
            };

            self.tracker
                .record_chain_step(&execution.id, i, &step_execution)
                .await
                .map_err(tracking("record chain step"))?;
            let failed = step_execution.status == ExecutionStatus::Failed;
            let step_error = step_execution.error.clone();
            absorb_step_output(&mut running_context, &mut current_input, i, step_execution.output.as_ref());
            execution.step_executions.push(step_execution);

            if failed {
                if !step.continue_on_fail {
                    return Err(self.abort_chain(execution, i, &step.agent_type, step_error).await);
                }
                warn!(
                    chain_execution_id = %execution.id,
                    step = i,
                    agent_type = %step.agent_type,
                    error = %step_error,
                    "Chain step failed, continuing"
                );
            }
        }

        self.checkpoint(&mut execution, chain.steps.len(), ChainExecutionStatus::Completed, None).await?;
        info!(
            chain_execution_id = %execution.id,
            chain_id = %chain.id,
            steps = execution.step_executions.len(),
            "Chain execution completed"
        );
        Ok(execution)
    }

    /// Persist a chain checkpoint, then mirror it on the in-memory record.
    async fn checkpoint(
        &self,
        execution: &mut AgentChainExecution,
        step: usize,
        status: ChainExecutionStatus,
        error: Option<&str>,
    ) -> Result<(), AgentrailError> {
        let completed_at = self
            .tracker
            .update_chain_execution(&execution.id, step, status, error)
            .await
            .map_err(tracking("checkpoint chain execution"))?;
        execution.current_step = step;
        execution.status = status;
        execution.error = error.unwrap_or_default().to_string();
        execution.completed_at = completed_at;
        Ok(())
    }

    /// Mark the chain execution failed at `step` and build the error for the caller.
    async fn abort_chain(
        &self,
        mut execution: AgentChainExecution,
        step: usize,
        agent_type: &str,
        message: String,
    ) -> AgentrailError {
        let recorded = format!("step {} ({}) failed: {}", step, agent_type, message);
        if let Err(e) = self
            .checkpoint(&mut execution, step, ChainExecutionStatus::Failed, Some(&recorded))
            .await
        {
            return e;
        }
        error!(chain_execution_id = %execution.id, step, agent_type, error = %message, "Chain execution failed");
        AgentrailError::StepFailure {
            step,
            agent_type: agent_type.to_string(),
            message,
            execution: Box::new(execution),
        }
    }
}
