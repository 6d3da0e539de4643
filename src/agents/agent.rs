use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use crate::errors::AgentrailError;
use super::types::{AgentInput, AgentOutput};

#[async_trait]
pub trait Agent: Send + Sync {
    /// Type tag the agent is registered under
    fn agent_type(&self) -> &str;

    /// Human-readable name, denormalized into each execution record
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// Check the input without side effects
    fn validate(&self, input: &AgentInput) -> Result<(), AgentrailError>;

    /// Perform the work. Only called with input that passed `validate`.
    async fn run(
        &self,
        ctx: &CancellationToken,
        input: &AgentInput,
    ) -> Result<AgentOutput, AgentrailError>;

    /// Validate, then run. A validation failure is returned as the execution error
    /// and the caller records it like any other failed run.
    async fn execute(
        &self,
        ctx: &CancellationToken,
        input: &AgentInput,
    ) -> Result<AgentOutput, AgentrailError> {
        self.validate(input)?;
        if ctx.is_cancelled() {
            return Err(AgentrailError::Cancelled(format!(
                "{} cancelled before start",
                self.agent_type()
            )));
        }
        self.run(ctx, input).await
    }
}

/// Registry-facing summary of an agent.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AgentInfo {
    pub agent_type: String,
    pub name: String,
    pub description: String,
}

impl AgentInfo {
    pub fn of(agent: &dyn Agent) -> Self {
        Self {
            agent_type: agent.agent_type().to_string(),
            name: agent.name().to_string(),
            description: agent.description().to_string(),
        }
    }
}
