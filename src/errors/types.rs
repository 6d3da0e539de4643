use thiserror::Error;
use crate::agents::AgentOutput;
use crate::tracker::AgentChainExecution;

#[derive(Debug, Error)]
pub enum AgentrailError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Tracking error: {0}")]
    Tracking(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Serialization error in field '{field}': {message}")]
    Serialization { field: String, message: String },

    /// A chain step failed and the step was not marked continue-on-fail.
    /// The partially populated chain execution travels with the error.
    #[error("Chain step {step} ({agent_type}) failed: {message}")]
    StepFailure {
        step: usize,
        agent_type: String,
        message: String,
        execution: Box<AgentChainExecution>,
    },

    #[error("Cancelled: {0}")]
    Cancelled(String),

    #[error("Agent error: {0}")]
    Agent(String),

    /// An agent failed after producing output worth recording.
    #[error("Agent error: {message}")]
    AgentPartial {
        message: String,
        output: Box<AgentOutput>,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AgentrailError {
    pub fn serialization(field: &str, err: impl std::fmt::Display) -> Self {
        Self::Serialization {
            field: field.to_string(),
            message: err.to_string(),
        }
    }

    pub fn agent_partial(message: impl Into<String>, output: AgentOutput) -> Self {
        Self::AgentPartial {
            message: message.into(),
            output: Box::new(output),
        }
    }

    /// Chain execution carried by a step failure, if any.
    pub fn chain_execution(&self) -> Option<&AgentChainExecution> {
        match self {
            Self::StepFailure { execution, .. } => Some(execution),
            _ => None,
        }
    }
}
