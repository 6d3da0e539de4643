pub mod agent;
pub mod automation;
pub mod codegen;
pub mod design;
pub mod document;
pub mod registry;
pub mod types;

pub use agent::{Agent, AgentInfo};
pub use registry::{builtin_agents, enabled_agents, BUILTIN_AGENT_TYPES};
pub use types::{AgentFile, AgentInput, AgentOutput, Payload};
