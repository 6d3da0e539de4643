pub mod bootstrap;
pub mod chain;
pub mod context;
pub mod manager;

pub use bootstrap::build_manager;
pub use chain::{AgentChain, AgentChainStep};
pub use manager::Manager;
