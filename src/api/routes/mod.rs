pub mod agents;
pub mod chains;
pub mod executions;
pub mod health;
pub mod metrics;
