pub mod execution_tracker;
pub mod metrics;
pub mod store;
pub mod types;

pub use execution_tracker::ExecutionTracker;
pub use store::ExecutionStore;
pub use types::*;
