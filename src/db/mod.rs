pub mod chain_executions;
pub mod connection;
pub mod executions;
pub mod schema;
pub mod store;

pub use connection::Database;
