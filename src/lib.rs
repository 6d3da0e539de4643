pub mod agents;
pub mod api;
pub mod cli;
pub mod config;
pub mod db;
pub mod engine;
pub mod errors;
pub mod tracker;
pub mod utils;
