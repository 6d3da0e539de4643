pub mod types;
pub mod classification;

pub use types::AgentrailError;
pub use classification::ErrorClassification;
