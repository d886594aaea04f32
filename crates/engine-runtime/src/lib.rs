pub mod error;
pub mod orchestrator;
pub mod workers;
