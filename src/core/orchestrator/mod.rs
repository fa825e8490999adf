//! Proxy enable/disable and health-check-driven profile selection

pub mod errors;
pub mod service;

pub use errors::OrchestratorError;
pub use service::{AutoSwitchOutcome, Clock, Orchestrator, OrchestratorOptions};
