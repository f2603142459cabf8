//! Error types for orchestration commands
//!
//! Only pre-flight problems surface as errors. Per-entity failures are data
//! (a result row with validation issues) and never appear here.

use crate::types::Phase;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OrchestratorError {
    #[error("No entities to resolve")]
    EmptyEntityList,

    #[error("API key not configured for provider '{provider}'")]
    MissingCredential { provider: String },

    #[error("Cannot {command} while session is {phase}")]
    InvalidTransition { command: &'static str, phase: Phase },

    #[error("Invalid batch configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, OrchestratorError>;

impl From<OrchestratorError> for bioresolve_core::error::Error {
    fn from(err: OrchestratorError) -> Self {
        match err {
            OrchestratorError::InvalidConfig(msg) => bioresolve_core::error::Error::Config(msg),
            other => bioresolve_core::error::Error::InvalidInput(other.to_string()),
        }
    }
}
