//! Core types for the bioresolve entity resolution system
//!
//! This crate provides the foundational abstractions shared by the gateway,
//! orchestrator and CLI crates:
//!
//! - **Entities**: entity names, resolution context and the structured
//!   resolution payload returned by the backend
//! - **Configuration**: layered configuration loading
//! - **Error handling**: unified error types
//!

pub mod config;
pub mod entities;
pub mod error;

// Re-export main types for convenience
pub use config::{BatchConfig, Config, GatewayConfig, ResolutionDefaults};
pub use entities::{
    EntityName, EntityResolution, EntityTypeHint, ResolutionContext, ResolutionContextBuilder,
};
pub use error::{Error, Result};
