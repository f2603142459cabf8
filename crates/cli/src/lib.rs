//! Library interface for the bioresolve CLI
//!
//! This module exposes the command building blocks for integration testing
//! while keeping argument parsing in main.rs.

pub mod export;
pub mod input;
pub mod progress;
pub mod run;
pub mod session_store;

// Re-export commonly needed types for tests
pub use anyhow::Result;
pub use bioresolve_core::config::Config;
