//! Batch resolution orchestrator
//!
//! Drives a list of entity names through a two-phase pipeline: an initial
//! pass with bounded concurrency, then an optional deep-search retry of the
//! rows that came back with validation issues.
//!
//! # Public API
//!
//! ## Main Entry Point
//! - [`Orchestrator`] - Owns the session and exposes the commands
//! - [`StopHandle`] - Requests cancellation from another task
//!
//! ## Models
//! - [`SessionSnapshot`] - Read-only view published after every window
//! - [`ResultSet`] / [`ResultRecord`] - Ordered result rows
//! - [`Phase`] - Session lifecycle
//! - [`BatchMetrics`] - Derived counts and timings
//!
//! ## Building Blocks
//! - [`BatchScheduler`] - Windowed scheduling, usable without a session
//! - [`merge`] - Result aggregation
//!
//! ## Configuration and Errors
//! - [`BatchSettings`], [`OrchestratorError`], [`Result`]

#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

mod aggregator;
mod config;
mod error;
mod metrics;
mod scheduler;
mod session;
mod task;
mod types;

pub use aggregator::{merge, MergeReport, ResultSet};
pub use config::BatchSettings;
pub use error::{OrchestratorError, Result};
pub use metrics::BatchMetrics;
pub use scheduler::{partition_windows, BatchScheduler, BatchSummary};
pub use session::{Orchestrator, StopHandle};
pub use types::{
    Phase, PhaseReport, ResolutionOutcome, ResultRecord, SessionSnapshot, WindowProgress,
    FAILURE_PREFIX,
};
