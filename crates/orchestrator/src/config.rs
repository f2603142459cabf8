//! Batch scheduling settings

use crate::error::{OrchestratorError, Result};
use bioresolve_core::config::BatchConfig;
use std::time::Duration;

/// Validated scheduling parameters for one orchestrator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSettings {
    concurrency_limit: usize,
    inter_window_delay: Duration,
    task_timeout: Option<Duration>,
}

impl BatchSettings {
    pub fn new(
        concurrency_limit: usize,
        inter_window_delay: Duration,
        task_timeout: Option<Duration>,
    ) -> Result<Self> {
        if concurrency_limit == 0 {
            return Err(OrchestratorError::InvalidConfig(
                "concurrency_limit must be greater than 0".to_string(),
            ));
        }
        if task_timeout.is_some_and(|t| t.is_zero()) {
            return Err(OrchestratorError::InvalidConfig(
                "task_timeout must be greater than 0 when set".to_string(),
            ));
        }
        Ok(Self {
            concurrency_limit,
            inter_window_delay,
            task_timeout,
        })
    }

    pub fn from_config(config: &BatchConfig) -> Result<Self> {
        Self::new(
            config.concurrency_limit,
            config.inter_window_delay(),
            config.task_timeout(),
        )
    }

    pub fn concurrency_limit(&self) -> usize {
        self.concurrency_limit
    }

    pub fn inter_window_delay(&self) -> Duration {
        self.inter_window_delay
    }

    pub fn task_timeout(&self) -> Option<Duration> {
        self.task_timeout
    }
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            concurrency_limit: 3,
            inter_window_delay: Duration::from_millis(800),
            task_timeout: None,
        }
    }
}
