//! Configuration module for bioresolve
//!
//! Configuration can be loaded from TOML files and/or environment variables.
//! Precedence (lowest to highest): hardcoded defaults, config file,
//! `BIORESOLVE_*` environment variables.

mod defaults;
mod loading;


use crate::entities::ResolutionContext;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use defaults::*;

/// Returns the path to the global configuration file
///
/// The global config is stored at `~/.bioresolve/config.toml`.
pub fn global_config_path() -> Result<PathBuf> {
    let home_dir = dirs::home_dir()
        .ok_or_else(|| Error::config("Unable to determine home directory".to_string()))?;
    Ok(home_dir.join(".bioresolve").join("config.toml"))
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Resolution backend configuration
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Batch scheduling configuration
    #[serde(default)]
    pub batch: BatchConfig,

    /// Default resolution context
    #[serde(default)]
    pub resolution: ResolutionDefaults,
}

/// Configuration for the LLM resolution backend
///
/// # Providers
/// - `openai` (default): OpenAI chat completions, requires an API key (OPENAI_API_KEY env var)
/// - `local`: any OpenAI-compatible server (Ollama, vLLM) reachable at `api_base_url`
/// - `mock`: deterministic offline provider for testing
#[derive(Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Provider type: "openai" (default), "local", "mock"
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Model name to use
    #[serde(default = "default_model")]
    pub model: String,

    /// API base URL (provider default when unset)
    #[serde(default)]
    pub api_base_url: Option<String>,

    /// API key (uses OPENAI_API_KEY env if not set)
    #[serde(default)]
    pub api_key: Option<String>,

    /// HTTP request timeout in seconds
    #[serde(default = "default_gateway_timeout_secs")]
    pub timeout_secs: u64,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("api_base_url", &self.api_base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "***REDACTED***"))
            .field("timeout_secs", &self.timeout_secs)
            .field("temperature", &self.temperature)
            .finish()
    }
}

impl GatewayConfig {
    /// API key from config, falling back to the OPENAI_API_KEY env var
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .filter(|key| !key.trim().is_empty())
    }
}

/// Batch scheduling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Entities resolved concurrently within one window
    #[serde(default = "default_concurrency_limit")]
    pub concurrency_limit: usize,

    /// Pause between windows in milliseconds
    #[serde(default = "default_inter_window_delay_ms")]
    pub inter_window_delay_ms: u64,

    /// Optional per-entity timeout; a hung call stalls its window when unset
    #[serde(default)]
    pub task_timeout_secs: Option<u64>,
}

impl BatchConfig {
    pub fn inter_window_delay(&self) -> Duration {
        Duration::from_millis(self.inter_window_delay_ms)
    }

    pub fn task_timeout(&self) -> Option<Duration> {
        self.task_timeout_secs.map(Duration::from_secs)
    }
}

/// Defaults applied to every resolution request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolutionDefaults {
    /// Ontology selection, e.g. "GO"
    #[serde(default = "default_ontology")]
    pub ontology: Option<String>,

    /// Whether ontology annotation is requested
    #[serde(default = "default_ontology_enabled")]
    pub ontology_enabled: bool,
}

impl ResolutionDefaults {
    /// Resolution context seeded from these defaults
    pub fn to_context(&self) -> ResolutionContext {
        ResolutionContext {
            ontology: self.ontology.clone(),
            ontology_enabled: self.ontology_enabled,
            ..ResolutionContext::default()
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            api_base_url: None,
            api_key: None,
            timeout_secs: default_gateway_timeout_secs(),
            temperature: default_temperature(),
        }
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            concurrency_limit: default_concurrency_limit(),
            inter_window_delay_ms: default_inter_window_delay_ms(),
            task_timeout_secs: None,
        }
    }
}

impl Default for ResolutionDefaults {
    fn default() -> Self {
        Self {
            ontology: default_ontology(),
            ontology_enabled: default_ontology_enabled(),
        }
    }
}

impl Config {
    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        if !VALID_PROVIDERS.contains(&self.gateway.provider.as_str()) {
            return Err(Error::config(format!(
                "Invalid provider '{}'. Must be one of: {:?}",
                self.gateway.provider, VALID_PROVIDERS
            )));
        }

        if self.gateway.model.trim().is_empty() {
            return Err(Error::config("gateway.model cannot be empty".to_string()));
        }

        if self.gateway.timeout_secs == 0 {
            return Err(Error::config(
                "gateway.timeout_secs must be greater than 0".to_string(),
            ));
        }

        if !(0.0..=2.0).contains(&self.gateway.temperature) {
            return Err(Error::config(format!(
                "gateway.temperature must be between 0.0 and 2.0, got {}",
                self.gateway.temperature
            )));
        }

        if self.gateway.provider == "local" && self.gateway.api_base_url.is_none() {
            return Err(Error::config(
                "gateway.api_base_url is required for the local provider".to_string(),
            ));
        }

        if self.batch.concurrency_limit == 0 {
            return Err(Error::config(
                "batch.concurrency_limit must be greater than 0".to_string(),
            ));
        }
        if self.batch.concurrency_limit > MAX_CONCURRENCY_LIMIT {
            return Err(Error::config(format!(
                "batch.concurrency_limit too large (max {MAX_CONCURRENCY_LIMIT}, got {})",
                self.batch.concurrency_limit
            )));
        }

        if self.batch.task_timeout_secs == Some(0) {
            return Err(Error::config(
                "batch.task_timeout_secs must be greater than 0 when set".to_string(),
            ));
        }

        Ok(())
    }
}
