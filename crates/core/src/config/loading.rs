//! Configuration loading from files and environment variables

use crate::error::{Error, Result};
use config::{Config as ConfigLib, ConfigBuilder as LibConfigBuilder, Environment, File};
use std::path::Path;
use tracing::debug;

use super::defaults::*;
use super::{global_config_path, Config};

/// Helper to set a config default with consistent error mapping
fn set_config_default<T: Into<config::Value>>(
    builder: LibConfigBuilder<config::builder::DefaultState>,
    key: &str,
    value: T,
) -> Result<LibConfigBuilder<config::builder::DefaultState>> {
    builder
        .set_default(key, value)
        .map_err(|e| Error::config(format!("Failed to set {key} default: {e}")))
}

impl Config {
    /// Loads configuration from a TOML file with environment variable overrides
    ///
    /// Environment variables are prefixed with `BIORESOLVE_` and use double underscores
    /// for nested values. For example:
    /// - `BIORESOLVE_GATEWAY__PROVIDER=mock`
    /// - `BIORESOLVE_BATCH__CONCURRENCY_LIMIT=5`
    pub fn from_file(path: &Path) -> Result<Self> {
        let builder = ConfigLib::builder();

        // config crate doesn't apply serde defaults for keys overridden from env
        let builder = set_config_default(builder, "gateway.provider", default_provider())?;
        let builder = set_config_default(builder, "gateway.model", default_model())?;
        let builder = set_config_default(
            builder,
            "gateway.timeout_secs",
            default_gateway_timeout_secs() as i64,
        )?;
        let builder = set_config_default(
            builder,
            "gateway.temperature",
            f64::from(default_temperature()),
        )?;
        let builder = set_config_default(
            builder,
            "batch.concurrency_limit",
            default_concurrency_limit() as i64,
        )?;
        let builder = set_config_default(
            builder,
            "batch.inter_window_delay_ms",
            default_inter_window_delay_ms() as i64,
        )?;
        let mut builder = set_config_default(
            builder,
            "resolution.ontology_enabled",
            default_ontology_enabled(),
        )?;

        // Add the config file if it exists
        if path.exists() {
            debug!("Loading configuration from {}", path.display());
            builder = builder.add_source(File::from(path));
        }

        builder = builder.add_source(
            Environment::with_prefix("BIORESOLVE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder
            .build()
            .map_err(|e| Error::config(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| Error::config(format!("Failed to deserialize config: {e}")))
    }

    /// Creates a config from a TOML string (useful for testing)
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::config(format!("Failed to parse TOML: {e}")))
    }

    /// Load configuration from a single file
    ///
    /// Precedence (lowest to highest):
    /// 1. Hardcoded defaults
    /// 2. Config file (~/.bioresolve/config.toml or custom --config path)
    /// 3. Environment variables (BIORESOLVE_*)
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let path = match config_path {
            Some(p) => p.to_path_buf(),
            None => global_config_path()?,
        };
        Self::from_file(&path)
    }
}
