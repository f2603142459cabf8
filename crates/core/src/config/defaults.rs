//! Default values and functions for configuration

// Default constants
pub(crate) const DEFAULT_PROVIDER: &str = "openai";
pub(crate) const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub(crate) const DEFAULT_ONTOLOGY: &str = "GO";

/// Providers accepted in `gateway.provider`
pub(crate) const VALID_PROVIDERS: [&str; 3] = ["openai", "local", "mock"];

/// Upper bound for `batch.concurrency_limit`
pub(crate) const MAX_CONCURRENCY_LIMIT: usize = 64;

pub(crate) fn default_provider() -> String {
    DEFAULT_PROVIDER.to_string()
}

pub(crate) fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

pub(crate) fn default_gateway_timeout_secs() -> u64 {
    60
}

pub(crate) fn default_temperature() -> f32 {
    0.0
}

pub(crate) fn default_concurrency_limit() -> usize {
    3
}

pub(crate) fn default_inter_window_delay_ms() -> u64 {
    800 // Eases provider rate limits between windows
}

pub(crate) fn default_ontology() -> Option<String> {
    Some(DEFAULT_ONTOLOGY.to_string())
}

pub(crate) fn default_ontology_enabled() -> bool {
    true
}
