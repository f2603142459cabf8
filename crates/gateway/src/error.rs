//! Error types for the resolution gateway

use thiserror::Error;

/// Errors a single resolution call can fail with.
///
/// The `Display` text is what ends up in a result row's validation issues, so
/// it is kept short and human-readable.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("API key not configured for provider '{0}'")]
    MissingCredential(String),

    #[error("Request failed ({kind}): {message}")]
    Transport { kind: &'static str, message: String },

    #[error("Provider returned HTTP {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Timed out after {0}s")]
    Timeout(u64),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl GatewayError {
    /// Classify a reqwest error by what went wrong
    pub(crate) fn from_reqwest(e: &reqwest::Error) -> Self {
        let kind = if e.is_timeout() {
            "timeout"
        } else if e.is_connect() {
            "connection"
        } else if e.is_request() {
            "request build"
        } else if e.is_body() {
            "body"
        } else if e.is_decode() {
            "decode"
        } else {
            "unknown"
        };
        Self::Transport {
            kind,
            message: e.to_string(),
        }
    }
}

impl From<GatewayError> for bioresolve_core::error::Error {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Config(msg) => bioresolve_core::error::Error::Config(msg),
            other => bioresolve_core::error::Error::Gateway(other.to_string()),
        }
    }
}

/// Truncate provider text so error messages stay readable in tables
pub(crate) fn truncate_for_error(text: &str) -> String {
    const MAX_ERROR_CHARS: usize = 300;
    let trimmed = text.trim();
    if trimmed.chars().count() <= MAX_ERROR_CHARS {
        return trimmed.to_string();
    }
    let truncated: String = trimmed.chars().take(MAX_ERROR_CHARS).collect();
    format!("{truncated}...")
}
