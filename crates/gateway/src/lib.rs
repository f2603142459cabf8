//! Resolution gateway: the single call that turns an entity name into a
//! structured resolution
//!
//! The orchestrator treats the gateway as an opaque, possibly slow, possibly
//! failing async capability. This crate provides the trait, an
//! OpenAI-compatible provider, a scripted mock and a factory.

#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

use async_trait::async_trait;
use bioresolve_core::config::GatewayConfig;
use bioresolve_core::error::{Error, Result};
use bioresolve_core::{EntityName, EntityResolution, ResolutionContext};
use std::sync::Arc;
use tracing::{info, warn};

pub mod error;
mod json;
mod mock;
mod openai;
mod prompts;

pub use error::GatewayError;
pub use mock::{CallHook, MockCall, MockResolutionGateway};
pub use openai::OpenAiCompatibleGateway;

/// Trait for resolution backends
///
/// Implementations receive the context unchanged from the caller and either
/// return the backend's payload verbatim or fail with a human-readable error.
#[async_trait]
pub trait ResolutionGateway: Send + Sync {
    /// Resolve one entity name
    async fn resolve_entity(
        &self,
        entity: &EntityName,
        context: &ResolutionContext,
    ) -> std::result::Result<EntityResolution, GatewayError>;

    /// Provider label for logs and error messages
    fn provider_name(&self) -> &str;

    /// Whether the provider refuses to work without a credential
    fn requires_credential(&self) -> bool {
        false
    }

    /// Whether a credential is configured
    fn has_credential(&self) -> bool {
        true
    }
}

/// Create a resolution gateway based on configuration
///
/// A paid provider without a key is still constructed; callers check
/// [`ResolutionGateway::has_credential`] before starting a batch.
pub fn create_resolution_gateway(config: &GatewayConfig) -> Result<Arc<dyn ResolutionGateway>> {
    match config.provider.as_str() {
        "openai" => {
            let api_key = config.resolve_api_key();
            if api_key.is_none() {
                warn!("No OpenAI API key configured. Set gateway.api_key or OPENAI_API_KEY");
            }
            let api_base_url = config
                .api_base_url
                .clone()
                .unwrap_or_else(|| openai::OPENAI_API_BASE_URL.to_string());

            let gateway = OpenAiCompatibleGateway::new(
                "openai",
                config.model.clone(),
                api_base_url,
                api_key,
                config.timeout_secs,
                config.temperature,
            )?;
            Ok(Arc::new(gateway))
        }
        "local" => {
            let api_base_url = config.api_base_url.clone().ok_or_else(|| {
                Error::config("gateway.api_base_url is required for the local provider")
            })?;

            let gateway = OpenAiCompatibleGateway::new(
                "local",
                config.model.clone(),
                api_base_url,
                config.api_key.clone(),
                config.timeout_secs,
                config.temperature,
            )?;
            Ok(Arc::new(gateway))
        }
        "mock" => {
            info!("Creating mock resolution gateway");
            Ok(Arc::new(MockResolutionGateway::new()))
        }
        other => Err(Error::config(format!(
            "Unknown gateway provider: '{other}'. Valid providers: openai, local, mock"
        ))),
    }
}
