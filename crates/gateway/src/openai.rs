//! OpenAI-compatible chat-completions gateway (OpenAI, Ollama, vLLM, ...)

use crate::error::{truncate_for_error, GatewayError};
use crate::json::extract_json_object;
use crate::prompts;
use crate::ResolutionGateway;
use async_trait::async_trait;
use bioresolve_core::{EntityName, EntityResolution, ResolutionContext};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

pub(crate) const OPENAI_API_BASE_URL: &str = "https://api.openai.com/v1";

/// Request payload for the chat completions API
#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

/// Response from the chat completions API
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Gateway backed by any server speaking the OpenAI chat-completions protocol
pub struct OpenAiCompatibleGateway {
    client: Client,
    provider: String,
    model: String,
    api_base_url: String,
    api_key: Option<String>,
    temperature: f32,
    timeout_secs: u64,
    /// Hosted OpenAI bills per call and needs a key; local servers do not
    paid: bool,
}

impl OpenAiCompatibleGateway {
    /// Create a new gateway
    ///
    /// # Arguments
    /// * `provider` - Provider label used in logs and errors ("openai", "local")
    /// * `model` - Model name (e.g., "gpt-4o-mini")
    /// * `api_base_url` - Base URL ending before `/chat/completions`
    /// * `api_key` - Bearer token, if any
    /// * `timeout_secs` - Request timeout in seconds
    /// * `temperature` - Sampling temperature
    pub fn new(
        provider: impl Into<String>,
        model: impl Into<String>,
        api_base_url: impl Into<String>,
        api_key: Option<String>,
        timeout_secs: u64,
        temperature: f32,
    ) -> Result<Self, GatewayError> {
        let provider = provider.into();
        let model = model.into();
        let api_base_url = api_base_url.into().trim_end_matches('/').to_string();

        info!("Initializing {provider} resolution gateway");
        info!("  Model: {model}");
        info!("  API Base URL: {api_base_url}");
        info!("  Timeout: {timeout_secs}s");

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| GatewayError::Config(format!("Failed to create HTTP client: {e}")))?;

        let paid = provider == "openai";
        Ok(Self {
            client,
            provider,
            model,
            api_base_url,
            api_key,
            temperature,
            timeout_secs,
            paid,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.api_base_url)
    }

    fn build_request<'a>(
        &'a self,
        entity: &EntityName,
        context: &ResolutionContext,
    ) -> ChatCompletionRequest<'a> {
        ChatCompletionRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: prompts::RESOLVE_SYSTEM.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: prompts::render_user_prompt(entity, context),
                },
            ],
            temperature: self.temperature,
            // Local servers vary in JSON-mode support; the reply is parsed leniently anyway
            response_format: self.paid.then_some(ResponseFormat {
                kind: "json_object",
            }),
        }
    }
}

/// Parse the assistant message into a resolution payload
fn parse_resolution(content: &str) -> Result<EntityResolution, GatewayError> {
    let json = extract_json_object(content).ok_or_else(|| {
        GatewayError::MalformedResponse(format!(
            "no JSON object in reply: {}",
            truncate_for_error(content)
        ))
    })?;

    serde_json::from_str(json).map_err(|e| {
        GatewayError::MalformedResponse(format!(
            "{e}. Reply: {}",
            truncate_for_error(content)
        ))
    })
}

#[async_trait]
impl ResolutionGateway for OpenAiCompatibleGateway {
    async fn resolve_entity(
        &self,
        entity: &EntityName,
        context: &ResolutionContext,
    ) -> Result<EntityResolution, GatewayError> {
        if self.paid && self.api_key.is_none() {
            return Err(GatewayError::MissingCredential(self.provider.clone()));
        }

        let request = self.build_request(entity, context);
        debug!(
            entity = %entity,
            deep_search = context.deep_search,
            "Sending resolution request"
        );

        let mut builder = self
            .client
            .post(self.endpoint())
            .header("Content-Type", "application/json")
            .json(&request);
        if let Some(api_key) = &self.api_key {
            builder = builder.bearer_auth(api_key);
        }

        let response = builder.send().await.map_err(|e| {
            warn!(entity = %entity, "Resolution request failed: {e}");
            if e.is_timeout() {
                GatewayError::Timeout(self.timeout_secs)
            } else {
                GatewayError::from_reqwest(&e)
            }
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            warn!(entity = %entity, "{} API error {}: {}", self.provider, status, body);
            return Err(GatewayError::Api {
                status: status.as_u16(),
                body: truncate_for_error(&body),
            });
        }

        let completion: ChatCompletionResponse = response.json().await.map_err(|e| {
            GatewayError::MalformedResponse(format!("Failed to parse completion envelope: {e}"))
        })?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                GatewayError::MalformedResponse("completion contained no message".to_string())
            })?;

        parse_resolution(&content)
    }

    fn provider_name(&self) -> &str {
        &self.provider
    }

    fn requires_credential(&self) -> bool {
        self.paid
    }

    fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }
}
