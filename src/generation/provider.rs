//! Text-generation provider boundary.
//!
//! The orchestrator only sees [`GenerationProvider`]: a prompt goes in, a
//! success/failure envelope comes out. Transport errors surface as `Err` and
//! are classified by the retry executor like any other provider failure.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use tracing::{debug, warn};

use crate::config::ProviderConfig;
use crate::PlotweaveError;

/// One generation call.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderRequest {
    pub provider_id: String,
    pub model: String,
    pub prompt: String,
    pub system: Option<String>,
    pub temperature: Option<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProviderData {
    pub text: String,
}

/// Wire envelope: `{success: true, data: {text}}` or `{success: false, error, details?}`.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProviderEnvelope {
    pub success: bool,
    pub data: Option<ProviderData>,
    pub error: Option<String>,
    pub details: Option<String>,
}

impl ProviderEnvelope {
    pub fn ok(text: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(ProviderData { text: text.into() }),
            error: None,
            details: None,
        }
    }

    pub fn failure(error: impl Into<String>, details: Option<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            details,
        }
    }

    /// Unwrap the generated text, turning a failure envelope into a provider error.
    ///
    /// Whether that error is retried is decided from its message.
    pub fn into_text(self) -> Result<String, PlotweaveError> {
        if !self.success {
            let error = self.error.unwrap_or_else(|| "provider reported failure".into());
            let message = match self.details {
                Some(details) if !details.trim().is_empty() => format!("{}: {}", error, details),
                _ => error,
            };
            return Err(PlotweaveError::provider(message));
        }
        match self.data {
            Some(data) if !data.text.trim().is_empty() => Ok(data.text),
            _ => Err(PlotweaveError::Parse("provider returned no text".into())),
        }
    }
}

/// An opaque text-generation backend.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    fn id(&self) -> &str;

    async fn generate(&self, request: ProviderRequest) -> Result<ProviderEnvelope, PlotweaveError>;
}

/// Provider that is never available. Generation falls back to the template plot.
#[derive(Debug, Clone, Default)]
pub struct OfflineProvider;

#[async_trait]
impl GenerationProvider for OfflineProvider {
    fn id(&self) -> &str {
        "offline"
    }

    async fn generate(&self, _request: ProviderRequest) -> Result<ProviderEnvelope, PlotweaveError> {
        Ok(ProviderEnvelope::failure("provider offline", None))
    }
}

/// Any endpoint speaking the OpenAI `/chat/completions` protocol.
pub struct OpenAiCompatibleProvider {
    id: String,
    base_url: String,
    api_key: Option<String>,
    max_tokens: u32,
    client: Client,
}

impl OpenAiCompatibleProvider {
    pub fn new(
        id: impl Into<String>,
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
        max_tokens: u32,
    ) -> Result<Self, PlotweaveError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PlotweaveError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            id: id.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            max_tokens,
            client,
        })
    }

    fn build_body(&self, request: &ProviderRequest) -> serde_json::Value {
        let mut messages = Vec::new();
        if let Some(system) = &request.system {
            messages.push(serde_json::json!({
                "role": "system",
                "content": system
            }));
        }
        messages.push(serde_json::json!({
            "role": "user",
            "content": request.prompt
        }));

        let mut body = serde_json::json!({
            "model": request.model,
            "messages": messages,
            "max_tokens": self.max_tokens
        });
        if let Some(temp) = request.temperature {
            body["temperature"] = serde_json::json!(temp);
        }
        body
    }
}

#[async_trait]
impl GenerationProvider for OpenAiCompatibleProvider {
    fn id(&self) -> &str {
        &self.id
    }

    async fn generate(&self, request: ProviderRequest) -> Result<ProviderEnvelope, PlotweaveError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = self.build_body(&request);

        let mut req_builder = self
            .client
            .post(&url)
            .header("Content-Type", "application/json");
        if let Some(key) = &self.api_key {
            req_builder = req_builder.header("Authorization", format!("Bearer {}", key));
        }

        let start = std::time::Instant::now();
        let resp = req_builder.json(&body).send().await?;
        let status = resp.status();
        debug!(
            "{} responded {} in {}ms (model {})",
            self.id,
            status,
            start.elapsed().as_millis(),
            request.model
        );

        if status == StatusCode::TOO_MANY_REQUESTS {
            let details = resp.text().await.ok();
            return Ok(ProviderEnvelope::failure("rate limit (429)", details));
        }

        if status.is_server_error() {
            let details = resp.text().await.ok();
            return Ok(ProviderEnvelope::failure(
                format!("server error ({})", status.as_u16()),
                details,
            ));
        }

        if !status.is_success() {
            let details = resp.text().await.unwrap_or_default();
            warn!("{} rejected request with {}", self.id, status);
            return Ok(ProviderEnvelope::failure(
                format!("request rejected ({})", status.as_u16()),
                Some(details),
            ));
        }

        let json: serde_json::Value = resp.json().await?;
        let content = json["choices"]
            .as_array()
            .and_then(|arr| arr.first())
            .and_then(|c| c["message"]["content"].as_str());

        Ok(match content {
            Some(text) => ProviderEnvelope::ok(text),
            None => ProviderEnvelope::failure(
                "malformed completion",
                Some("missing choices[0].message.content".into()),
            ),
        })
    }
}

/// Build the provider described by the configuration.
pub fn create_provider(config: &ProviderConfig) -> Result<Arc<dyn GenerationProvider>, PlotweaveError> {
    match config {
        ProviderConfig::Offline => Ok(Arc::new(OfflineProvider)),
        ProviderConfig::OpenaiCompatible {
            id,
            base_url,
            api_key_env,
            timeout_secs,
            max_tokens,
        } => {
            let api_key = std::env::var(api_key_env)
                .ok()
                .filter(|k| !k.trim().is_empty());
            if api_key.is_none() {
                warn!(
                    "{} is not set; calling {} without an API key",
                    api_key_env, base_url
                );
            }
            let provider = OpenAiCompatibleProvider::new(
                id.clone(),
                base_url.clone(),
                api_key,
                Duration::from_secs(*timeout_secs),
                *max_tokens,
            )?;
            Ok(Arc::new(provider))
        }
    }
}
