//! Remote text generation
//!
//! Builds the backend request envelope, invokes the generation model once,
//! and extracts the generated text from whichever response shape the model
//! family uses. Backend failures are non-fatal at this layer: they yield
//! `Ok(None)` plus a logged error, and the orchestrator decides how to
//! surface the missing text.

pub mod extract;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, info};

use crate::config::Settings;
use crate::errors::{AssistantError, Result};
use crate::generation::extract::extract_generated_text;

/// Generation parameters with the backend's documented defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationParams {
    pub temperature: f32,
    pub top_p: f32,
    pub max_gen_len: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_p: 0.9,
            max_gen_len: 2048,
        }
    }
}

impl GenerationParams {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            temperature: settings.temperature,
            top_p: settings.top_p,
            max_gen_len: settings.max_gen_len,
        }
    }
}

/// Produces an answer for a fully formatted prompt.
///
/// `Ok(None)` means the backend failed or returned an unrecognized shape;
/// an `Err` is reserved for caller mistakes such as an empty prompt.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<Option<String>>;
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    prompt: String,
    max_gen_len: u32,
    temperature: f32,
    top_p: f32,
}

/// HTTP client for the Bedrock-style generation backend
pub struct LlmService {
    client: Client,
    base_url: String,
    model_id: String,
    api_key: Option<String>,
}

impl LlmService {
    pub fn new(settings: &Settings) -> Result<Self> {
        let client = Client::builder()
            .timeout(settings.request_timeout())
            .build()
            .map_err(AssistantError::Http)?;

        Ok(Self {
            client,
            base_url: settings.bedrock_api.trim_end_matches('/').to_string(),
            model_id: settings.llm_model_name.clone(),
            api_key: settings.bedrock_api_key.clone(),
        })
    }

    fn invoke_url(&self) -> String {
        format!("{}/model/{}/invoke", self.base_url, self.model_id)
    }
}

#[async_trait]
impl TextGenerator for LlmService {
    async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<Option<String>> {
        if prompt.trim().is_empty() {
            return Err(AssistantError::InvalidInput(
                "prompt must not be empty".to_string(),
            ));
        }

        let body = GenerateRequest {
            prompt: format!("Human: {}\n\nAssistant:", prompt),
            max_gen_len: params.max_gen_len,
            temperature: params.temperature,
            top_p: params.top_p,
        };

        debug!(model = %self.model_id, prompt_len = prompt.len(), "invoking generation model");

        let mut request = self.client.post(self.invoke_url()).json(&body);
        if let Some(key) = &self.api_key {
            request = request.header("x-api-key", key);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                error!(model = %self.model_id, error = %e, "generation request failed");
                return Ok(None);
            }
        };

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            error!(model = %self.model_id, %status, detail = %detail, "generation backend error");
            return Ok(None);
        }

        let envelope: Value = match response.json().await {
            Ok(envelope) => envelope,
            Err(e) => {
                error!(model = %self.model_id, error = %e, "generation response was not valid JSON");
                return Ok(None);
            }
        };

        match extract_generated_text(&envelope) {
            Some(text) => {
                info!(model = %self.model_id, response_len = text.len(), "response generated");
                Ok(Some(text))
            }
            None => Ok(None),
        }
    }
}
