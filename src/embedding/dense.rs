//! Remote dense embedding backend
//!
//! HTTP client for a Bedrock-style embedding endpoint: raw text in, a
//! fixed-length float vector back. The reqwest client is built once and
//! is safe to share across concurrent calls.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::config::Settings;
use crate::errors::{AssistantError, Result};

/// Dense embedding provider: raw text in, fixed-length vector out
#[async_trait]
pub trait DenseEmbeddingBackend: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    #[serde(rename = "inputText")]
    input_text: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
}

/// Client for the Titan-style text embedding model behind the gateway
pub struct BedrockEmbeddingClient {
    client: Client,
    base_url: String,
    model_id: String,
    api_key: Option<String>,
    expected_dim: usize,
}

impl BedrockEmbeddingClient {
    pub fn new(settings: &Settings) -> Result<Self> {
        let client = Client::builder()
            .timeout(settings.request_timeout())
            .build()
            .map_err(AssistantError::Http)?;

        Ok(Self {
            client,
            base_url: settings.bedrock_api.trim_end_matches('/').to_string(),
            model_id: settings.dense_model_name.clone(),
            api_key: settings.bedrock_api_key.clone(),
            expected_dim: settings.embedding_dim,
        })
    }

    fn invoke_url(&self) -> String {
        format!("{}/model/{}/invoke", self.base_url, self.model_id)
    }
}

#[async_trait]
impl DenseEmbeddingBackend for BedrockEmbeddingClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut request = self
            .client
            .post(self.invoke_url())
            .json(&EmbedRequest { input_text: text });

        if let Some(key) = &self.api_key {
            request = request.header("x-api-key", key);
        }

        let response = request.send().await.map_err(|e| {
            error!(model = %self.model_id, error = %e, "embedding request failed");
            AssistantError::EmbeddingBackend(format!("request failed: {}", e))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(model = %self.model_id, %status, "embedding backend rejected request");
            return Err(AssistantError::EmbeddingBackend(format!(
                "backend returned HTTP {}: {}",
                status, body
            )));
        }

        let parsed: EmbedResponse = response.json().await.map_err(|e| {
            AssistantError::EmbeddingBackend(format!("malformed response: {}", e))
        })?;

        if parsed.embedding.len() != self.expected_dim {
            return Err(AssistantError::EmbeddingBackend(format!(
                "expected {}-dimensional vector, got {}",
                self.expected_dim,
                parsed.embedding.len()
            )));
        }

        debug!(model = %self.model_id, dim = parsed.embedding.len(), "dense embedding generated");
        Ok(parsed.embedding)
    }
}
