//! Configuration for the assistant services
//!
//! A single `Settings` struct constructed once at process start and passed
//! by reference into each service constructor. No component reads ambient
//! environment state directly.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Base URL of the generation/embedding backend gateway
    #[serde(default = "default_bedrock_api")]
    pub bedrock_api: String,

    /// Optional API key sent as `x-api-key` to the backend gateway
    #[serde(default)]
    pub bedrock_api_key: Option<String>,

    /// Text-generation model identifier
    #[serde(default = "default_llm_model")]
    pub llm_model_name: String,

    /// Dense embedding model identifier
    #[serde(default = "default_dense_model")]
    pub dense_model_name: String,

    /// Dense vector dimensionality expected from the embedding backend
    #[serde(default = "default_embedding_dim")]
    pub embedding_dim: usize,

    /// Qdrant endpoint
    #[serde(default = "default_qdrant_url")]
    pub qdrant_url: String,

    #[serde(default)]
    pub qdrant_api_key: Option<String>,

    /// Collection holding the ingested knowledge base
    #[serde(default = "default_collection")]
    pub collection_name: String,

    /// Candidate pool size per prefetch sub-search (wider than the final limit)
    #[serde(default = "default_prefetch_limit")]
    pub prefetch_limit: u64,

    /// Final number of passages returned after fusion
    #[serde(default = "default_retrieval_limit")]
    pub retrieval_limit: u64,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_top_p")]
    pub top_p: f32,

    #[serde(default = "default_max_gen_len")]
    pub max_gen_len: u32,

    /// Timeout applied to every remote call
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Average passage length assumed by the BM25 weighting
    #[serde(default = "default_bm25_avg_len")]
    pub bm25_avg_len: f32,

    #[serde(default = "default_bm25_k1")]
    pub bm25_k1: f32,

    #[serde(default = "default_bm25_b")]
    pub bm25_b: f32,
}

fn default_bedrock_api() -> String {
    "https://bedrock-runtime.us-east-1.amazonaws.com".to_string()
}

fn default_llm_model() -> String {
    "meta.llama4-maverick-17b-instruct-v1:0".to_string()
}

fn default_dense_model() -> String {
    "amazon.titan-embed-text-v2:0".to_string()
}

fn default_embedding_dim() -> usize {
    1024
}

fn default_qdrant_url() -> String {
    "http://localhost:6334".to_string()
}

fn default_collection() -> String {
    "chat-edu".to_string()
}

fn default_prefetch_limit() -> u64 {
    25
}

fn default_retrieval_limit() -> u64 {
    10
}

fn default_temperature() -> f32 {
    0.7
}

fn default_top_p() -> f32 {
    0.9
}

fn default_max_gen_len() -> u32 {
    2048
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_bm25_avg_len() -> f32 {
    256.0
}

fn default_bm25_k1() -> f32 {
    1.2
}

fn default_bm25_b() -> f32 {
    0.75
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bedrock_api: default_bedrock_api(),
            bedrock_api_key: None,
            llm_model_name: default_llm_model(),
            dense_model_name: default_dense_model(),
            embedding_dim: default_embedding_dim(),
            qdrant_url: default_qdrant_url(),
            qdrant_api_key: None,
            collection_name: default_collection(),
            prefetch_limit: default_prefetch_limit(),
            retrieval_limit: default_retrieval_limit(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            max_gen_len: default_max_gen_len(),
            request_timeout_secs: default_timeout_secs(),
            bm25_avg_len: default_bm25_avg_len(),
            bm25_k1: default_bm25_k1(),
            bm25_b: default_bm25_b(),
        }
    }
}

impl Settings {
    /// Load configuration from file, creating a default file if it doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            let settings = Settings::default();
            settings.save()?;
            return Ok(settings);
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).context("Failed to read config file")?;

        let settings: Settings =
            toml::from_str(&contents).context("Failed to parse config file")?;

        Ok(settings)
    }

    /// Save configuration to the default file location
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let toml_string = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(&config_path, toml_string).context("Failed to write config file")?;

        Ok(())
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not determine home directory")?;

        Ok(home.join(".agroassist").join("config.toml"))
    }

    /// Timeout applied to every remote call
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
