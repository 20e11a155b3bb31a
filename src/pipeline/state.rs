//! Pipeline state threaded through the three stages
//!
//! A single request-scoped record, created with only the query populated,
//! mutated in place by each stage, and returned to the caller. Failure is
//! encoded in the `error` field, never thrown across stage boundaries.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::embedding::EmbeddingBundle;
use crate::errors::AssistantError;
use crate::retrieval::Passage;

/// The pipeline stage that produced a result or failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    EmbedQuery,
    RetrieveDocuments,
    GenerateResponse,
}

impl PipelineStage {
    /// Stable stage name used in logs and user-facing apologies
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::EmbedQuery => "embed_query",
            PipelineStage::RetrieveDocuments => "retrieve_documents",
            PipelineStage::GenerateResponse => "generate_response",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured failure descriptor carried forward by the state.
///
/// Created by the first stage that fails and never overwritten by a later
/// one. `message` is user-safe; `details` is for logs only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageError {
    pub stage: PipelineStage,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl StageError {
    pub fn new(stage: PipelineStage, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
            details: None,
        }
    }

    /// Capture an error with its debug representation kept out of the
    /// user-facing message
    pub fn from_error(stage: PipelineStage, err: &AssistantError) -> Self {
        Self {
            stage,
            message: err.to_string(),
            details: Some(format!("{:?}", err)),
        }
    }
}

/// The single mutable record threaded through the orchestrator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineState {
    pub query: String,
    pub filters: Option<serde_json::Map<String, Value>>,
    pub embedding: Option<EmbeddingBundle>,
    pub retrieved_docs: Vec<Passage>,
    pub context: String,
    pub response: Option<String>,
    pub error: Option<StageError>,
}

impl PipelineState {
    /// Create a fresh state for an incoming request
    pub fn new(query: impl Into<String>, filters: Option<serde_json::Map<String, Value>>) -> Self {
        Self {
            query: query.into(),
            filters,
            embedding: None,
            retrieved_docs: Vec::new(),
            context: String::new(),
            response: None,
            error: None,
        }
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_has_only_query() {
        let state = PipelineState::new("Como plantar milho?", None);
        assert_eq!(state.query, "Como plantar milho?");
        assert!(state.embedding.is_none());
        assert!(state.retrieved_docs.is_empty());
        assert_eq!(state.context, "");
        assert!(state.response.is_none());
        assert!(!state.is_failed());
    }

    #[test]
    fn test_stage_names_are_stable() {
        assert_eq!(PipelineStage::EmbedQuery.as_str(), "embed_query");
        assert_eq!(PipelineStage::RetrieveDocuments.as_str(), "retrieve_documents");
        assert_eq!(PipelineStage::GenerateResponse.as_str(), "generate_response");
    }

    #[test]
    fn test_stage_error_from_error_keeps_detail_separate() {
        let err = AssistantError::EmbeddingBackend("credentials rejected".to_string());
        let stage_err = StageError::from_error(PipelineStage::EmbedQuery, &err);
        assert_eq!(stage_err.stage, PipelineStage::EmbedQuery);
        assert!(stage_err.message.contains("credentials rejected"));
        assert!(stage_err.details.is_some());
    }

    #[test]
    fn test_stage_serializes_snake_case() {
        let json = serde_json::to_string(&PipelineStage::EmbedQuery).unwrap();
        assert_eq!(json, "\"embed_query\"");
    }
}
