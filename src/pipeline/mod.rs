//! Query-time pipeline orchestrator
//!
//! A three-step sequential state machine: embed the query, retrieve
//! passages, generate the answer. Stages always execute in that order;
//! once a stage records an error the later stages pass through without
//! doing their primary work but still leave their own fields well formed.
//! The terminal state is the returned `PipelineState`, success or not.

pub mod state;

use std::sync::Arc;
use tracing::{error, info, warn};

use crate::embedding::QueryEmbedder;
use crate::errors::AssistantError;
use crate::generation::{GenerationParams, TextGenerator};
use crate::prompt::{disclaimer, format_rag_prompt, should_include_disclaimer};
use crate::retrieval::DocumentRetriever;

pub use state::{PipelineStage, PipelineState, StageError};

/// Separator between passage texts in the assembled context
const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

/// Orchestrates the embed → retrieve → generate flow.
///
/// Collaborators are long-lived and shared across concurrent requests;
/// each `run` call owns its own request-scoped state.
pub struct Pipeline {
    embedder: Arc<dyn QueryEmbedder>,
    retriever: Arc<dyn DocumentRetriever>,
    generator: Arc<dyn TextGenerator>,
    params: GenerationParams,
    retrieval_limit: u64,
}

impl Pipeline {
    pub fn new(
        embedder: Arc<dyn QueryEmbedder>,
        retriever: Arc<dyn DocumentRetriever>,
        generator: Arc<dyn TextGenerator>,
        params: GenerationParams,
        retrieval_limit: u64,
    ) -> Self {
        Self {
            embedder,
            retriever,
            generator,
            params,
            retrieval_limit,
        }
    }

    /// Run one query through the full pipeline. Single entry point; never
    /// returns an error — failures are encoded in the returned state.
    pub async fn run(
        &self,
        query: impl Into<String>,
        filters: Option<serde_json::Map<String, serde_json::Value>>,
    ) -> PipelineState {
        let mut state = PipelineState::new(query, filters);

        self.embed_query(&mut state).await;
        self.retrieve_documents(&mut state).await;
        self.generate_response(&mut state).await;

        state
    }

    /// Stage 1: embed the query in both retrieval spaces
    async fn embed_query(&self, state: &mut PipelineState) {
        if state.query.trim().is_empty() {
            warn!("empty query received");
            state.error = Some(StageError::from_error(
                PipelineStage::EmbedQuery,
                &AssistantError::InvalidInput("query must not be empty".to_string()),
            ));
            return;
        }

        match self.embedder.embed_query(&state.query).await {
            Ok(bundle) => {
                info!(
                    dense_dim = bundle.dense.len(),
                    sparse_terms = bundle.sparse.len(),
                    "query embedded"
                );
                state.embedding = Some(bundle);
                state.error = None;
            }
            Err(e) => {
                error!(stage = %PipelineStage::EmbedQuery, error = %e, "embedding failed");
                state.error = Some(StageError::from_error(PipelineStage::EmbedQuery, &e));
            }
        }
    }

    /// Stage 2: hybrid search and context assembly
    async fn retrieve_documents(&self, state: &mut PipelineState) {
        if let Some(err) = &state.error {
            // Prior failure: pass through with well-formed empty output
            info!(failed_stage = %err.stage, "skipping retrieval after earlier failure");
            state.retrieved_docs = Vec::new();
            state.context = String::new();
            return;
        }

        let Some(bundle) = state.embedding.as_ref() else {
            // Wiring bug: no error recorded but no bundle either
            let e = AssistantError::InternalInconsistency(
                "no embedding bundle present despite successful embed stage".to_string(),
            );
            error!(stage = %PipelineStage::RetrieveDocuments, error = %e, "pipeline inconsistency");
            state.retrieved_docs = Vec::new();
            state.context = String::new();
            state.error = Some(StageError::from_error(PipelineStage::RetrieveDocuments, &e));
            return;
        };

        match self
            .retriever
            .search_documents(bundle, state.filters.as_ref(), self.retrieval_limit)
            .await
        {
            Ok(passages) => {
                state.context = assemble_context(&passages);
                info!(
                    passages = passages.len(),
                    context_len = state.context.len(),
                    "documents retrieved"
                );
                if state.context.is_empty() {
                    warn!("no usable text in retrieved passages");
                }
                state.retrieved_docs = passages;
                state.error = None;
            }
            Err(e) => {
                error!(stage = %PipelineStage::RetrieveDocuments, error = %e, "retrieval failed");
                state.retrieved_docs = Vec::new();
                state.context = String::new();
                state.error = Some(StageError::from_error(PipelineStage::RetrieveDocuments, &e));
            }
        }
    }

    /// Stage 3: generation, or translation of an earlier failure into a
    /// user-facing apology — the only place that translation happens
    async fn generate_response(&self, state: &mut PipelineState) {
        if let Some(err) = &state.error {
            info!(failed_stage = %err.stage, "answering with apology after earlier failure");
            state.response = Some(format!(
                "Desculpe, ocorreu um erro no passo '{}': {}",
                err.stage, err.message
            ));
            return;
        }

        let prompt = format_rag_prompt(&state.query, &state.context);

        match self.generator.generate(&prompt, &self.params).await {
            Ok(Some(text)) => {
                let response = if should_include_disclaimer(&text) {
                    format!("{}{}", text, disclaimer())
                } else {
                    text
                };
                info!(response_len = response.len(), "response generated");
                state.response = Some(response);
                state.error = None;
            }
            Ok(None) => {
                let e = AssistantError::GenerationBackend(
                    "generation backend returned no text".to_string(),
                );
                error!(stage = %PipelineStage::GenerateResponse, error = %e, "generation failed");
                state.error = Some(StageError::from_error(PipelineStage::GenerateResponse, &e));
            }
            Err(e) => {
                error!(stage = %PipelineStage::GenerateResponse, error = %e, "generation failed");
                state.error = Some(StageError::from_error(PipelineStage::GenerateResponse, &e));
            }
        }
    }
}

/// Concatenate non-empty passage texts with the fixed separator.
/// Empty passages stay in `retrieved_docs` but are dropped here.
fn assemble_context(passages: &[crate::retrieval::Passage]) -> String {
    passages
        .iter()
        .map(|p| p.page_content.as_str())
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(CONTEXT_SEPARATOR)
}
