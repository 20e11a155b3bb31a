//! Hybrid query embedding
//!
//! Represents the user query in two retrieval spaces at once: a dense
//! semantic vector from a remote embedding model and a sparse BM25-style
//! term-weight vector computed locally. A bundle is only ever returned
//! whole; if either sub-embedding fails the call fails atomically.

pub mod bm25;
pub mod dense;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::config::Settings;
use crate::embedding::bm25::Bm25QueryEncoder;
use crate::embedding::dense::DenseEmbeddingBackend;
use crate::errors::{AssistantError, Result};

/// Sparse term-weight vector. `indices` and `values` correspond
/// positionally and always have equal length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SparseVector {
    pub indices: Vec<u32>,
    pub values: Vec<f32>,
}

impl SparseVector {
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// The query expressed in every retrieval space the store indexes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingBundle {
    /// Fixed-length semantic vector
    pub dense: Vec<f32>,
    /// BM25-style lexical term weights
    pub sparse: SparseVector,
}

/// Produces an `EmbeddingBundle` for a query string
#[async_trait]
pub trait QueryEmbedder: Send + Sync {
    async fn embed_query(&self, query: &str) -> Result<EmbeddingBundle>;
}

/// Query embedder combining a remote dense backend with a local sparse encoder
pub struct HybridQueryEmbedder {
    dense_backend: Arc<dyn DenseEmbeddingBackend>,
    sparse_encoder: Bm25QueryEncoder,
}

impl HybridQueryEmbedder {
    pub fn new(dense_backend: Arc<dyn DenseEmbeddingBackend>, settings: &Settings) -> Self {
        Self {
            dense_backend,
            sparse_encoder: Bm25QueryEncoder::new(
                settings.bm25_k1,
                settings.bm25_b,
                settings.bm25_avg_len,
            ),
        }
    }
}

#[async_trait]
impl QueryEmbedder for HybridQueryEmbedder {
    /// Embed a query in both spaces. Exactly one dense backend call and one
    /// sparse encoding per invocation; no partial bundle is ever returned.
    async fn embed_query(&self, query: &str) -> Result<EmbeddingBundle> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AssistantError::InvalidInput(
                "query must not be empty".to_string(),
            ));
        }

        let dense = self.dense_backend.embed(query).await?;
        let sparse = self.sparse_encoder.encode(query);

        debug!(
            dense_dim = dense.len(),
            sparse_terms = sparse.len(),
            "query embedded"
        );

        Ok(EmbeddingBundle { dense, sparse })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedDenseBackend {
        vector: Vec<f32>,
    }

    #[async_trait]
    impl DenseEmbeddingBackend for FixedDenseBackend {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(self.vector.clone())
        }
    }

    struct FailingDenseBackend;

    #[async_trait]
    impl DenseEmbeddingBackend for FailingDenseBackend {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Err(AssistantError::EmbeddingBackend(
                "credentials rejected".to_string(),
            ))
        }
    }

    fn embedder_with(backend: Arc<dyn DenseEmbeddingBackend>) -> HybridQueryEmbedder {
        HybridQueryEmbedder::new(backend, &Settings::default())
    }

    #[tokio::test]
    async fn test_embed_query_produces_both_representations() {
        let embedder = embedder_with(Arc::new(FixedDenseBackend {
            vector: vec![0.5; 1024],
        }));

        let bundle = embedder.embed_query("Como plantar milho?").await.unwrap();
        assert_eq!(bundle.dense.len(), 1024);
        assert!(!bundle.sparse.is_empty());
        assert_eq!(bundle.sparse.indices.len(), bundle.sparse.values.len());
    }

    #[tokio::test]
    async fn test_empty_query_rejected() {
        let embedder = embedder_with(Arc::new(FixedDenseBackend { vector: vec![] }));

        let result = embedder.embed_query("   ").await;
        assert!(matches!(result, Err(AssistantError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_dense_failure_is_atomic() {
        let embedder = embedder_with(Arc::new(FailingDenseBackend));

        // No partial bundle: the whole call fails
        let result = embedder.embed_query("dosagem de fungicida").await;
        assert!(matches!(result, Err(AssistantError::EmbeddingBackend(_))));
    }
}
