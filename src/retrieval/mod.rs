//! Hybrid passage retrieval against Qdrant
//!
//! Issues one prefetch sub-search per embedding representation (dense and
//! sparse named vectors), lets the store fuse the candidate lists with
//! reciprocal rank fusion, and maps the fused result into `Passage`
//! records. Store ordering is trusted and preserved; nothing is re-ranked
//! locally.

use async_trait::async_trait;
use qdrant_client::qdrant::{
    value::Kind, Condition, Filter, Fusion, PrefetchQueryBuilder, Query, QueryPointsBuilder,
    ScoredPoint, Value as QdrantValue, VectorInput,
};
use qdrant_client::{Qdrant, QdrantError};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::{debug, error, warn};

use crate::config::Settings;
use crate::embedding::EmbeddingBundle;
use crate::errors::{AssistantError, Result};

/// Named vector slots the ingestion job writes to
const DENSE_VECTOR_NAME: &str = "dense";
const SPARSE_VECTOR_NAME: &str = "sparse";

/// Payload field holding the indexed passage text
const TEXT_FIELD: &str = "text";
/// Payload field holding the accompanying metadata map
const METADATA_FIELD: &str = "metadata";

/// A retrieved unit of knowledge-base text
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Passage {
    pub page_content: String,
    pub metadata: serde_json::Map<String, JsonValue>,
}

/// Retrieves ranked passages for an embedding bundle
#[async_trait]
pub trait DocumentRetriever: Send + Sync {
    async fn search_documents(
        &self,
        bundle: &EmbeddingBundle,
        filters: Option<&serde_json::Map<String, JsonValue>>,
        limit: u64,
    ) -> Result<Vec<Passage>>;
}

/// Qdrant-backed retriever using server-side fusion
pub struct QdrantRetriever {
    client: Qdrant,
    collection_name: String,
    prefetch_limit: u64,
}

impl QdrantRetriever {
    pub fn new(settings: &Settings) -> Result<Self> {
        let mut builder = Qdrant::from_url(&settings.qdrant_url);
        if let Some(key) = &settings.qdrant_api_key {
            builder = builder.api_key(key.clone());
        }
        let client = builder
            .timeout(settings.request_timeout())
            .build()
            .map_err(|e| AssistantError::Config(format!("failed to create Qdrant client: {}", e)))?;

        Ok(Self {
            client,
            collection_name: settings.collection_name.clone(),
            prefetch_limit: settings.prefetch_limit,
        })
    }
}

#[async_trait]
impl DocumentRetriever for QdrantRetriever {
    async fn search_documents(
        &self,
        bundle: &EmbeddingBundle,
        filters: Option<&serde_json::Map<String, JsonValue>>,
        limit: u64,
    ) -> Result<Vec<Passage>> {
        let payload_filter = filters.and_then(build_payload_filter);

        let mut dense_prefetch = PrefetchQueryBuilder::default()
            .query(Query::new_nearest(bundle.dense.clone()))
            .using(DENSE_VECTOR_NAME)
            .limit(self.prefetch_limit);
        let mut sparse_prefetch = PrefetchQueryBuilder::default()
            .query(Query::new_nearest(VectorInput::new_sparse(
                bundle.sparse.indices.clone(),
                bundle.sparse.values.clone(),
            )))
            .using(SPARSE_VECTOR_NAME)
            .limit(self.prefetch_limit);

        if let Some(filter) = &payload_filter {
            dense_prefetch = dense_prefetch.filter(filter.clone());
            sparse_prefetch = sparse_prefetch.filter(filter.clone());
        }

        let request = QueryPointsBuilder::new(self.collection_name.clone())
            .add_prefetch(dense_prefetch)
            .add_prefetch(sparse_prefetch)
            .query(Query::new_fusion(Fusion::Rrf))
            .limit(limit)
            .with_payload(true);

        let response = self.client.query(request).await.map_err(|e| {
            error!(collection = %self.collection_name, error = %e, "hybrid search failed");
            map_store_error(e)
        })?;

        let passages: Vec<Passage> = response.result.iter().map(point_to_passage).collect();

        debug!(
            collection = %self.collection_name,
            count = passages.len(),
            "passages retrieved after fusion"
        );

        Ok(passages)
    }
}

/// Map caller filters onto payload match conditions under the metadata map.
/// Unsupported value types are skipped rather than failing the search.
fn build_payload_filter(filters: &serde_json::Map<String, JsonValue>) -> Option<Filter> {
    let mut conditions = Vec::new();

    for (key, value) in filters {
        let field = format!("{}.{}", METADATA_FIELD, key);
        match value {
            JsonValue::String(s) => conditions.push(Condition::matches(field, s.clone())),
            JsonValue::Bool(b) => conditions.push(Condition::matches(field, *b)),
            JsonValue::Number(n) if n.is_i64() => {
                conditions.push(Condition::matches(field, n.as_i64().unwrap_or_default()))
            }
            other => {
                warn!(key = %key, value = %other, "unsupported filter value type, skipping");
            }
        }
    }

    if conditions.is_empty() {
        None
    } else {
        Some(Filter::must(conditions))
    }
}

/// Transport/protocol failures are retryable; anything else is a store bug
fn map_store_error(err: QdrantError) -> AssistantError {
    match err {
        QdrantError::ResponseError { status } => {
            AssistantError::RetrievalUnavailable(status.to_string())
        }
        other => AssistantError::RetrievalInternal(other.to_string()),
    }
}

/// Extract a `Passage` from a scored point. Points without the text field
/// still produce a passage with empty content, never a dropped record.
fn point_to_passage(point: &ScoredPoint) -> Passage {
    let page_content = point
        .payload
        .get(TEXT_FIELD)
        .and_then(value_as_string)
        .unwrap_or_default();

    let metadata = match point.payload.get(METADATA_FIELD).map(qdrant_value_to_json) {
        Some(JsonValue::Object(map)) => map,
        _ => serde_json::Map::new(),
    };

    Passage {
        page_content,
        metadata,
    }
}

fn value_as_string(value: &QdrantValue) -> Option<String> {
    match value.kind.as_ref() {
        Some(Kind::StringValue(s)) => Some(s.clone()),
        _ => None,
    }
}

fn qdrant_value_to_json(value: &QdrantValue) -> JsonValue {
    match value.kind.as_ref() {
        Some(Kind::StringValue(s)) => JsonValue::String(s.clone()),
        Some(Kind::IntegerValue(i)) => JsonValue::Number((*i).into()),
        Some(Kind::DoubleValue(f)) => serde_json::Number::from_f64(*f)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null),
        Some(Kind::BoolValue(b)) => JsonValue::Bool(*b),
        Some(Kind::StructValue(s)) => JsonValue::Object(
            s.fields
                .iter()
                .map(|(k, v)| (k.clone(), qdrant_value_to_json(v)))
                .collect(),
        ),
        Some(Kind::ListValue(l)) => {
            JsonValue::Array(l.values.iter().map(qdrant_value_to_json).collect())
        }
        Some(Kind::NullValue(_)) | None => JsonValue::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qdrant_client::qdrant::Struct;
    use std::collections::HashMap;

    fn string_value(s: &str) -> QdrantValue {
        QdrantValue {
            kind: Some(Kind::StringValue(s.to_string())),
        }
    }

    fn point_with_payload(payload: HashMap<String, QdrantValue>) -> ScoredPoint {
        ScoredPoint {
            payload,
            ..Default::default()
        }
    }

    #[test]
    fn test_point_to_passage_extracts_text_and_metadata() {
        let mut meta_fields = HashMap::new();
        meta_fields.insert("crop".to_string(), string_value("milho"));
        meta_fields.insert(
            "page".to_string(),
            QdrantValue {
                kind: Some(Kind::IntegerValue(12)),
            },
        );

        let mut payload = HashMap::new();
        payload.insert(TEXT_FIELD.to_string(), string_value("Dosagem recomendada"));
        payload.insert(
            METADATA_FIELD.to_string(),
            QdrantValue {
                kind: Some(Kind::StructValue(Struct {
                    fields: meta_fields,
                })),
            },
        );

        let passage = point_to_passage(&point_with_payload(payload));
        assert_eq!(passage.page_content, "Dosagem recomendada");
        assert_eq!(passage.metadata["crop"], "milho");
        assert_eq!(passage.metadata["page"], 12);
    }

    #[test]
    fn test_point_without_text_field_kept_as_empty_passage() {
        let passage = point_to_passage(&point_with_payload(HashMap::new()));
        assert_eq!(passage.page_content, "");
        assert!(passage.metadata.is_empty());
    }

    #[test]
    fn test_build_payload_filter_supported_types() {
        let mut filters = serde_json::Map::new();
        filters.insert("crop".to_string(), JsonValue::String("soja".to_string()));
        filters.insert("approved".to_string(), JsonValue::Bool(true));
        filters.insert("year".to_string(), JsonValue::from(2024));

        let filter = build_payload_filter(&filters).unwrap();
        assert_eq!(filter.must.len(), 3);
    }

    #[test]
    fn test_build_payload_filter_skips_unsupported_values() {
        let mut filters = serde_json::Map::new();
        filters.insert("scores".to_string(), JsonValue::Array(vec![]));

        assert!(build_payload_filter(&filters).is_none());
    }

    #[test]
    fn test_store_error_mapping() {
        let err = map_store_error(QdrantError::ConversionError("bad vector".to_string()));
        assert!(matches!(err, AssistantError::RetrievalInternal(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_nested_value_conversion() {
        let value = QdrantValue {
            kind: Some(Kind::ListValue(qdrant_client::qdrant::ListValue {
                values: vec![string_value("a"), string_value("b")],
            })),
        };
        assert_eq!(qdrant_value_to_json(&value), serde_json::json!(["a", "b"]));
    }
}
