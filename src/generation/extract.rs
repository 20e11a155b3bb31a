//! Generated-text extraction from backend response envelopes
//!
//! The generation backend's response schema is not uniform across model
//! families. Each known shape gets its own extractor; they are tried in a
//! fixed priority order and the first match wins. No match yields `None`,
//! never an error.

use serde_json::Value;
use tracing::warn;

/// One strategy for pulling the generated text out of a response envelope
pub trait ResponseExtractor: Send + Sync {
    /// Shape name, for diagnostics
    fn name(&self) -> &'static str;

    fn try_extract(&self, envelope: &Value) -> Option<String>;
}

/// Llama-family: `{"generation": "..."}`
struct GenerationField;

impl ResponseExtractor for GenerationField {
    fn name(&self) -> &'static str {
        "generation"
    }

    fn try_extract(&self, envelope: &Value) -> Option<String> {
        envelope
            .get("generation")
            .and_then(Value::as_str)
            .map(str::to_string)
    }
}

/// Jurassic-family: `{"completions": [{"data": {"text": "..."}}]}`
struct CompletionsData;

impl ResponseExtractor for CompletionsData {
    fn name(&self) -> &'static str {
        "completions[0].data.text"
    }

    fn try_extract(&self, envelope: &Value) -> Option<String> {
        envelope
            .get("completions")?
            .get(0)?
            .get("data")?
            .get("text")
            .and_then(Value::as_str)
            .map(str::to_string)
    }
}

/// Titan-family: `{"results": [{"outputText": "..."}]}`
struct ResultsOutputText;

impl ResponseExtractor for ResultsOutputText {
    fn name(&self) -> &'static str {
        "results[0].outputText"
    }

    fn try_extract(&self, envelope: &Value) -> Option<String> {
        envelope
            .get("results")?
            .get(0)?
            .get("outputText")
            .and_then(Value::as_str)
            .map(str::to_string)
    }
}

/// `{"output": {"text": "..."}}`
struct OutputText;

impl ResponseExtractor for OutputText {
    fn name(&self) -> &'static str {
        "output.text"
    }

    fn try_extract(&self, envelope: &Value) -> Option<String> {
        envelope
            .get("output")?
            .get("text")
            .and_then(Value::as_str)
            .map(str::to_string)
    }
}

/// Extractors in priority order
fn extractors() -> [&'static dyn ResponseExtractor; 4] {
    [
        &GenerationField,
        &CompletionsData,
        &ResultsOutputText,
        &OutputText,
    ]
}

/// Try every known response shape in priority order.
///
/// Returns `None` when no shape matches; the unrecognized key set is
/// logged so new model families can be diagnosed from the logs.
pub fn extract_generated_text(envelope: &Value) -> Option<String> {
    for extractor in extractors() {
        if let Some(text) = extractor.try_extract(envelope) {
            return Some(text);
        }
    }

    let keys: Vec<&str> = envelope
        .as_object()
        .map(|map| map.keys().map(String::as_str).collect())
        .unwrap_or_default();
    warn!(?keys, "unknown generation response format");
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_generation_field() {
        let envelope = json!({ "generation": "resposta gerada" });
        assert_eq!(
            extract_generated_text(&envelope).as_deref(),
            Some("resposta gerada")
        );
    }

    #[test]
    fn test_completions_shape() {
        let envelope = json!({ "completions": [{ "data": { "text": "texto" } }] });
        assert_eq!(extract_generated_text(&envelope).as_deref(), Some("texto"));
    }

    #[test]
    fn test_results_output_text_shape() {
        let envelope = json!({ "results": [{ "outputText": "saída" }] });
        assert_eq!(extract_generated_text(&envelope).as_deref(), Some("saída"));
    }

    #[test]
    fn test_output_text_shape() {
        let envelope = json!({ "output": { "text": "final" } });
        assert_eq!(extract_generated_text(&envelope).as_deref(), Some("final"));
    }

    #[test]
    fn test_priority_order() {
        // Both shapes present: the higher-priority key wins
        let envelope = json!({
            "generation": "primeira",
            "output": { "text": "segunda" }
        });
        assert_eq!(
            extract_generated_text(&envelope).as_deref(),
            Some("primeira")
        );
    }

    #[test]
    fn test_unknown_shape_returns_none() {
        let envelope = json!({ "choices": [{ "message": { "content": "x" } }] });
        assert_eq!(extract_generated_text(&envelope), None);
    }

    #[test]
    fn test_malformed_known_shape_returns_none() {
        let envelope = json!({ "completions": [] });
        assert_eq!(extract_generated_text(&envelope), None);
    }
}
