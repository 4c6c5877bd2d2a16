//! The value returned from every turn.

use std::collections::BTreeMap;

use serde::Serialize;

/// A response produced by a handler and shaped by the pipeline.
///
/// Immutable once built: postprocessors and the engine derive new values
/// through [`with_text`](Self::with_text) and [`with_metadata`](Self::with_metadata).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentResponse {
    text: String,
    intent: String,
    confidence: f64,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    metadata: BTreeMap<String, serde_json::Value>,
}

impl AgentResponse {
    /// Create a response. Confidence is clamped to `0.0..=1.0`.
    pub fn new(text: impl Into<String>, intent: impl Into<String>, confidence: f64) -> Self {
        Self {
            text: text.into(),
            intent: intent.into(),
            confidence: if confidence.is_nan() {
                0.0
            } else {
                confidence.clamp(0.0, 1.0)
            },
            metadata: BTreeMap::new(),
        }
    }

    /// The user-facing text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Identifier of the handler that produced this response.
    pub fn intent(&self) -> &str {
        &self.intent
    }

    /// Advisory confidence (never used for ranking).
    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    /// Extra data attached by handlers or the engine.
    pub fn metadata(&self) -> &BTreeMap<String, serde_json::Value> {
        &self.metadata
    }

    /// Look up a single metadata entry.
    pub fn meta(&self, key: &str) -> Option<&serde_json::Value> {
        self.metadata.get(key)
    }

    /// Same response with different text.
    pub fn with_text(self, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..self
        }
    }

    /// Same response with one more metadata entry (replacing any previous value).
    pub fn with_metadata(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_is_clamped() {
        assert_eq!(AgentResponse::new("x", "t", 1.7).confidence(), 1.0);
        assert_eq!(AgentResponse::new("x", "t", -0.2).confidence(), 0.0);
        assert_eq!(AgentResponse::new("x", "t", f64::NAN).confidence(), 0.0);
    }

    #[test]
    fn metadata_is_omitted_from_json_when_empty() {
        let json = serde_json::to_string(&AgentResponse::new("hi", "greeting", 0.9)).unwrap();
        assert!(!json.contains("metadata"));

        let json = serde_json::to_string(
            &AgentResponse::new("hi", "greeting", 0.9).with_metadata("name", "Ada"),
        )
        .unwrap();
        assert!(json.contains(r#""metadata":{"name":"Ada"}"#));
    }

    #[test]
    fn json_carries_the_clamped_confidence() {
        let value = serde_json::to_value(AgentResponse::new("x", "t", 1.7)).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"text": "x", "intent": "t", "confidence": 1.0})
        );
    }
}
