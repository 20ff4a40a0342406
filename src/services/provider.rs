// src/services/provider.rs
use futures::stream::BoxStream;
use serde::Deserialize;
use serde_json::Value;

use crate::error::ProviderError;

/// Lazy, finite, single-use sequence of generated fragments.
pub type ChunkStream = BoxStream<'static, Result<StreamChunk, ProviderError>>;

/// A language model that answers one user turn as a stream of fragments.
///
/// Implementations hold only read-only configuration, so one instance is
/// shared by every request.
#[async_trait::async_trait]
pub trait ChatProvider: Send + Sync + 'static {
    /// `message` is the user's JSON value as received, not necessarily a string.
    async fn stream_generate(&self, message: Option<&Value>) -> Result<ChunkStream, ProviderError>;
}

/// One decoded `streamGenerateContent` event.
///
/// Every level is optional on the wire; see [`StreamChunk::text`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StreamChunk {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub error: Option<ApiErrorBody>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<CandidateContent>,
    #[serde(default, rename = "finishReason")]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<CandidatePart>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CandidatePart {
    #[serde(default)]
    pub text: Option<String>,
}

/// Error object Gemini embeds in the stream when generation fails midway.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub code: Option<u16>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: Option<String>,
}

impl StreamChunk {
    /// A chunk carrying a single text part.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            candidates: vec![Candidate {
                content: Some(CandidateContent {
                    parts: vec![CandidatePart {
                        text: Some(text.into()),
                    }],
                }),
                finish_reason: None,
            }],
            error: None,
        }
    }

    /// Text of the first part of the first candidate, or "" if any of it is missing.
    pub fn text(&self) -> &str {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .and_then(|c| c.parts.first())
            .and_then(|p| p.text.as_deref())
            .unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_reads_first_part() {
        let json = r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"Hello"},{"text":" ignored"}]}}]}"#;
        let chunk: StreamChunk = serde_json::from_str(json).unwrap();
        assert_eq!(chunk.text(), "Hello");
    }

    #[test]
    fn missing_levels_read_as_empty() {
        for json in [
            r#"{}"#,
            r#"{"candidates":[]}"#,
            r#"{"candidates":[{}]}"#,
            r#"{"candidates":[{"content":{}}]}"#,
            r#"{"candidates":[{"content":{"parts":[]}}]}"#,
            r#"{"candidates":[{"content":{"parts":[{}]}}]}"#,
            r#"{"candidates":[{"finishReason":"SAFETY"}],"usageMetadata":{"totalTokenCount":3}}"#,
        ] {
            let chunk: StreamChunk = serde_json::from_str(json).unwrap();
            assert_eq!(chunk.text(), "", "for {json}");
        }
    }

    #[test]
    fn error_member_is_captured() {
        let json = r#"{"error":{"code":503,"message":"overloaded","status":"UNAVAILABLE"}}"#;
        let chunk: StreamChunk = serde_json::from_str(json).unwrap();
        let err = chunk.error.unwrap();
        assert_eq!(err.code, Some(503));
        assert_eq!(err.message, "overloaded");
    }
}
