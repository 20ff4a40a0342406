// src/services/gemini.rs
use std::fmt::Debug;

use futures::StreamExt;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

use super::provider::{ChatProvider, ChunkStream, StreamChunk};
use super::sse::data_events;
use crate::config::{Config, SYSTEM_INSTRUCTION};
use crate::error::ProviderError;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest<'a> {
    pub contents: Vec<Content<'a>>,
    pub system_instruction: Content<'a>,
}

#[derive(Debug, Serialize)]
pub struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<&'static str>,
    pub parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
pub struct Part<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<&'a Value>,
}

/// Client for the Gemini `streamGenerateContent` endpoint.
#[derive(Clone)]
pub struct GeminiClient {
    http: Client,
    api_key: String,
    base_url: String,
    model: String,
    instruction: Value,
}

impl Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

impl GeminiClient {
    pub fn new(config: &Config) -> Result<Self, ProviderError> {
        let http = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self {
            http,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            instruction: Value::from(SYSTEM_INSTRUCTION),
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:streamGenerateContent?alt=sse",
            self.base_url, self.model
        )
    }

    /// Single user turn plus the fixed persona. The message is copied as is,
    /// so Gemini decides what to do with non-string values; a missing one is
    /// sent as a part without text.
    pub fn build_request<'a>(
        message: Option<&'a Value>,
        instruction: &'a Value,
    ) -> GenerateContentRequest<'a> {
        GenerateContentRequest {
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part { text: message }],
            }],
            system_instruction: Content {
                role: None,
                parts: vec![Part {
                    text: Some(instruction),
                }],
            },
        }
    }
}

/// Decode one SSE payload. `Ok(None)` means there is nothing to forward.
fn decode_event(data: &str) -> Result<Option<StreamChunk>, ProviderError> {
    let data = data.trim();
    if data.is_empty() || data == "[DONE]" {
        return Ok(None);
    }

    let mut chunk: StreamChunk = serde_json::from_str(data)?;
    if let Some(err) = chunk.error.take() {
        return Err(ProviderError::Api {
            status: err.code.unwrap_or(500),
            body: err.message,
        });
    }
    Ok(Some(chunk))
}

#[async_trait::async_trait]
impl ChatProvider for GeminiClient {
    async fn stream_generate(&self, message: Option<&Value>) -> Result<ChunkStream, ProviderError> {
        let body = Self::build_request(message, &self.instruction);

        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!(model = %self.model, "gemini stream opened");

        let chunks = data_events(response.bytes_stream()).filter_map(|event| async move {
            match event {
                Ok(data) => decode_event(&data).transpose(),
                Err(e) => Some(Err(e)),
            }
        });

        Ok(chunks.boxed())
    }
}
