#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use futures::{StreamExt, stream};
use gardenbot_backend::error::ProviderError;
use gardenbot_backend::services::provider::{ChatProvider, ChunkStream, StreamChunk};
use serde_json::Value;

#[derive(Clone)]
pub enum Step {
    Text(&'static str),
    Empty,
    Fail(&'static str),
}

/// Deterministic provider that replays the same script for every call and
/// remembers which messages it was asked about.
#[derive(Default)]
pub struct ScriptedProvider {
    script: Vec<Step>,
    fail_on_call: bool,
    pub seen: Mutex<Vec<Option<Value>>>,
}

impl ScriptedProvider {
    pub fn new(script: Vec<Step>) -> Self {
        Self {
            script,
            ..Default::default()
        }
    }

    pub fn texts(texts: &[&'static str]) -> Self {
        Self::new(texts.iter().map(|t| Step::Text(*t)).collect())
    }

    /// Fails before any stream is produced.
    pub fn unreachable() -> Self {
        Self {
            fail_on_call: true,
            ..Default::default()
        }
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}

#[async_trait::async_trait]
impl ChatProvider for ScriptedProvider {
    async fn stream_generate(&self, message: Option<&Value>) -> Result<ChunkStream, ProviderError> {
        self.seen.lock().unwrap().push(message.cloned());

        if self.fail_on_call {
            return Err(ProviderError::Api {
                status: 503,
                body: "service unavailable".to_string(),
            });
        }

        let items: Vec<Result<StreamChunk, ProviderError>> = self
            .script
            .iter()
            .map(|step| match step {
                Step::Text(t) => Ok(StreamChunk::from_text(*t)),
                Step::Empty => Ok(StreamChunk::default()),
                Step::Fail(msg) => Err(ProviderError::stream(*msg)),
            })
            .collect();
        Ok(stream::iter(items).boxed())
    }
}

pub fn sse_body(events: &[&str]) -> String {
    events.iter().map(|e| format!("data: {e}\r\n\r\n")).collect()
}

pub fn text_event(text: &str) -> String {
    serde_json::json!({
        "candidates": [{"content": {"role": "model", "parts": [{"text": text}]}}]
    })
    .to_string()
}
