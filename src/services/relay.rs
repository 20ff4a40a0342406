// src/services/relay.rs
use std::sync::Arc;

use futures::{Stream, StreamExt};
use serde_json::Value;

use super::provider::{ChatProvider, StreamChunk};
use crate::error::{AppError, ProviderError};
use crate::message::{ChatRequest, ChatResponse};

pub const FALLBACK_REPLY: &str = "Sorry, I couldn't process that.";

/// Concatenate fragment text in arrival order. Stops at the first error.
pub async fn aggregate<S>(chunks: S) -> Result<String, ProviderError>
where
    S: Stream<Item = Result<StreamChunk, ProviderError>>,
{
    let mut chunks = std::pin::pin!(chunks);
    let mut reply = String::new();
    while let Some(chunk) = chunks.next().await {
        reply.push_str(chunk?.text());
    }
    Ok(reply)
}

/// Trim the aggregate, falling back to a canned reply when nothing is left.
pub fn finalize_reply(aggregate: &str) -> String {
    match aggregate.trim() {
        "" => FALLBACK_REPLY.to_string(),
        trimmed => trimmed.to_string(),
    }
}

/// Forwards one user message to the model and collects the streamed answer.
#[derive(Clone)]
pub struct ChatRelay {
    provider: Arc<dyn ChatProvider>,
}

impl ChatRelay {
    pub fn new(provider: Arc<dyn ChatProvider>) -> Self {
        Self { provider }
    }

    pub async fn reply(&self, message: Option<&Value>) -> Result<String, ProviderError> {
        let chunks = self.provider.stream_generate(message).await?;
        let aggregate = aggregate(chunks).await?;
        Ok(finalize_reply(&aggregate))
    }

    /// Any provider failure is logged here and turned into an [`AppError`];
    /// nothing partial is returned.
    pub async fn handle(&self, request: ChatRequest) -> Result<ChatResponse, AppError> {
        tracing::debug!(
            message_len = request.message.as_ref().and_then(serde_json::Value::as_str).map(str::len),
            "relaying chat message"
        );

        match self.reply(request.message.as_ref()).await {
            Ok(reply) => Ok(ChatResponse { reply }),
            Err(err) => {
                tracing::error!(error = %err, "error with gemini api");
                Err(err.into())
            }
        }
    }
}
