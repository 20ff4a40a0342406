// src/message.rs
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Debug, Default, Deserialize)]
pub struct ChatRequest {
    /// Forwarded to the model untouched, whatever its JSON type. `None` only
    /// when the field is missing; an explicit `null` is kept as `Some(Null)`.
    #[serde(default, deserialize_with = "present")]
    pub message: Option<Value>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ChatResponse {
    pub reply: String,
}
