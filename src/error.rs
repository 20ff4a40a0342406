// src/error.rs
use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::message::ChatResponse;

pub const ERROR_REPLY: &str = "Error processing request!";

/// Problems with startup configuration. Always fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("GEMINI_API_KEY is missing; set it in the environment or a .env file")]
    MissingApiKey,

    #[error("PORT must be a number between 0 and 65535, got {0:?}")]
    InvalidPort(String),

    #[error("GEMINI_TIMEOUT_SECS must be a positive number of seconds, got {0:?}")]
    InvalidTimeout(String),
}

/// Anything that can go wrong while talking to the model provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("stream error: {0}")]
    Stream(String),

    #[error("malformed provider response: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ProviderError {
    pub fn stream(message: impl Into<String>) -> Self {
        ProviderError::Stream(message.into())
    }
}

/// Errors surfaced by HTTP handlers.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Body was not a JSON object (bad syntax, wrong content type, ...).
    #[error(transparent)]
    BadRequest(#[from] JsonRejection),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Callers only ever see the generic reply; details stay in the logs.
        let status = match &self {
            AppError::Provider(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::BadRequest(rejection) => {
                tracing::warn!(error = %rejection, "rejected chat request body");
                rejection.status()
            }
        };
        let body = ChatResponse {
            reply: ERROR_REPLY.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
