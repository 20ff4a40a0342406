// src/routes/chat.rs
use axum::{Json, extract::State, extract::rejection::JsonRejection};

use crate::{
    error::AppError,
    message::{ChatRequest, ChatResponse},
    state::SharedState,
};

pub async fn chat_handler(
    State(state): State<SharedState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, AppError> {
    let Json(payload) = payload?;
    let response = state.relay.handle(payload).await?;
    Ok(Json(response))
}
