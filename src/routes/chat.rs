// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Chat assistant routes.
//!
//! Conversation context is rebuilt from persisted history on every call;
//! nothing is cached in-process.

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::ChatMessage;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/v1/chat", post(chat))
        .route("/api/v1/chat/history", get(chat_history))
}

#[derive(Deserialize, Validate)]
pub struct ChatRequest {
    #[validate(length(min = 1, message = "message is required"))]
    message: String,
    /// 0 = conversation about the caller themselves
    #[serde(default)]
    family_member_id: i64,
}

#[derive(Serialize)]
pub struct ChatResponse {
    pub response: String,
}

/// One chat turn: replay stored history, ask the provider, persist the
/// exchange.
async fn chat(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    state
        .db
        .resolve_edge(user.user_id, payload.family_member_id)
        .await?;

    let history = state
        .db
        .list_chat_history(user.user_id, payload.family_member_id)
        .await?;

    let response = state.chat.respond(&history, &payload.message).await?;

    state
        .db
        .insert_chat_message(
            user.user_id,
            payload.family_member_id,
            &payload.message,
            &response,
        )
        .await?;

    Ok(Json(ChatResponse { response }))
}

#[derive(Deserialize)]
pub struct ChatHistoryQuery {
    #[serde(default)]
    family_member_id: i64,
}

#[derive(Serialize)]
pub struct ChatHistoryResponse {
    pub messages: Vec<ChatMessage>,
    pub count: usize,
}

/// Stored turns for one conversation, oldest first.
async fn chat_history(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<ChatHistoryQuery>,
) -> Result<Json<ChatHistoryResponse>> {
    state
        .db
        .resolve_edge(user.user_id, params.family_member_id)
        .await?;

    let messages = state
        .db
        .list_chat_history(user.user_id, params.family_member_id)
        .await?;
    let count = messages.len();

    Ok(Json(ChatHistoryResponse { messages, count }))
}
