// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Persisted chat turns.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// One completed chat exchange, keyed by `(user, edge)`.
///
/// History is replayed to the provider in `created_at` order on every call;
/// there is no in-process session state.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ChatMessage {
    pub id: i64,
    #[serde(skip)]
    pub user_id: i64,
    pub family_member_id: i64,
    pub user_message: String,
    pub bot_response: String,
    pub created_at: DateTime<Utc>,
}
