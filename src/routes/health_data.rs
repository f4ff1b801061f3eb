// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Health metric routes (Health Connect style samples).

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use crate::db::NewHealthData;
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::HealthData;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route(
        "/api/v1/health_data",
        get(list_health_data).post(record_health_data),
    )
}

#[derive(Deserialize, Validate)]
pub struct RecordHealthDataRequest {
    #[validate(length(min = 1, message = "data_type is required"))]
    data_type: String,
    value: f64,
    #[serde(default)]
    unit: Option<String>,
    recorded_at: DateTime<Utc>,
    #[serde(default)]
    source: Option<String>,
    /// 0 = the caller's own data
    #[serde(default)]
    family_member_id: i64,
}

/// Record one metric sample.
async fn record_health_data(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<RecordHealthDataRequest>,
) -> Result<(StatusCode, Json<HealthData>)> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    state
        .db
        .resolve_edge(user.user_id, payload.family_member_id)
        .await?;

    let sample = state
        .db
        .insert_health_data(NewHealthData {
            user_id: user.user_id,
            family_member_id: payload.family_member_id,
            data_type: payload.data_type,
            value: payload.value,
            unit: payload.unit,
            recorded_at: payload.recorded_at,
            source: payload.source,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(sample)))
}

#[derive(Deserialize)]
pub struct HealthDataQuery {
    #[serde(default)]
    family_member_id: Option<i64>,
    #[serde(default)]
    data_type: Option<String>,
}

#[derive(Serialize)]
pub struct HealthDataListResponse {
    pub health_data: Vec<HealthData>,
    pub count: usize,
}

/// List samples, newest first, optionally filtered by edge and data type.
async fn list_health_data(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<HealthDataQuery>,
) -> Result<Json<HealthDataListResponse>> {
    if let Some(edge_id) = params.family_member_id {
        state.db.resolve_edge(user.user_id, edge_id).await?;
    }

    let health_data = state
        .db
        .list_health_data(
            user.user_id,
            params.family_member_id,
            params.data_type.as_deref(),
        )
        .await?;
    let count = health_data.len();

    Ok(Json(HealthDataListResponse { health_data, count }))
}
