// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Family graph routes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Extension, Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use crate::db::{EdgeUpdate, NewUser};
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::FamilyEdge;
use crate::services::accounts;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/v1/family", get(list_family).post(add_family_member))
        .route(
            "/api/v1/family/{id}",
            put(update_family_member).delete(remove_family_member),
        )
}

// ─── List ────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct FamilyListResponse {
    pub family_members: Vec<FamilyEdge>,
    pub count: usize,
}

/// List the caller's family. The synthetic self edge (id 0) is always
/// first, then real edges in creation order.
async fn list_family(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<FamilyListResponse>> {
    let family_members = state.db.list_family(user.user_id).await?;
    let count = family_members.len();

    Ok(Json(FamilyListResponse {
        family_members,
        count,
    }))
}

// ─── Add ─────────────────────────────────────────────────────

#[derive(Deserialize, Validate)]
pub struct AddFamilyMemberRequest {
    #[validate(length(min = 1, message = "full_name is required"))]
    full_name: String,
    #[validate(length(min = 1, message = "relation is required"))]
    relation: String,
    #[serde(default)]
    phone_number: Option<String>,
    #[serde(default)]
    date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    gender: Option<String>,
}

/// Add a family member.
///
/// A phone number matching an existing account links that account as the
/// member; otherwise a placeholder user is created to anchor the member's
/// records.
async fn add_family_member(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<AddFamilyMemberRequest>,
) -> Result<(StatusCode, Json<FamilyEdge>)> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let phone_number = match payload.phone_number.as_deref() {
        Some(raw) => {
            let phone = raw.trim();
            if !accounts::valid_phone(phone) {
                return Err(AppError::BadRequest(
                    "Invalid phone number format. Use only digits (6-15 characters)".to_string(),
                ));
            }
            Some(phone.to_string())
        }
        None => None,
    };

    let member = NewUser {
        full_name: payload.full_name,
        phone_number,
        email: None,
        username: None,
        // Placeholder accounts can never be logged into
        password_hash: accounts::unusable_password_hash()?,
        date_of_birth: payload.date_of_birth,
        gender: payload.gender,
    };

    let edge = state
        .db
        .add_family_member(user.user_id, member, &payload.relation)
        .await?;

    tracing::info!(
        user_id = user.user_id,
        edge_id = edge.id,
        "Family member added"
    );

    Ok((StatusCode::CREATED, Json(edge)))
}

// ─── Update / Remove ─────────────────────────────────────────

#[derive(Deserialize)]
pub struct UpdateFamilyMemberRequest {
    #[serde(default)]
    relation: Option<String>,
    #[serde(default)]
    full_name: Option<String>,
    #[serde(default)]
    date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    gender: Option<String>,
}

/// Update the relationship label and/or the member's profile fields.
async fn update_family_member(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(edge_id): Path<i64>,
    Json(payload): Json<UpdateFamilyMemberRequest>,
) -> Result<Json<FamilyEdge>> {
    let edge = state
        .db
        .update_family_edge(
            user.user_id,
            edge_id,
            EdgeUpdate {
                relation: payload.relation,
                full_name: payload.full_name,
                date_of_birth: payload.date_of_birth,
                gender: payload.gender,
            },
        )
        .await?;

    Ok(Json(edge))
}

#[derive(Serialize)]
pub struct RemoveFamilyMemberResponse {
    pub message: String,
}

/// Remove a family edge. The member user and any documents anchored to the
/// edge stay in place.
async fn remove_family_member(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(edge_id): Path<i64>,
) -> Result<Json<RemoveFamilyMemberResponse>> {
    state.db.delete_family_edge(user.user_id, edge_id).await?;

    tracing::info!(user_id = user.user_id, edge_id, "Family member removed");

    Ok(Json(RemoveFamilyMemberResponse {
        message: "Family member removed successfully".to_string(),
    }))
}
