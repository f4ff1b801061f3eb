// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Signup, login, token refresh and profile routes.

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::{Validate, ValidationError};

use crate::db::ProfileUpdate;
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::User;
use crate::services::accounts::{self, Registration};
use crate::services::tokens::TokenPair;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/v1/auth/signup", post(signup))
        .route("/api/v1/auth/login", post(login))
        .route("/api/v1/auth/refresh", post(refresh))
}

pub fn protected_routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/v1/auth/me", get(me).put(update_me))
}

fn validate_phone(phone: &str) -> std::result::Result<(), ValidationError> {
    if accounts::valid_phone(phone.trim()) {
        Ok(())
    } else {
        Err(ValidationError::new("phone_format"))
    }
}

// ─── Signup / Login ──────────────────────────────────────────

#[derive(Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(length(min = 1, message = "full_name is required"))]
    full_name: String,
    #[validate(custom(function = validate_phone))]
    phone_number: String,
    #[validate(length(min = 1, message = "password is required"))]
    password: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    gender: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    phone_number: String,
    password: String,
}

/// Short user view returned with token pairs.
#[derive(Serialize)]
pub struct UserSummary {
    pub id: i64,
    pub full_name: String,
    pub phone_number: Option<String>,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            full_name: user.full_name.clone(),
            phone_number: user.phone_number.clone(),
        }
    }
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub message: String,
    pub user: UserSummary,
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
}

impl AuthResponse {
    fn new(message: &str, user: &User, pair: TokenPair) -> Self {
        Self {
            message: message.to_string(),
            user: user.into(),
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            token_type: "Bearer".to_string(),
        }
    }
}

/// Create a new account and log it in.
async fn signup(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SignupRequest>,
) -> Result<(StatusCode, Json<AuthResponse>)> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let user = accounts::register(
        &state.db,
        Registration {
            full_name: payload.full_name,
            phone_number: payload.phone_number,
            password: payload.password,
            email: payload.email,
            username: payload.username,
            date_of_birth: payload.date_of_birth,
            gender: payload.gender,
        },
    )
    .await?;

    let pair = state.tokens.issue_pair(user.id).await?;

    tracing::info!(user_id = user.id, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse::new("User created successfully", &user, pair)),
    ))
}

/// Verify credentials and issue a fresh token pair.
async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    if payload.phone_number.is_empty() || payload.password.is_empty() {
        return Err(AppError::BadRequest(
            "Phone number and password required".to_string(),
        ));
    }

    // Missing user and wrong password are indistinguishable to the caller
    let user = state
        .db
        .find_user_by_phone(payload.phone_number.trim())
        .await?
        .ok_or(AppError::Unauthorized)?;

    if !accounts::verify_password(&user, &payload.password) {
        return Err(AppError::Unauthorized);
    }

    let pair = state.tokens.issue_pair(user.id).await?;

    tracing::info!(user_id = user.id, "User logged in");

    Ok(Json(AuthResponse::new("Login successful", &user, pair)))
}

// ─── Token Refresh ───────────────────────────────────────────

#[derive(Deserialize)]
pub struct RefreshRequest {
    refresh_token: String,
}

#[derive(Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
}

/// Rotate a refresh token into a new pair.
async fn refresh(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<TokenResponse>> {
    let pair = state.tokens.refresh(&payload.refresh_token).await?;

    Ok(Json(TokenResponse {
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
        token_type: "Bearer".to_string(),
    }))
}

// ─── Profile ─────────────────────────────────────────────────

#[derive(Serialize)]
pub struct UserProfile {
    pub id: i64,
    pub full_name: String,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub username: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
}

#[derive(Serialize)]
pub struct ProfileResponse {
    pub user: UserProfile,
}

impl From<User> for ProfileResponse {
    fn from(user: User) -> Self {
        Self {
            user: UserProfile {
                id: user.id,
                full_name: user.full_name,
                phone_number: user.phone_number,
                email: user.email,
                username: user.username,
                date_of_birth: user.date_of_birth,
                gender: user.gender,
            },
        }
    }
}

/// Get the caller's profile.
async fn me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ProfileResponse>> {
    let profile = state
        .db
        .get_user(user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(profile.into()))
}

#[derive(Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, message = "full_name must not be empty"))]
    #[serde(default)]
    full_name: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    gender: Option<String>,
}

/// Update profile fields; absent fields are left unchanged.
async fn update_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<ProfileResponse>> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let updated = state
        .db
        .update_user_profile(
            user.user_id,
            ProfileUpdate {
                full_name: payload.full_name,
                email: payload.email,
                username: payload.username,
                date_of_birth: payload.date_of_birth,
                gender: payload.gender,
            },
        )
        .await?;

    Ok(Json(updated.into()))
}
