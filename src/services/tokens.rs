// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Token lifecycle: issuing, verifying and rotating JWT pairs.
//!
//! Both token kinds are HS256 JWTs over the process-wide secret. The
//! refresh token is additionally persisted on the user row; every issuance
//! overwrites the stored value, which implicitly revokes the predecessor
//! (a superseded token still carries a valid signature but no longer
//! matches the store).

use crate::db::Db;
use crate::error::AppError;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

/// Access tokens live 30 minutes.
pub const ACCESS_TOKEN_MINUTES: i64 = 30;
/// Refresh tokens live 30 days.
pub const REFRESH_TOKEN_DAYS: i64 = 30;

/// Which of the two token kinds a JWT claims to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Unique token id; makes every issuance distinct even within the same
    /// second, so rotation always stores a fresh value
    pub jti: String,
    pub kind: TokenKind,
}

impl Claims {
    pub fn user_id(&self) -> Result<i64, TokenError> {
        self.sub.parse().map_err(|_| TokenError::Malformed)
    }
}

/// Token verification / rotation failures.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("malformed token")]
    Malformed,
    #[error("wrong token kind")]
    WrongKind,
    #[error("invalid refresh token")]
    InvalidRefreshToken,
    #[error("user not found")]
    UserNotFound,
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::UserNotFound => AppError::NotFound("User not found".to_string()),
            _ => AppError::InvalidToken,
        }
    }
}

/// A freshly issued access/refresh pair.
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Issues and verifies token pairs against the shared store.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    db: Db,
}

impl TokenService {
    pub fn new(secret: &[u8], db: Db) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            db,
        }
    }

    fn sign(&self, user_id: i64, kind: TokenKind, lifetime: Duration) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + lifetime).timestamp(),
            jti: uuid::Uuid::new_v4().to_string(),
            kind,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT encoding failed: {}", e)))
    }

    /// Issue a fresh pair for a user.
    ///
    /// Side effect: the new refresh token overwrites the stored one, so the
    /// prior refresh token stops rotating even though its signature stays
    /// valid until expiry.
    pub async fn issue_pair(&self, user_id: i64) -> Result<TokenPair, AppError> {
        let access_token = self.sign(
            user_id,
            TokenKind::Access,
            Duration::minutes(ACCESS_TOKEN_MINUTES),
        )?;
        let refresh_token = self.sign(
            user_id,
            TokenKind::Refresh,
            Duration::days(REFRESH_TOKEN_DAYS),
        )?;

        self.db
            .set_refresh_token(user_id, Some(&refresh_token))
            .await?;

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    /// Verify signature, expiry and kind. Tampered or expired tokens fail
    /// closed.
    pub fn verify(&self, token: &str, expected: TokenKind) -> Result<Claims, TokenError> {
        let validation = Validation::new(Algorithm::HS256);
        let data =
            decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                    _ => TokenError::Malformed,
                }
            })?;

        if data.claims.kind != expected {
            return Err(TokenError::WrongKind);
        }
        Ok(data.claims)
    }

    /// Rotate a refresh token into a new pair.
    ///
    /// The presented token must verify as kind=refresh, resolve to an
    /// existing user, and match the stored value: a superseded token fails
    /// here even though its signature is still good. Concurrent rotations
    /// for one user are last-writer-wins.
    pub async fn refresh(&self, presented: &str) -> Result<TokenPair, AppError> {
        let claims = self.verify(presented, TokenKind::Refresh)?;
        let user_id = claims.user_id()?;

        let user = self
            .db
            .get_user(user_id)
            .await?
            .ok_or(TokenError::UserNotFound)?;

        let stored = user
            .refresh_token
            .as_deref()
            .ok_or(TokenError::InvalidRefreshToken)?;
        if !constant_time_eq(stored.as_bytes(), presented.as_bytes()) {
            return Err(TokenError::InvalidRefreshToken.into());
        }

        self.issue_pair(user.id).await
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && bool::from(a.ct_eq(b))
}
