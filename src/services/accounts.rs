// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account management: registration, password hashing and verification.
//!
//! Plaintext passwords exist only on the stack inside these functions;
//! they are never stored or logged.

use crate::db::{Db, NewUser};
use crate::error::{AppError, Result};
use crate::models::User;
use argon2::password_hash::{
    rand_core::{OsRng, RngCore},
    PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
};
use argon2::Argon2;
use chrono::NaiveDate;

/// Validated registration input.
#[derive(Debug, Clone)]
pub struct Registration {
    pub full_name: String,
    pub phone_number: String,
    pub password: String,
    pub email: Option<String>,
    pub username: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
}

/// Phone numbers are digits only, 6 to 15 characters, after trimming.
pub fn valid_phone(phone: &str) -> bool {
    (6..=15).contains(&phone.len()) && phone.bytes().all(|b| b.is_ascii_digit())
}

/// Derive a salted argon2 hash for storage.
pub fn hash_password(plaintext: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Password hashing failed: {}", e)))?;
    Ok(hash.to_string())
}

/// Check a plaintext password against the stored hash. Verification is
/// constant-time within argon2 itself.
pub fn verify_password(user: &User, plaintext: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(&user.password_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(plaintext.as_bytes(), &parsed)
        .is_ok()
}

/// Random password hash for placeholder members. Nobody knows the
/// plaintext, so the account cannot be logged into.
pub fn unusable_password_hash() -> Result<String> {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    hash_password(&hex::encode(bytes))
}

/// Register a new account.
///
/// The phone number must be well-formed and not already held by an active
/// user; the schema-level UNIQUE constraint backs the explicit check.
pub async fn register(db: &Db, reg: Registration) -> Result<User> {
    let phone = reg.phone_number.trim().to_string();
    if !valid_phone(&phone) {
        return Err(AppError::BadRequest(
            "Invalid phone number format. Use only digits (6-15 characters)".to_string(),
        ));
    }

    if let Some(existing) = db.find_user_by_phone(&phone).await? {
        if existing.is_active {
            return Err(AppError::Conflict(
                "User with this phone number already exists".to_string(),
            ));
        }
    }

    let password_hash = hash_password(&reg.password)?;
    db.create_user(NewUser {
        full_name: reg.full_name,
        phone_number: Some(phone),
        email: reg.email,
        username: reg.username,
        password_hash,
        date_of_birth: reg.date_of_birth,
        gender: reg.gender,
    })
    .await
}
