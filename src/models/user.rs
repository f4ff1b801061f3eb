//! User model for storage and API.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// User account row.
///
/// A user is either a real account holder or a placeholder created to
/// anchor a family member's records; the two are not distinguished by a
/// flag, a placeholder simply has an unusable password and usually no
/// phone number.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub full_name: String,
    /// Unique when present; placeholders may have none
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub username: Option<String>,
    #[serde(skip)]
    pub password_hash: String,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    /// Current refresh token; overwritten on every issuance
    #[serde(skip)]
    pub refresh_token: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
