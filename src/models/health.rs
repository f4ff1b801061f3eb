//! Health metric samples (Health Connect style).

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A single recorded health metric, scoped to an owner and a family edge.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct HealthData {
    pub id: i64,
    #[serde(skip)]
    pub user_id: i64,
    pub family_member_id: i64,
    /// e.g. "heart_rate", "steps", "blood_glucose"
    pub data_type: String,
    pub value: f64,
    pub unit: Option<String>,
    pub recorded_at: DateTime<Utc>,
    pub source: Option<String>,
    pub created_at: DateTime<Utc>,
}
