// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Family graph edges.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

/// Edge id of the synthetic self edge. Never stored.
pub const SELF_EDGE_ID: i64 = 0;

/// Relationship label of the synthetic self edge.
pub const SELF_RELATION: &str = "self";

/// A directed ownership edge from an owner to a member user, joined with
/// the member's profile fields for listing.
///
/// `(user_id, member_id)` is unique; the reverse direction is a distinct
/// edge. The member may be a placeholder user.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct FamilyEdge {
    pub id: i64,
    #[serde(skip)]
    pub user_id: i64,
    pub member_id: i64,
    pub relation: String,
    pub member_name: String,
    pub member_phone: Option<String>,
    pub member_date_of_birth: Option<NaiveDate>,
    pub member_gender: Option<String>,
    pub created_at: DateTime<Utc>,
}
