// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod chat;
pub mod document;
pub mod family;
pub mod health;
pub mod user;

pub use chat::ChatMessage;
pub use document::{DocumentRecord, DocumentType, Medicine};
pub use family::{FamilyEdge, SELF_EDGE_ID, SELF_RELATION};
pub use health::HealthData;
pub use user::User;
