// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod accounts;
pub mod chat;
pub mod storage;
pub mod tokens;

pub use chat::ChatClient;
pub use storage::ObjectStore;
pub use tokens::{TokenError, TokenKind, TokenPair, TokenService};
