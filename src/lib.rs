// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Medkin: personal and family health-record backend.
//!
//! This crate provides the API for accounts and token lifecycle, the
//! family-relationship graph, medical-document metadata over object
//! storage, health metrics, and the chat assistant.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use config::Config;
use db::Db;
use services::{ChatClient, ObjectStore, TokenService};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Db,
    pub tokens: TokenService,
    pub storage: ObjectStore,
    pub chat: ChatClient,
}
