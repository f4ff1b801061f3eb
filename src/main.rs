// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Medkin API Server
//!
//! Personal and family health records: accounts, family graph, medical
//! documents backed by object storage, health metrics and a chat assistant.

use medkin::{
    config::Config,
    db::Db,
    services::{ChatClient, ObjectStore, TokenService},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, "Starting Medkin API");

    // Connect to the relational store and run migrations
    let db = Db::connect(&config.database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!(url = %config.database_url, "Database ready");

    // Token service shares the process-wide signing secret
    let tokens = TokenService::new(&config.jwt_secret, db.clone());

    // Object storage client for document blobs
    let storage = ObjectStore::new(
        config.s3_bucket.clone(),
        config.aws_region.clone(),
        config.aws_access_key.clone(),
        config.aws_secret_key.clone(),
    );
    tracing::info!(bucket = %config.s3_bucket, "Object storage client initialized");

    // Chat provider client
    let chat = ChatClient::new(config.gemini_api_key.clone(), config.gemini_model.clone());
    tracing::info!(model = %config.gemini_model, "Chat client initialized");

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        tokens,
        storage,
        chat,
    });

    // Build router
    let app = medkin::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("medkin=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
