// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use http_body_util::BodyExt;
use medkin::config::Config;
use medkin::db::Db;
use medkin::routes::create_router;
use medkin::services::{ChatClient, ObjectStore, TokenService};
use medkin::AppState;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt; // for oneshot

/// Create a test app with an in-memory database and offline mock
/// collaborators. Returns the router and the shared state.
#[allow(dead_code)]
pub async fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let config = Config::test_default();
    let db = Db::connect_in_memory()
        .await
        .expect("Failed to create in-memory database");
    let tokens = TokenService::new(&config.jwt_secret, db.clone());

    let state = Arc::new(AppState {
        config,
        db,
        tokens,
        storage: ObjectStore::new_mock(),
        chat: ChatClient::new_mock(),
    });

    (create_router(state.clone()), state)
}

/// Issue a request against the router and decode the JSON body (if any).
#[allow(dead_code)]
pub async fn json_request(
    app: &axum::Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }

    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("Failed to build request");

    let response = app.clone().oneshot(request).await.expect("Request failed");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to read body")
        .to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("Body was not JSON")
    };

    (status, value)
}

/// Sign up a user and return their access token, refresh token and id.
#[allow(dead_code)]
pub async fn signup(
    app: &axum::Router,
    full_name: &str,
    phone: &str,
    password: &str,
) -> (String, String, i64) {
    let (status, body) = json_request(
        app,
        Method::POST,
        "/api/v1/auth/signup",
        None,
        Some(json!({
            "full_name": full_name,
            "phone_number": phone,
            "password": password,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "signup failed: {}", body);

    (
        body["access_token"].as_str().unwrap().to_string(),
        body["refresh_token"].as_str().unwrap().to_string(),
        body["user"]["id"].as_i64().unwrap(),
    )
}

/// Register a document via the presigned-upload completion route.
#[allow(dead_code)]
pub async fn register_document(
    app: &axum::Router,
    token: &str,
    edge_id: i64,
    name: &str,
    date: &str,
) -> i64 {
    let (status, body) = json_request(
        app,
        Method::POST,
        "/api/v1/documents/complete_upload",
        Some(token),
        Some(json!({
            "document_name": name,
            "document_type": "Prescription",
            "document_date": date,
            "family_member_id": edge_id,
            "s3_key": format!("s3://mock-bucket/documents/user_1/member_{}/prescription/{}.pdf", edge_id, name),
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);
    body["document_id"].as_i64().unwrap()
}
