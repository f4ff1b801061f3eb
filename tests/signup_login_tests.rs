// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account lifecycle: signup, login, refresh rotation, profile.

use axum::http::{Method, StatusCode};
use serde_json::json;

mod common;

#[tokio::test]
async fn test_signup_login_profile_end_to_end() {
    let (app, _) = common::create_test_app().await;

    // Register
    let (status, body) = common::json_request(
        &app,
        Method::POST,
        "/api/v1/auth/signup",
        None,
        Some(json!({
            "full_name": "Asha Rao",
            "phone_number": "5551234567",
            "password": "hunter2!",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"]["phone_number"], "5551234567");
    assert_eq!(body["token_type"], "Bearer");
    assert!(body["access_token"].as_str().is_some());
    assert!(body["refresh_token"].as_str().is_some());

    // Login with the correct password returns a pair
    let (status, body) = common::json_request(
        &app,
        Method::POST,
        "/api/v1/auth/login",
        None,
        Some(json!({"phone_number": "5551234567", "password": "hunter2!"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let access = body["access_token"].as_str().unwrap().to_string();

    // Profile returns what was supplied at registration
    let (status, body) =
        common::json_request(&app, Method::GET, "/api/v1/auth/me", Some(&access), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["full_name"], "Asha Rao");
    assert_eq!(body["user"]["phone_number"], "5551234567");
}

#[tokio::test]
async fn test_signup_duplicate_phone_conflicts() {
    let (app, _) = common::create_test_app().await;
    common::signup(&app, "Asha Rao", "5551234567", "hunter2!").await;

    let (status, body) = common::json_request(
        &app,
        Method::POST,
        "/api/v1/auth/signup",
        None,
        Some(json!({
            "full_name": "Someone Else",
            "phone_number": "5551234567",
            "password": "different",
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");
}

#[tokio::test]
async fn test_signup_rejects_malformed_phone() {
    let (app, _) = common::create_test_app().await;

    for phone in ["12345", "1234567890123456", "555-123-4567", "phone"] {
        let (status, _) = common::json_request(
            &app,
            Method::POST,
            "/api/v1/auth/signup",
            None,
            Some(json!({
                "full_name": "Asha Rao",
                "phone_number": phone,
                "password": "hunter2!",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "accepted phone {:?}", phone);
    }
}

#[tokio::test]
async fn test_signup_trims_phone() {
    let (app, _) = common::create_test_app().await;

    let (status, body) = common::json_request(
        &app,
        Method::POST,
        "/api/v1/auth/signup",
        None,
        Some(json!({
            "full_name": "Asha Rao",
            "phone_number": "  5551234567  ",
            "password": "hunter2!",
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"]["phone_number"], "5551234567");
}

#[tokio::test]
async fn test_login_wrong_password_unauthorized() {
    let (app, _) = common::create_test_app().await;
    common::signup(&app, "Asha Rao", "5551234567", "hunter2!").await;

    let (status, _) = common::json_request(
        &app,
        Method::POST,
        "/api/v1/auth/login",
        None,
        Some(json!({"phone_number": "5551234567", "password": "wrong"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Unknown phone is indistinguishable from a bad password
    let (status, _) = common::json_request(
        &app,
        Method::POST,
        "/api/v1/auth/login",
        None,
        Some(json!({"phone_number": "5559999999", "password": "hunter2!"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_rotation_supersedes_old_token() {
    let (app, _) = common::create_test_app().await;
    let (_, refresh_token, _) = common::signup(&app, "Asha Rao", "5551234567", "hunter2!").await;

    // First rotation succeeds
    let (status, body) = common::json_request(
        &app,
        Method::POST,
        "/api/v1/auth/refresh",
        None,
        Some(json!({"refresh_token": refresh_token})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let new_refresh = body["refresh_token"].as_str().unwrap().to_string();
    assert_ne!(new_refresh, refresh_token);

    // The superseded token is no longer accepted
    let (status, _) = common::json_request(
        &app,
        Method::POST,
        "/api/v1/auth/refresh",
        None,
        Some(json!({"refresh_token": refresh_token})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // The current token still rotates
    let (status, _) = common::json_request(
        &app,
        Method::POST,
        "/api/v1/auth/refresh",
        None,
        Some(json!({"refresh_token": new_refresh})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_refresh_rejects_access_token() {
    let (app, _) = common::create_test_app().await;
    let (access_token, _, _) = common::signup(&app, "Asha Rao", "5551234567", "hunter2!").await;

    let (status, _) = common::json_request(
        &app,
        Method::POST,
        "/api/v1/auth/refresh",
        None,
        Some(json!({"refresh_token": access_token})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_profile_update() {
    let (app, _) = common::create_test_app().await;
    let (token, _, _) = common::signup(&app, "Asha Rao", "5551234567", "hunter2!").await;

    let (status, body) = common::json_request(
        &app,
        Method::PUT,
        "/api/v1/auth/me",
        Some(&token),
        Some(json!({"email": "asha@example.com", "gender": "female"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["email"], "asha@example.com");
    // Untouched fields keep their values
    assert_eq!(body["user"]["full_name"], "Asha Rao");
    assert_eq!(body["user"]["phone_number"], "5551234567");
}
