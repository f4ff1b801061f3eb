// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Family graph invariants: the synthetic self edge, edge uniqueness,
//! owner scoping.

use axum::http::{Method, StatusCode};
use serde_json::json;

mod common;

#[tokio::test]
async fn test_list_always_starts_with_single_self_edge() {
    let (app, _) = common::create_test_app().await;
    let (token, _, user_id) = common::signup(&app, "Asha Rao", "5551234567", "hunter2!").await;

    let (status, body) =
        common::json_request(&app, Method::GET, "/api/v1/family", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let members = body["family_members"].as_array().unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0]["id"], 0);
    assert_eq!(members[0]["relation"], "self");
    assert_eq!(members[0]["member_id"], user_id);

    // Still exactly one self edge after adding a real member
    let (status, _) = common::json_request(
        &app,
        Method::POST,
        "/api/v1/family",
        Some(&token),
        Some(json!({"full_name": "Ravi Rao", "relation": "brother"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, body) =
        common::json_request(&app, Method::GET, "/api/v1/family", Some(&token), None).await;
    let members = body["family_members"].as_array().unwrap();
    assert_eq!(members.len(), 2);
    let self_edges: Vec<_> = members.iter().filter(|m| m["id"] == 0).collect();
    assert_eq!(self_edges.len(), 1);
    assert_eq!(members[0]["id"], 0, "self edge must come first");
}

#[tokio::test]
async fn test_add_creates_placeholder_member() {
    let (app, state) = common::create_test_app().await;
    let (token, _, user_id) = common::signup(&app, "Asha Rao", "5551234567", "hunter2!").await;

    let (status, body) = common::json_request(
        &app,
        Method::POST,
        "/api/v1/family",
        Some(&token),
        Some(json!({
            "full_name": "Meera Rao",
            "relation": "mother",
            "date_of_birth": "1960-04-12",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["relation"], "mother");
    assert_eq!(body["member_name"], "Meera Rao");

    // The placeholder is a real user row distinct from the owner
    let member_id = body["member_id"].as_i64().unwrap();
    assert_ne!(member_id, user_id);
    let member = state.db.get_user(member_id).await.unwrap().unwrap();
    assert_eq!(member.full_name, "Meera Rao");
    assert!(member.phone_number.is_none());
}

#[tokio::test]
async fn test_add_reuses_existing_user_by_phone_and_conflicts_on_duplicate() {
    let (app, _) = common::create_test_app().await;
    let (token_a, _, _) = common::signup(&app, "Asha Rao", "5551234567", "hunter2!").await;
    let (_, _, user_b) = common::signup(&app, "Ravi Rao", "5557654321", "secret99").await;

    // Phone selector matches Ravi's account, so he becomes the member
    let (status, body) = common::json_request(
        &app,
        Method::POST,
        "/api/v1/family",
        Some(&token_a),
        Some(json!({
            "full_name": "Ravi Rao",
            "relation": "sibling",
            "phone_number": "5557654321",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["member_id"].as_i64().unwrap(), user_b);

    // Adding the same person again is a duplicate edge
    let (status, body) = common::json_request(
        &app,
        Method::POST,
        "/api/v1/family",
        Some(&token_a),
        Some(json!({
            "full_name": "Ravi Rao",
            "relation": "sibling",
            "phone_number": "5557654321",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT, "{}", body);
}

#[tokio::test]
async fn test_add_same_phone_twice_conflicts_via_placeholder() {
    let (app, _) = common::create_test_app().await;
    let (token, _, _) = common::signup(&app, "Asha Rao", "5551234567", "hunter2!").await;

    let (status, _) = common::json_request(
        &app,
        Method::POST,
        "/api/v1/family",
        Some(&token),
        Some(json!({"full_name": "Meera", "relation": "mother", "phone_number": "5550001234"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    // The placeholder created above now matches the phone selector
    let (status, _) = common::json_request(
        &app,
        Method::POST,
        "/api/v1/family",
        Some(&token),
        Some(json!({"full_name": "Meera", "relation": "mother", "phone_number": "5550001234"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_add_requires_fields() {
    let (app, _) = common::create_test_app().await;
    let (token, _, _) = common::signup(&app, "Asha Rao", "5551234567", "hunter2!").await;

    let (status, _) = common::json_request(
        &app,
        Method::POST,
        "/api/v1/family",
        Some(&token),
        Some(json!({"full_name": "", "relation": "mother"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = common::json_request(
        &app,
        Method::POST,
        "/api/v1/family",
        Some(&token),
        Some(json!({"full_name": "Meera", "relation": "mother", "phone_number": "not-digits"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_update_edge_and_member_profile_together() {
    let (app, _) = common::create_test_app().await;
    let (token, _, _) = common::signup(&app, "Asha Rao", "5551234567", "hunter2!").await;

    let (_, body) = common::json_request(
        &app,
        Method::POST,
        "/api/v1/family",
        Some(&token),
        Some(json!({"full_name": "Meera", "relation": "mother"})),
    )
    .await;
    let edge_id = body["id"].as_i64().unwrap();

    let (status, body) = common::json_request(
        &app,
        Method::PUT,
        &format!("/api/v1/family/{}", edge_id),
        Some(&token),
        Some(json!({"relation": "mother-in-law", "full_name": "Meera Devi"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["relation"], "mother-in-law");
    assert_eq!(body["member_name"], "Meera Devi");
}

#[tokio::test]
async fn test_cross_owner_operations_report_not_found() {
    let (app, _) = common::create_test_app().await;
    let (token_a, _, _) = common::signup(&app, "Asha Rao", "5551234567", "hunter2!").await;
    let (token_b, _, _) = common::signup(&app, "Bela Sen", "5559876543", "secret99").await;

    let (_, body) = common::json_request(
        &app,
        Method::POST,
        "/api/v1/family",
        Some(&token_a),
        Some(json!({"full_name": "Meera", "relation": "mother"})),
    )
    .await;
    let edge_id = body["id"].as_i64().unwrap();

    // Another owner sees NotFound, not a distinguishable "forbidden"
    let (status, body) = common::json_request(
        &app,
        Method::DELETE,
        &format!("/api/v1/family/{}", edge_id),
        Some(&token_b),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");

    let (status, _) = common::json_request(
        &app,
        Method::PUT,
        &format!("/api/v1/family/{}", edge_id),
        Some(&token_b),
        Some(json!({"relation": "uncle"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // The edge is still there for its owner
    let (status, _) = common::json_request(
        &app,
        Method::DELETE,
        &format!("/api/v1/family/{}", edge_id),
        Some(&token_a),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_self_edge_cannot_be_updated_or_removed() {
    let (app, _) = common::create_test_app().await;
    let (token, _, _) = common::signup(&app, "Asha Rao", "5551234567", "hunter2!").await;

    let (status, _) = common::json_request(
        &app,
        Method::PUT,
        "/api/v1/family/0",
        Some(&token),
        Some(json!({"relation": "me"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) =
        common::json_request(&app, Method::DELETE, "/api/v1/family/0", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_remove_edge_keeps_member_and_documents() {
    let (app, state) = common::create_test_app().await;
    let (token, _, user_id) = common::signup(&app, "Asha Rao", "5551234567", "hunter2!").await;

    let (_, body) = common::json_request(
        &app,
        Method::POST,
        "/api/v1/family",
        Some(&token),
        Some(json!({"full_name": "Meera", "relation": "mother"})),
    )
    .await;
    let edge_id = body["id"].as_i64().unwrap();
    let member_id = body["member_id"].as_i64().unwrap();

    let doc_id = common::register_document(&app, &token, edge_id, "mri", "2024-05-01").await;

    let (status, _) = common::json_request(
        &app,
        Method::DELETE,
        &format!("/api/v1/family/{}", edge_id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // No cascade: the member user and the document rows survive
    assert!(state.db.get_user(member_id).await.unwrap().is_some());
    assert!(state
        .db
        .get_document(user_id, doc_id)
        .await
        .unwrap()
        .is_some());
}
