//! Integration tests for registration, login, and token enforcement.

mod common;

use axum::http::StatusCode;
use common::{form_request, json_request, register_and_login, spawn_app};
use serde_json::json;

#[tokio::test]
async fn registering_the_same_username_twice_is_rejected() {
    let app = spawn_app().await;

    let (status, _) = json_request(
        &app.router,
        "POST",
        "/register",
        Some(json!({"username": "alice", "password": "pw1"})),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = json_request(
        &app.router,
        "POST",
        "/register",
        Some(json!({"username": "alice", "password": "another"})),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn path_hostile_usernames_are_rejected() {
    let app = spawn_app().await;

    for username in ["", "..", "../evil", "a b c"] {
        let (status, _) = json_request(
            &app.router,
            "POST",
            "/register",
            Some(json!({"username": username, "password": "pw1"})),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "username {:?}", username);
    }
}

#[tokio::test]
async fn login_yields_a_usable_bearer_token() {
    let app = spawn_app().await;
    let token = register_and_login(&app.router, "alice", "pw1").await;

    let (status, body) =
        json_request(&app.router, "GET", "/documents", None, Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["documents"], json!([]));
}

#[tokio::test]
async fn wrong_password_and_unknown_user_fail_identically() {
    let app = spawn_app().await;
    register_and_login(&app.router, "alice", "pw1").await;

    let (wrong_status, wrong_body) =
        form_request(&app.router, "/token", "username=alice&password=nope").await;
    let (unknown_status, unknown_body) =
        form_request(&app.router, "/token", "username=mallory&password=nope").await;

    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_body, unknown_body);
}

#[tokio::test]
async fn protected_routes_reject_missing_or_garbage_tokens() {
    let app = spawn_app().await;

    for uri in ["/documents", "/history"] {
        let (status, _) = json_request(&app.router, "GET", uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "no token on {}", uri);

        let (status, _) =
            json_request(&app.router, "GET", uri, None, Some("not-a-real-token")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "garbage token on {}", uri);
    }

    let (status, _) = json_request(
        &app.router,
        "POST",
        "/chat",
        Some(json!({"message": "hi", "document_ids": []})),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn health_check_is_public_and_reports_both_probes() {
    let app = spawn_app().await;

    let (status, body) = json_request(&app.router, "GET", "/", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "connected");
    assert_eq!(body["inference_backend"], "connected");
}

#[tokio::test]
async fn health_check_reports_a_down_inference_backend_without_failing() {
    let app = common::spawn_app_with(common::StubMode::Degraded).await;

    let (status, body) = json_request(&app.router, "GET", "/", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "connected");
    assert_eq!(body["inference_backend"], "disconnected");
}
