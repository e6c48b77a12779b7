// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Authentication and role gating for the API.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use serde_json::json;
use tdil_points::middleware::auth::{Role, SESSION_COOKIE};
use tower::ServiceExt;

mod common;

#[tokio::test]
async fn test_health_is_public() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["storage"], "memory");
}

#[tokio::test]
async fn test_points_requires_token() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/points/me")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_signed_with_wrong_key_is_rejected() {
    let (app, _) = common::create_test_app();
    let token = common::create_test_jwt(12, Role::Member, b"some_other_key_that_is_32_bytes!");

    let response = app
        .oneshot(common::json_request("GET", "/api/points/me", &token, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_malformed_authorization_header() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/levels")
                .header(header::AUTHORIZATION, "Token abc")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_session_cookie_is_accepted() {
    let (app, state) = common::create_test_app();
    let token = common::create_test_jwt(12, Role::Member, &state.config.jwt_signing_key);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/levels")
                .header(header::COOKIE, format!("{}={}", SESSION_COOKIE, token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_member_cannot_use_admin_routes() {
    let (app, state) = common::create_test_app();
    let token = common::create_test_jwt(12, Role::Member, &state.config.jwt_signing_key);

    let response = app
        .oneshot(common::json_request(
            "POST",
            "/api/admin/points/award",
            &token,
            Some(json!({ "userId": 12, "amount": 1000, "reason": "self-service" })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_route_without_token() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/admin/accounts")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"userId":1,"displayName":"A"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_security_headers_on_api_responses() {
    let (app, state) = common::create_test_app();
    let token = common::create_test_jwt(12, Role::Member, &state.config.jwt_signing_key);

    let response = app
        .oneshot(common::json_request("GET", "/api/levels", &token, None))
        .await
        .unwrap();

    assert_eq!(
        response.headers().get("X-Content-Type-Options").unwrap(),
        "nosniff"
    );
    assert_eq!(response.headers().get("Cache-Control").unwrap(), "no-store");
}
