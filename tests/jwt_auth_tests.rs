// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Token compatibility with the tDIL login flow.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::json;
use tower::ServiceExt;

mod common;

fn sign(claims: serde_json::Value, key: &[u8]) -> String {
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(key),
    )
    .unwrap()
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

async fn get_me(app: axum::Router, token: &str) -> StatusCode {
    app.oneshot(
        Request::builder()
            .uri("/api/points/me")
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap()
    .status()
}

#[tokio::test]
async fn test_token_without_role_is_member() {
    let (app, state) = common::create_test_app();
    state.points.open_account(5, "Quinn").await.unwrap();

    let token = sign(
        json!({ "sub": "5", "iat": now(), "exp": now() + 3600 }),
        &state.config.jwt_signing_key,
    );

    assert_eq!(get_me(app.clone(), &token).await, StatusCode::OK);

    let response = app
        .oneshot(common::json_request("GET", "/api/admin/points/5/history", &token, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_expired_token_rejected() {
    let (app, state) = common::create_test_app();
    let token = sign(
        json!({ "sub": "5", "role": "member", "iat": now() - 7200, "exp": now() - 3600 }),
        &state.config.jwt_signing_key,
    );

    assert_eq!(get_me(app, &token).await, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_non_numeric_subject_rejected() {
    let (app, state) = common::create_test_app();
    let token = sign(
        json!({ "sub": "not-a-user", "iat": now(), "exp": now() + 3600 }),
        &state.config.jwt_signing_key,
    );

    assert_eq!(get_me(app, &token).await, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unknown_role_rejected() {
    let (app, state) = common::create_test_app();
    let token = sign(
        json!({ "sub": "5", "role": "superuser", "iat": now(), "exp": now() + 3600 }),
        &state.config.jwt_signing_key,
    );

    assert_eq!(get_me(app, &token).await, StatusCode::UNAUTHORIZED);
}
