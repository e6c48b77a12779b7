// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Reward catalog and redemption through the API.

use axum::http::StatusCode;
use serde_json::json;
use tdil_points::middleware::auth::Role;
use tower::ServiceExt;

mod common;

const ADMIN_ID: u64 = 1;
const MEMBER_ID: u64 = 30;

/// App with one member holding `points` and a catalog of one active
/// reward (`hoodie`, 600) and one retired reward (`mug`, 100).
async fn app_with_catalog(points: i64) -> (axum::Router, String, String) {
    let (app, state) = common::create_test_app();
    let admin = common::create_test_jwt(ADMIN_ID, Role::Admin, &state.config.jwt_signing_key);
    let member = common::create_test_jwt(MEMBER_ID, Role::Member, &state.config.jwt_signing_key);

    state.points.open_account(MEMBER_ID, "Riley").await.unwrap();
    if points != 0 {
        state
            .points
            .manual_award(ADMIN_ID, MEMBER_ID, points, "seed")
            .await
            .unwrap();
    }

    for (id, cost, active) in [("hoodie", 600, true), ("mug", 100, false)] {
        let response = app
            .clone()
            .oneshot(common::json_request(
                "PUT",
                &format!("/api/admin/rewards/{}", id),
                &admin,
                Some(json!({ "title": format!("tDIL {}", id), "pointCost": cost, "active": active })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    (app, admin, member)
}

#[tokio::test]
async fn test_catalog_lists_only_active_rewards() {
    let (app, _, member) = app_with_catalog(0).await;

    let response = app
        .oneshot(common::json_request("GET", "/api/rewards", &member, None))
        .await
        .unwrap();

    let body = common::body_json(response).await;
    let rewards = body["rewards"].as_array().unwrap();
    assert_eq!(rewards.len(), 1);
    assert_eq!(rewards[0]["id"], "hoodie");
    assert_eq!(rewards[0]["pointCost"], 600);
}

#[tokio::test]
async fn test_redeem_with_insufficient_balance() {
    let (app, _, member) = app_with_catalog(300).await;

    let response = app
        .clone()
        .oneshot(common::json_request(
            "POST",
            "/api/rewards/hoodie/redeem",
            &member,
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = common::body_json(response).await;
    assert_eq!(body["error"], "conflict");
    assert!(body["details"]
        .as_str()
        .unwrap()
        .contains("Insufficient points"));

    let response = app
        .oneshot(common::json_request("GET", "/api/points/me", &member, None))
        .await
        .unwrap();
    let body = common::body_json(response).await;
    assert_eq!(body["points"], 300);
}

#[tokio::test]
async fn test_redeem_success_records_redemption() {
    let (app, _, member) = app_with_catalog(1000).await;

    let response = app
        .clone()
        .oneshot(common::json_request(
            "POST",
            "/api/rewards/hoodie/redeem",
            &member,
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    assert_eq!(body["remainingPoints"], 400);
    assert_eq!(body["pointsSpent"], 600);
    assert_eq!(body["level"]["name"], "Bronze");

    let response = app
        .oneshot(common::json_request(
            "GET",
            "/api/rewards/redemptions",
            &member,
            None,
        ))
        .await
        .unwrap();
    let body = common::body_json(response).await;
    let redemptions = body["redemptions"].as_array().unwrap();
    assert_eq!(redemptions.len(), 1);
    assert_eq!(redemptions[0]["rewardId"], "hoodie");
    assert_eq!(redemptions[0]["status"], "pending");
}

#[tokio::test]
async fn test_concurrent_redemptions_do_not_overdraw() {
    let (app, _, member) = app_with_catalog(1000).await;

    let first = app.clone().oneshot(common::json_request(
        "POST",
        "/api/rewards/hoodie/redeem",
        &member,
        None,
    ));
    let second = app.clone().oneshot(common::json_request(
        "POST",
        "/api/rewards/hoodie/redeem",
        &member,
        None,
    ));
    let (first, second) = tokio::join!(first, second);

    let mut statuses = vec![first.unwrap().status(), second.unwrap().status()];
    statuses.sort();
    assert_eq!(statuses, vec![StatusCode::OK, StatusCode::CONFLICT]);

    let response = app
        .oneshot(common::json_request("GET", "/api/points/me", &member, None))
        .await
        .unwrap();
    let body = common::body_json(response).await;
    assert_eq!(body["points"], 400);
}

#[tokio::test]
async fn test_redeem_retired_or_missing_reward() {
    let (app, _, member) = app_with_catalog(1000).await;

    let response = app
        .clone()
        .oneshot(common::json_request("POST", "/api/rewards/mug/redeem", &member, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .oneshot(common::json_request(
            "POST",
            "/api/rewards/spaceship/redeem",
            &member,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_reward_cost_must_be_positive() {
    let (app, admin, _) = app_with_catalog(0).await;

    let response = app
        .oneshot(common::json_request(
            "PUT",
            "/api/admin/rewards/free-lunch",
            &admin,
            Some(json!({ "title": "Free lunch", "pointCost": 0 })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
