// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::http::StatusCode;
use axum::response::IntoResponse;
use tdil_points::error::{AppError, LedgerError};

fn status_of(err: LedgerError) -> StatusCode {
    AppError::from(err).into_response().status()
}

#[test]
fn test_rejected_inputs_are_bad_requests() {
    assert_eq!(
        status_of(LedgerError::InvalidActivity("NOPE".to_string())),
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        status_of(LedgerError::ActivityDisabled("LOGIN_STREAK".to_string())),
        StatusCode::BAD_REQUEST
    );
    assert_eq!(status_of(LedgerError::InvalidAmount), StatusCode::BAD_REQUEST);
    assert_eq!(status_of(LedgerError::BlankText("Reason")), StatusCode::BAD_REQUEST);
    assert_eq!(
        status_of(LedgerError::BalanceOverflow {
            balance: i64::MAX,
            delta: 50
        }),
        StatusCode::BAD_REQUEST
    );
}

#[test]
fn test_insufficient_balance_is_user_visible_conflict() {
    let err = LedgerError::InsufficientBalance {
        balance: 300,
        required: 500,
    };
    assert_eq!(
        err.to_string(),
        "Insufficient points: balance 300, required 500"
    );
    assert_eq!(status_of(err), StatusCode::CONFLICT);
}

#[test]
fn test_missing_things_are_not_found() {
    assert_eq!(status_of(LedgerError::AccountNotFound(7)), StatusCode::NOT_FOUND);
    assert_eq!(
        status_of(LedgerError::RewardNotFound("mug".to_string())),
        StatusCode::NOT_FOUND
    );
}

#[test]
fn test_storage_failure_is_server_error() {
    assert_eq!(
        status_of(LedgerError::Storage("connection reset".to_string())),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}
