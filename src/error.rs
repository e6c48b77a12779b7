// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Failures of ledger operations.
///
/// Every variant except `Storage` is detected before anything is written.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("Unknown or non-awardable activity type: {0}")]
    InvalidActivity(String),

    #[error("Activity type {0} is currently disabled")]
    ActivityDisabled(String),

    #[error("Point amount is zero or out of range")]
    InvalidAmount,

    #[error("{0} must not be blank")]
    BlankText(&'static str),

    #[error("Balance of {balance} cannot absorb a change of {delta}")]
    BalanceOverflow { balance: i64, delta: i64 },

    #[error("No ledger account for user {0}")]
    AccountNotFound(u64),

    #[error("Reward not found: {0}")]
    RewardNotFound(String),

    #[error("Reward is not available: {0}")]
    RewardInactive(String),

    #[error("Insufficient points: balance {balance}, required {required}")]
    InsufficientBalance { balance: i64, required: i64 },

    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<AppError> for LedgerError {
    fn from(err: AppError) -> Self {
        LedgerError::Storage(err.to_string())
    }
}

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::InvalidActivity(_)
            | LedgerError::ActivityDisabled(_)
            | LedgerError::InvalidAmount
            | LedgerError::BlankText(_)
            | LedgerError::BalanceOverflow { .. } => AppError::BadRequest(err.to_string()),
            LedgerError::AccountNotFound(_) | LedgerError::RewardNotFound(_) => {
                AppError::NotFound(err.to_string())
            }
            LedgerError::RewardInactive(_) | LedgerError::InsufficientBalance { .. } => {
                AppError::Conflict(err.to_string())
            }
            LedgerError::Storage(msg) => AppError::Database(msg),
        }
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", Some(msg.clone())),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", Some(msg.clone())),
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
