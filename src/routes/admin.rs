// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Admin routes: account setup, manual adjustments, collaborator awards
//! and catalog maintenance. Gated on the `admin` role in routes/mod.rs.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{ActivityType, Reward};
use crate::routes::points::{HistoryResponse, LimitQuery};
use crate::routes::rewards::RewardResponse;
use crate::services::{AwardResult, PointsSummary};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::{get, post, put},
    Extension, Json, Router,
};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/admin/accounts", post(open_account))
        .route("/api/admin/points/award", post(manual_award))
        .route("/api/admin/points/activity", post(award_activity))
        .route("/api/admin/points/{user_id}/history", get(user_history))
        .route("/api/admin/rewards/{reward_id}", put(upsert_reward))
}

fn validate_body<T: Validate>(body: &T) -> Result<()> {
    body.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))
}

// ─── Accounts ────────────────────────────────────────────────

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct OpenAccountRequest {
    user_id: u64,
    #[validate(length(min = 1, max = 100))]
    display_name: String,
}

/// Open a ledger account; called by registration.
async fn open_account(
    State(state): State<Arc<AppState>>,
    Json(body): Json<OpenAccountRequest>,
) -> Result<Json<PointsSummary>> {
    validate_body(&body)?;
    state
        .points
        .open_account(body.user_id, &body.display_name)
        .await?;
    Ok(Json(state.points.get_balance(body.user_id).await?))
}

// ─── Awards ──────────────────────────────────────────────────

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct ManualAwardRequest {
    user_id: u64,
    /// Positive to award, negative to deduct
    #[validate(range(min = -1_000_000, max = 1_000_000))]
    amount: i64,
    #[validate(length(min = 1, max = 500))]
    reason: String,
}

async fn manual_award(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<AuthUser>,
    Json(body): Json<ManualAwardRequest>,
) -> Result<Json<AwardResult>> {
    validate_body(&body)?;
    let result = state
        .points
        .manual_award(admin.user_id, body.user_id, body.amount, &body.reason)
        .await?;
    Ok(Json(result))
}

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct ActivityAwardRequest {
    user_id: u64,
    /// Activity tag, e.g. `CONNECTION`
    activity_type: String,
    #[validate(length(max = 500))]
    #[serde(default)]
    description: String,
    #[serde(default)]
    metadata: BTreeMap<String, String>,
    /// Makes retries of the same award safe
    #[validate(length(min = 1, max = 200))]
    idempotency_key: Option<String>,
}

/// Fixed-value award on behalf of another tDIL handler.
async fn award_activity(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ActivityAwardRequest>,
) -> Result<Json<AwardResult>> {
    validate_body(&body)?;
    let activity: ActivityType = body.activity_type.parse()?;
    let result = state
        .points
        .award_points_with_key(
            body.user_id,
            activity,
            &body.description,
            body.metadata,
            body.idempotency_key,
        )
        .await?;
    Ok(Json(result))
}

async fn user_history(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<u64>,
    Query(params): Query<LimitQuery>,
) -> Result<Json<HistoryResponse>> {
    let entries = state.points.get_history(user_id, params.limit).await?;
    Ok(Json(HistoryResponse {
        entries: entries.into_iter().map(Into::into).collect(),
    }))
}

// ─── Catalog ─────────────────────────────────────────────────

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct UpsertRewardRequest {
    #[validate(length(min = 1, max = 200))]
    title: String,
    #[validate(length(max = 2000))]
    #[serde(default)]
    description: String,
    #[validate(range(min = 1))]
    point_cost: i64,
    #[serde(default = "default_active")]
    active: bool,
}

fn default_active() -> bool {
    true
}

async fn upsert_reward(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<AuthUser>,
    Path(reward_id): Path<String>,
    Json(body): Json<UpsertRewardRequest>,
) -> Result<Json<RewardResponse>> {
    validate_body(&body)?;
    if reward_id.is_empty() || reward_id.len() > 100 || reward_id.contains('/') {
        return Err(AppError::BadRequest("Invalid reward id".to_string()));
    }

    let created_at = state
        .points
        .get_reward(&reward_id)
        .await?
        .map(|existing| existing.created_at)
        .unwrap_or_else(chrono::Utc::now);

    let reward = Reward {
        id: reward_id,
        title: body.title.trim().to_string(),
        description: body.description,
        point_cost: body.point_cost,
        active: body.active,
        created_at,
    };
    state.points.upsert_reward(&reward).await?;

    tracing::info!(admin_id = admin.user_id, reward_id = %reward.id, "Reward updated by admin");
    Ok(Json(reward.into()))
}
