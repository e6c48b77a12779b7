// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Reward catalog and redemption routes.

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::{Redemption, RedemptionStatus, Reward};
use crate::services::RedeemResult;
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;
use axum::{
    extract::{Path, State},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/rewards", get(list_rewards))
        .route("/api/rewards/redemptions", get(list_my_redemptions))
        .route("/api/rewards/{reward_id}/redeem", post(redeem_reward))
}

#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RewardResponse {
    pub id: String,
    pub title: String,
    pub description: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub point_cost: i64,
    pub active: bool,
}

impl From<Reward> for RewardResponse {
    fn from(reward: Reward) -> Self {
        Self {
            id: reward.id,
            title: reward.title,
            description: reward.description,
            point_cost: reward.point_cost,
            active: reward.active,
        }
    }
}

#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RedemptionResponse {
    pub id: String,
    pub reward_id: String,
    pub reward_title: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub point_cost: i64,
    pub status: RedemptionStatus,
    pub created_at: String,
}

impl From<Redemption> for RedemptionResponse {
    fn from(r: Redemption) -> Self {
        Self {
            id: r.id,
            reward_id: r.reward_id,
            reward_title: r.reward_title,
            point_cost: r.point_cost,
            status: r.status,
            created_at: format_utc_rfc3339(r.created_at),
        }
    }
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RewardsResponse {
    pub rewards: Vec<RewardResponse>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RedemptionsResponse {
    pub redemptions: Vec<RedemptionResponse>,
}

/// Active catalog, cheapest first.
async fn list_rewards(State(state): State<Arc<AppState>>) -> Result<Json<RewardsResponse>> {
    let rewards = state.points.list_rewards(false).await?;
    Ok(Json(RewardsResponse {
        rewards: rewards.into_iter().map(Into::into).collect(),
    }))
}

/// Spend points on a reward.
///
/// An insufficient balance comes back as 409 with a message meant for the
/// member, not as a server error.
async fn redeem_reward(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(reward_id): Path<String>,
) -> Result<Json<RedeemResult>> {
    tracing::info!(user_id = user.user_id, reward_id = %reward_id, "Redemption requested");
    Ok(Json(state.points.redeem(user.user_id, &reward_id).await?))
}

async fn list_my_redemptions(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<RedemptionsResponse>> {
    let redemptions = state.points.list_redemptions(user.user_id).await?;
    Ok(Json(RedemptionsResponse {
        redemptions: redemptions.into_iter().map(Into::into).collect(),
    }))
}
