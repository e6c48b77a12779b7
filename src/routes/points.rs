// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Points routes for authenticated members.

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::{level_table, LedgerEntry, Level};
use crate::services::{LeaderboardEntry, PointsSummary};
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;
use axum::{
    extract::{Query, State},
    routing::get,
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/levels", get(get_levels))
        .route("/api/points/me", get(get_my_points))
        .route("/api/points/history", get(get_my_history))
        .route("/api/points/leaderboard", get(get_leaderboard))
}

#[derive(Deserialize)]
pub(crate) struct LimitQuery {
    /// Page size; clamped by the service
    pub limit: Option<u32>,
}

/// One ledger entry as returned by the API.
#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LedgerEntryResponse {
    pub id: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub delta: i64,
    pub activity_type: String,
    pub description: String,
    pub metadata: BTreeMap<String, String>,
    pub created_at: String,
}

impl From<LedgerEntry> for LedgerEntryResponse {
    fn from(entry: LedgerEntry) -> Self {
        Self {
            id: entry.id,
            delta: entry.delta,
            activity_type: entry.activity_type.to_string(),
            description: entry.description,
            metadata: entry.metadata,
            created_at: format_utc_rfc3339(entry.created_at),
        }
    }
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct HistoryResponse {
    pub entries: Vec<LedgerEntryResponse>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LeaderboardResponse {
    pub leaderboard: Vec<LeaderboardEntry>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LevelsResponse {
    pub levels: Vec<Level>,
}

/// Static level table for display.
async fn get_levels() -> Json<LevelsResponse> {
    Json(LevelsResponse {
        levels: level_table(),
    })
}

/// Current user's balance, level and progress.
async fn get_my_points(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<PointsSummary>> {
    Ok(Json(state.points.get_balance(user.user_id).await?))
}

/// Current user's ledger, newest first.
async fn get_my_history(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<LimitQuery>,
) -> Result<Json<HistoryResponse>> {
    tracing::debug!(user_id = user.user_id, limit = ?params.limit, "Fetching point history");

    let entries = state.points.get_history(user.user_id, params.limit).await?;
    Ok(Json(HistoryResponse {
        entries: entries.into_iter().map(Into::into).collect(),
    }))
}

async fn get_leaderboard(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LimitQuery>,
) -> Result<Json<LeaderboardResponse>> {
    Ok(Json(LeaderboardResponse {
        leaderboard: state.points.get_leaderboard(params.limit).await?,
    }))
}
