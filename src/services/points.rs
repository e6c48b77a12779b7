// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Points & leveling ledger service.
//!
//! Other handlers (connections, job board, events) call into this service
//! after their own action has committed. Point awards are a side effect:
//! a failed award must never undo the action that triggered it, which is
//! what `award_points_best_effort` is for.

use crate::db::{ApplyOutcome, BalanceGuard, LedgerStore};
use crate::error::LedgerError;
use crate::models::{
    calculate_level, level_progress, Account, ActivityType, LedgerEntry, Level, LevelProgress,
    NewLedgerEntry, NewRedemption, Redemption, Reward,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub const DEFAULT_HISTORY_LIMIT: u32 = 50;
pub const MAX_HISTORY_LIMIT: u32 = 100;
pub const DEFAULT_LEADERBOARD_LIMIT: u32 = 10;
pub const MAX_LEADERBOARD_LIMIT: u32 = 100;
/// Largest magnitude of a single admin adjustment.
pub const MAX_MANUAL_AMOUNT: i64 = 1_000_000;

/// Outcome of a successful award.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct AwardResult {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub points_awarded: i64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub total_points: i64,
    pub level: Level,
    pub entry_id: String,
    /// True when this call matched an earlier award with the same key.
    pub duplicate: bool,
}

/// Outcome of a successful redemption.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RedeemResult {
    pub redemption_id: String,
    pub reward_title: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub points_spent: i64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub remaining_points: i64,
    pub level: Level,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LeaderboardEntry {
    /// 1-based position in the returned page
    pub rank: u32,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub user_id: u64,
    pub display_name: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub points: i64,
    pub level: Level,
}

/// Balance view for one account.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct PointsSummary {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub user_id: u64,
    pub display_name: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub points: i64,
    pub level: Level,
    pub progress: LevelProgress,
}

/// Ledger operations over a `LedgerStore`.
#[derive(Clone)]
pub struct PointsService {
    store: Arc<dyn LedgerStore>,
    login_streak_enabled: bool,
}

impl PointsService {
    pub fn new(store: Arc<dyn LedgerStore>, login_streak_enabled: bool) -> Self {
        Self {
            store,
            login_streak_enabled,
        }
    }

    // ─── Accounts ────────────────────────────────────────────────

    /// Open a ledger account at zero points. No-op if it already exists.
    pub async fn open_account(
        &self,
        user_id: u64,
        display_name: &str,
    ) -> Result<Account, LedgerError> {
        let display_name = non_blank(display_name, "Display name")?;
        let account = self
            .store
            .create_account(&Account::new(user_id, display_name, chrono::Utc::now()))
            .await?;
        tracing::info!(user_id, points = account.points, "Ledger account ready");
        Ok(account)
    }

    pub async fn get_balance(&self, user_id: u64) -> Result<PointsSummary, LedgerError> {
        let account = self
            .store
            .get_account(user_id)
            .await?
            .ok_or(LedgerError::AccountNotFound(user_id))?;

        Ok(PointsSummary {
            user_id,
            level: account.level(),
            progress: level_progress(account.points),
            points: account.points,
            display_name: account.display_name,
        })
    }

    // ─── Awards ──────────────────────────────────────────────────

    /// Award the fixed point value of `activity` to `user_id`.
    pub async fn award_points(
        &self,
        user_id: u64,
        activity: ActivityType,
        description: &str,
        metadata: BTreeMap<String, String>,
    ) -> Result<AwardResult, LedgerError> {
        self.award_points_with_key(user_id, activity, description, metadata, None)
            .await
    }

    /// Like `award_points`, but retrying with the same `idempotency_key`
    /// never credits twice.
    pub async fn award_points_with_key(
        &self,
        user_id: u64,
        activity: ActivityType,
        description: &str,
        metadata: BTreeMap<String, String>,
        idempotency_key: Option<String>,
    ) -> Result<AwardResult, LedgerError> {
        let value = activity.award_value()?;
        if activity == ActivityType::LoginStreak && !self.login_streak_enabled {
            return Err(LedgerError::ActivityDisabled(activity.to_string()));
        }

        let entry = NewLedgerEntry::new(value, activity, description)
            .with_metadata(metadata)
            .with_idempotency_key(idempotency_key);

        let (entry, balance, duplicate) = self
            .apply(user_id, entry, BalanceGuard::Unchecked, None)
            .await?;

        if duplicate {
            tracing::info!(user_id, activity = %activity, entry_id = %entry.id, "Duplicate award ignored");
        } else {
            tracing::info!(
                user_id,
                activity = %activity,
                points = value,
                balance,
                "Points awarded"
            );
        }

        Ok(AwardResult {
            points_awarded: entry.delta,
            total_points: balance,
            level: calculate_level(balance),
            entry_id: entry.id,
            duplicate,
        })
    }

    /// Award points without letting a failure escape.
    ///
    /// For callers whose own action has already committed: the failure is
    /// logged and `None` comes back instead of an error.
    pub async fn award_points_best_effort(
        &self,
        user_id: u64,
        activity: ActivityType,
        description: &str,
        metadata: BTreeMap<String, String>,
    ) -> Option<AwardResult> {
        match self
            .award_points(user_id, activity, description, metadata)
            .await
        {
            Ok(result) => Some(result),
            Err(e) => {
                tracing::warn!(user_id, activity = %activity, error = %e, "Point award failed (ignored)");
                None
            }
        }
    }

    /// Admin award or deduction of up to `MAX_MANUAL_AMOUNT` points.
    ///
    /// Deductions may not take the balance below zero.
    pub async fn manual_award(
        &self,
        admin_id: u64,
        user_id: u64,
        amount: i64,
        reason: &str,
    ) -> Result<AwardResult, LedgerError> {
        if amount == 0 || !(-MAX_MANUAL_AMOUNT..=MAX_MANUAL_AMOUNT).contains(&amount) {
            return Err(LedgerError::InvalidAmount);
        }
        let reason = non_blank(reason, "Reason")?;

        let mut metadata = BTreeMap::new();
        metadata.insert("admin_id".to_string(), admin_id.to_string());
        let entry = NewLedgerEntry::new(amount, ActivityType::AdminAdjustment, reason)
            .with_metadata(metadata);

        let guard = if amount < 0 {
            BalanceGuard::NonNegative
        } else {
            BalanceGuard::Unchecked
        };
        let (entry, balance, _) = self.apply(user_id, entry, guard, None).await?;

        tracing::info!(admin_id, user_id, amount, balance, reason, "Manual point adjustment");

        Ok(AwardResult {
            points_awarded: entry.delta,
            total_points: balance,
            level: calculate_level(balance),
            entry_id: entry.id,
            duplicate: false,
        })
    }

    // ─── Redemption ──────────────────────────────────────────────

    /// Spend points on a catalog reward.
    ///
    /// The balance check and the debit are one atomic write, so concurrent
    /// redemptions can never overdraw the account.
    pub async fn redeem(&self, user_id: u64, reward_id: &str) -> Result<RedeemResult, LedgerError> {
        let reward = self
            .store
            .get_reward(reward_id)
            .await?
            .ok_or_else(|| LedgerError::RewardNotFound(reward_id.to_string()))?;

        if !reward.active || reward.point_cost <= 0 {
            return Err(LedgerError::RewardInactive(reward_id.to_string()));
        }

        let mut metadata = BTreeMap::new();
        metadata.insert("reward_id".to_string(), reward.id.clone());
        let entry = NewLedgerEntry::new(
            -reward.point_cost,
            ActivityType::Redemption,
            format!("Redeemed: {}", reward.title),
        )
        .with_metadata(metadata);

        let (entry, balance, _) = self
            .apply(
                user_id,
                entry,
                BalanceGuard::NonNegative,
                Some(NewRedemption::for_reward(&reward)),
            )
            .await?;

        tracing::info!(
            user_id,
            reward_id,
            cost = reward.point_cost,
            balance,
            "Reward redeemed"
        );

        Ok(RedeemResult {
            redemption_id: entry.id,
            reward_title: reward.title,
            points_spent: reward.point_cost,
            remaining_points: balance,
            level: calculate_level(balance),
        })
    }

    pub async fn get_reward(&self, reward_id: &str) -> Result<Option<Reward>, LedgerError> {
        Ok(self.store.get_reward(reward_id).await?)
    }

    pub async fn list_rewards(&self, include_inactive: bool) -> Result<Vec<Reward>, LedgerError> {
        Ok(self.store.list_rewards(include_inactive).await?)
    }

    pub async fn upsert_reward(&self, reward: &Reward) -> Result<(), LedgerError> {
        if reward.point_cost <= 0 {
            return Err(LedgerError::InvalidAmount);
        }
        self.store.upsert_reward(reward).await?;
        tracing::info!(reward_id = %reward.id, cost = reward.point_cost, active = reward.active, "Reward saved");
        Ok(())
    }

    pub async fn list_redemptions(&self, user_id: u64) -> Result<Vec<Redemption>, LedgerError> {
        Ok(self.store.redemptions_for_user(user_id).await?)
    }

    // ─── Read Views ──────────────────────────────────────────────

    /// Most recent ledger entries for a user, newest first.
    pub async fn get_history(
        &self,
        user_id: u64,
        limit: Option<u32>,
    ) -> Result<Vec<LedgerEntry>, LedgerError> {
        let limit = limit
            .unwrap_or(DEFAULT_HISTORY_LIMIT)
            .clamp(1, MAX_HISTORY_LIMIT);
        Ok(self.store.history(user_id, limit).await?)
    }

    /// Top accounts by balance with 1-based ranks.
    pub async fn get_leaderboard(
        &self,
        limit: Option<u32>,
    ) -> Result<Vec<LeaderboardEntry>, LedgerError> {
        let limit = limit
            .unwrap_or(DEFAULT_LEADERBOARD_LIMIT)
            .clamp(1, MAX_LEADERBOARD_LIMIT);
        let accounts = self.store.leaderboard(limit).await?;

        Ok(accounts
            .into_iter()
            .zip(1u32..)
            .map(|(account, rank)| LeaderboardEntry {
                rank,
                user_id: account.user_id,
                level: account.level(),
                points: account.points,
                display_name: account.display_name,
            })
            .collect())
    }

    // ─── Helper Methods ──────────────────────────────────────────

    /// Apply one entry and translate the store outcome into ledger errors.
    ///
    /// Returns the stored entry, the resulting balance, and whether the
    /// write matched an earlier one with the same idempotency key.
    async fn apply(
        &self,
        user_id: u64,
        entry: NewLedgerEntry,
        guard: BalanceGuard,
        redemption: Option<NewRedemption>,
    ) -> Result<(LedgerEntry, i64, bool), LedgerError> {
        let delta = entry.delta;
        match self
            .store
            .apply_entry(user_id, entry, guard, redemption)
            .await?
        {
            ApplyOutcome::Applied { entry, balance } => Ok((entry, balance, false)),
            ApplyOutcome::Duplicate { entry, balance } => Ok((entry, balance, true)),
            ApplyOutcome::InsufficientBalance { balance } => {
                let required = delta.saturating_neg();
                tracing::info!(user_id, balance, required, "Debit refused: insufficient points");
                Err(LedgerError::InsufficientBalance { balance, required })
            }
            ApplyOutcome::Overflow { balance } => {
                tracing::warn!(user_id, balance, delta, "Ledger write refused: balance overflow");
                Err(LedgerError::BalanceOverflow { balance, delta })
            }
            ApplyOutcome::AccountNotFound => Err(LedgerError::AccountNotFound(user_id)),
        }
    }
}

/// Trimmed `value`, or `BlankText` if nothing is left.
fn non_blank<'a>(value: &'a str, field: &'static str) -> Result<&'a str, LedgerError> {
    match value.trim() {
        "" => Err(LedgerError::BlankText(field)),
        trimmed => Ok(trimmed),
    }
}
