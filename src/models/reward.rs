// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Reward catalog and redemption records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// A catalog reward that members can spend points on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reward {
    /// Catalog ID (also used as document ID)
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Cost in points; always positive
    pub point_cost: i64,
    /// Inactive rewards stay in the catalog but cannot be redeemed
    pub active: bool,
    #[serde(with = "firestore::serialize_as_timestamp")]
    pub created_at: DateTime<Utc>,
}

/// Fulfilment state of a redemption.
///
/// This service only writes `Pending`. Staff fulfilment tooling updates the
/// stored document to `Fulfilled` or `Cancelled`, and those states come
/// back through `redemptions_for_user`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum RedemptionStatus {
    Pending,
    Fulfilled,
    Cancelled,
}

/// Record of a reward claimed by a member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Redemption {
    /// Document ID (shared with the debit's ledger entry)
    pub id: String,
    pub user_id: u64,
    pub reward_id: String,
    pub reward_title: String,
    pub point_cost: i64,
    pub status: RedemptionStatus,
    #[serde(with = "firestore::serialize_as_timestamp")]
    pub created_at: DateTime<Utc>,
}

/// Write-side form of a redemption, committed together with its debit.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRedemption {
    pub reward_id: String,
    pub reward_title: String,
    pub point_cost: i64,
}

impl NewRedemption {
    pub fn for_reward(reward: &Reward) -> Self {
        Self {
            reward_id: reward.id.clone(),
            reward_title: reward.title.clone(),
            point_cost: reward.point_cost,
        }
    }

    pub fn into_redemption(self, id: String, user_id: u64, created_at: DateTime<Utc>) -> Redemption {
        Redemption {
            id,
            user_id,
            reward_id: self.reward_id,
            reward_title: self.reward_title,
            point_cost: self.point_cost,
            status: RedemptionStatus::Pending,
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_written_by_fulfilment_is_readable() {
        let status: RedemptionStatus = serde_json::from_str(r#""fulfilled""#).unwrap();
        assert_eq!(status, RedemptionStatus::Fulfilled);
        let status: RedemptionStatus = serde_json::from_str(r#""cancelled""#).unwrap();
        assert_eq!(status, RedemptionStatus::Cancelled);
    }

    #[test]
    fn test_new_redemption_starts_pending() {
        let reward = Reward {
            id: "hoodie".to_string(),
            title: "Hoodie".to_string(),
            description: String::new(),
            point_cost: 600,
            active: true,
            created_at: Utc::now(),
        };
        let redemption =
            NewRedemption::for_reward(&reward).into_redemption("r1".to_string(), 7, Utc::now());
        assert_eq!(redemption.status, RedemptionStatus::Pending);
        assert_eq!(redemption.point_cost, 600);
    }
}
