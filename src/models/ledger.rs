// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Ledger entries and the activity → point value table.

use crate::error::LedgerError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Why a ledger entry was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityType {
    Connection,
    ProfileCompletion,
    EventAttendance,
    JobApplication,
    JobPost,
    CommunityPost,
    ProfileView,
    LoginStreak,
    Referral,
    Review,
    /// Debit for a catalog reward. Not awardable.
    Redemption,
    /// Manual admin award or deduction. Not awardable through the table.
    AdminAdjustment,
}

impl ActivityType {
    pub const ALL: [ActivityType; 12] = [
        ActivityType::Connection,
        ActivityType::ProfileCompletion,
        ActivityType::EventAttendance,
        ActivityType::JobApplication,
        ActivityType::JobPost,
        ActivityType::CommunityPost,
        ActivityType::ProfileView,
        ActivityType::LoginStreak,
        ActivityType::Referral,
        ActivityType::Review,
        ActivityType::Redemption,
        ActivityType::AdminAdjustment,
    ];

    /// Fixed point value for awardable activities.
    pub fn points(self) -> Option<i64> {
        match self {
            ActivityType::Connection => Some(50),
            ActivityType::ProfileCompletion => Some(100),
            ActivityType::EventAttendance => Some(75),
            ActivityType::JobApplication => Some(25),
            ActivityType::JobPost => Some(40),
            ActivityType::CommunityPost => Some(20),
            ActivityType::ProfileView => Some(5),
            ActivityType::LoginStreak => Some(15),
            ActivityType::Referral => Some(100),
            ActivityType::Review => Some(30),
            ActivityType::Redemption | ActivityType::AdminAdjustment => None,
        }
    }

    /// Point value if this activity can go through `award_points`.
    pub fn award_value(self) -> Result<i64, LedgerError> {
        match self.points() {
            Some(value) if value > 0 => Ok(value),
            _ => Err(LedgerError::InvalidActivity(self.as_str().to_string())),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ActivityType::Connection => "CONNECTION",
            ActivityType::ProfileCompletion => "PROFILE_COMPLETION",
            ActivityType::EventAttendance => "EVENT_ATTENDANCE",
            ActivityType::JobApplication => "JOB_APPLICATION",
            ActivityType::JobPost => "JOB_POST",
            ActivityType::CommunityPost => "COMMUNITY_POST",
            ActivityType::ProfileView => "PROFILE_VIEW",
            ActivityType::LoginStreak => "LOGIN_STREAK",
            ActivityType::Referral => "REFERRAL",
            ActivityType::Review => "REVIEW",
            ActivityType::Redemption => "REDEMPTION",
            ActivityType::AdminAdjustment => "ADMIN_ADJUSTMENT",
        }
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActivityType {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim().to_ascii_uppercase();
        ActivityType::ALL
            .into_iter()
            .find(|a| a.as_str() == tag)
            .ok_or_else(|| LedgerError::InvalidActivity(s.to_string()))
    }
}

/// Immutable record of one balance change.
///
/// Stored in the `ledger_entries` collection. Never updated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Document ID
    pub id: String,
    /// Owning account
    pub user_id: u64,
    /// Signed point change
    pub delta: i64,
    pub activity_type: ActivityType,
    pub description: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    #[serde(with = "firestore::serialize_as_timestamp")]
    pub created_at: DateTime<Utc>,
}

/// Write-side form of a ledger entry, before the store assigns id and time.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLedgerEntry {
    pub delta: i64,
    pub activity_type: ActivityType,
    pub description: String,
    pub metadata: BTreeMap<String, String>,
    /// Retrying a write with the same key never applies it twice.
    pub idempotency_key: Option<String>,
}

impl NewLedgerEntry {
    pub fn new(delta: i64, activity_type: ActivityType, description: impl Into<String>) -> Self {
        Self {
            delta,
            activity_type,
            description: description.into(),
            metadata: BTreeMap::new(),
            idempotency_key: None,
        }
    }

    pub fn with_metadata(mut self, metadata: BTreeMap<String, String>) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_idempotency_key(mut self, key: Option<String>) -> Self {
        self.idempotency_key = key;
        self
    }

    /// Materialize into a stored entry.
    pub fn into_entry(self, id: String, user_id: u64, created_at: DateTime<Utc>) -> LedgerEntry {
        LedgerEntry {
            id,
            user_id,
            delta: self.delta,
            activity_type: self.activity_type,
            description: self.description,
            metadata: self.metadata,
            created_at,
        }
    }
}
