//! Ledger account for storage and API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::level::{calculate_level, Level};

/// Point balance for one member, stored in Firestore.
///
/// The level is derived from `points` on read and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// tDIL user ID (also used as document ID)
    pub user_id: u64,
    /// Name shown on the leaderboard
    pub display_name: String,
    /// Current balance; equals the sum of the account's ledger deltas
    pub points: i64,
    /// When the account was opened (leaderboard tie-break)
    #[serde(with = "firestore::serialize_as_timestamp")]
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn new(user_id: u64, display_name: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            user_id,
            display_name: display_name.into(),
            points: 0,
            created_at,
        }
    }

    pub fn level(&self) -> Level {
        calculate_level(self.points)
    }
}
