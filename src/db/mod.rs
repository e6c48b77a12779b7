// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer.
//!
//! `LedgerStore` is the seam between the points service and storage.
//! Every balance-changing call is one atomic unit: the balance update,
//! the ledger entry, and any redemption record commit together or not
//! at all.

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryStore;

use crate::error::AppError;
use crate::models::{Account, LedgerEntry, NewLedgerEntry, NewRedemption, Redemption, Reward};
use async_trait::async_trait;
use sha2::{Digest, Sha256};

/// Collection names as constants.
pub mod collections {
    /// Point balances (keyed by user_id)
    pub const ACCOUNTS: &str = "accounts";
    pub const LEDGER_ENTRIES: &str = "ledger_entries";
    pub const REWARDS: &str = "rewards";
    pub const REDEMPTIONS: &str = "redemptions";
}

/// Whether an atomic write may take the balance below zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceGuard {
    /// Credits, which can only raise the balance.
    Unchecked,
    /// Debits: the write is refused if the balance would go negative.
    NonNegative,
}

/// Result of an atomic ledger write.
#[derive(Debug, Clone, PartialEq)]
pub enum ApplyOutcome {
    /// The entry was written and the balance moved.
    Applied { entry: LedgerEntry, balance: i64 },
    /// An entry with the same idempotency key already exists; nothing written.
    Duplicate { entry: LedgerEntry, balance: i64 },
    /// The guard refused the write; nothing written.
    InsufficientBalance { balance: i64 },
    /// The new balance would not fit in an `i64`; nothing written.
    Overflow { balance: i64 },
    AccountNotFound,
}

/// Storage backend for accounts, ledger entries and the reward catalog.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn get_account(&self, user_id: u64) -> Result<Option<Account>, AppError>;

    /// Create the account if it does not exist. Returns the stored account.
    async fn create_account(&self, account: &Account) -> Result<Account, AppError>;

    /// Atomically apply `entry.delta` to the balance and append the entry
    /// (and the redemption, when given).
    async fn apply_entry(
        &self,
        user_id: u64,
        entry: NewLedgerEntry,
        guard: BalanceGuard,
        redemption: Option<NewRedemption>,
    ) -> Result<ApplyOutcome, AppError>;

    /// Most recent entries first.
    async fn history(&self, user_id: u64, limit: u32) -> Result<Vec<LedgerEntry>, AppError>;

    /// Highest balances first; ties by `created_at`, then `user_id`.
    async fn leaderboard(&self, limit: u32) -> Result<Vec<Account>, AppError>;

    async fn get_reward(&self, reward_id: &str) -> Result<Option<Reward>, AppError>;

    async fn list_rewards(&self, include_inactive: bool) -> Result<Vec<Reward>, AppError>;

    async fn upsert_reward(&self, reward: &Reward) -> Result<(), AppError>;

    /// Most recent redemptions first.
    async fn redemptions_for_user(&self, user_id: u64) -> Result<Vec<Redemption>, AppError>;
}

/// Document ID for a ledger entry.
///
/// Keyed writes get a deterministic ID so a retried write lands on the
/// same document; unkeyed writes get a random one.
pub(crate) fn entry_id(user_id: u64, idempotency_key: Option<&str>) -> String {
    match idempotency_key {
        Some(key) => {
            let mut hasher = Sha256::new();
            hasher.update(user_id.to_be_bytes());
            hasher.update(key.as_bytes());
            hex::encode(hasher.finalize())
        }
        None => uuid::Uuid::new_v4().simple().to_string(),
    }
}

/// Leaderboard ordering shared by both backends.
pub(crate) fn leaderboard_order(a: &Account, b: &Account) -> std::cmp::Ordering {
    b.points
        .cmp(&a.points)
        .then_with(|| a.created_at.cmp(&b.created_at))
        .then_with(|| a.user_id.cmp(&b.user_id))
}
