// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process ledger store for local development and tests.
//!
//! Each account lives behind its own async mutex, so the read-check-write
//! of a balance change is serialized per account while different accounts
//! proceed in parallel.

use crate::db::{entry_id, leaderboard_order, ApplyOutcome, BalanceGuard, LedgerStore};
use crate::error::AppError;
use crate::models::{Account, LedgerEntry, NewLedgerEntry, NewRedemption, Redemption, Reward};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

struct AccountSlot {
    account: Account,
    /// Oldest first
    entries: Vec<LedgerEntry>,
    /// Oldest first
    redemptions: Vec<Redemption>,
}

/// Shared per-account slots, keyed by user_id.
type Slots = DashMap<u64, Arc<Mutex<AccountSlot>>>;

#[derive(Default)]
pub struct MemoryStore {
    accounts: Slots,
    rewards: DashMap<String, Reward>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, user_id: u64) -> Option<Arc<Mutex<AccountSlot>>> {
        // Clone the Arc so no map shard lock is held across an await.
        self.accounts.get(&user_id).map(|s| s.value().clone())
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn get_account(&self, user_id: u64) -> Result<Option<Account>, AppError> {
        match self.slot(user_id) {
            Some(slot) => Ok(Some(slot.lock().await.account.clone())),
            None => Ok(None),
        }
    }

    async fn create_account(&self, account: &Account) -> Result<Account, AppError> {
        let slot = self
            .accounts
            .entry(account.user_id)
            .or_insert_with(|| {
                Arc::new(Mutex::new(AccountSlot {
                    account: account.clone(),
                    entries: Vec::new(),
                    redemptions: Vec::new(),
                }))
            })
            .clone();

        let stored = slot.lock().await.account.clone();
        Ok(stored)
    }

    async fn apply_entry(
        &self,
        user_id: u64,
        entry: NewLedgerEntry,
        guard: BalanceGuard,
        redemption: Option<NewRedemption>,
    ) -> Result<ApplyOutcome, AppError> {
        let Some(slot) = self.slot(user_id) else {
            return Ok(ApplyOutcome::AccountNotFound);
        };
        let mut slot = slot.lock().await;

        let id = entry_id(user_id, entry.idempotency_key.as_deref());
        if entry.idempotency_key.is_some() {
            if let Some(existing) = slot.entries.iter().find(|e| e.id == id) {
                return Ok(ApplyOutcome::Duplicate {
                    entry: existing.clone(),
                    balance: slot.account.points,
                });
            }
        }

        let balance = slot.account.points;
        let Some(new_balance) = balance.checked_add(entry.delta) else {
            return Ok(ApplyOutcome::Overflow { balance });
        };
        if guard == BalanceGuard::NonNegative && new_balance < 0 {
            return Ok(ApplyOutcome::InsufficientBalance { balance });
        }

        let now = chrono::Utc::now();
        let stored = entry.into_entry(id.clone(), user_id, now);
        slot.account.points = new_balance;
        slot.entries.push(stored.clone());
        if let Some(redemption) = redemption {
            slot.redemptions
                .push(redemption.into_redemption(id, user_id, now));
        }

        Ok(ApplyOutcome::Applied {
            entry: stored,
            balance: new_balance,
        })
    }

    async fn history(&self, user_id: u64, limit: u32) -> Result<Vec<LedgerEntry>, AppError> {
        let Some(slot) = self.slot(user_id) else {
            return Ok(Vec::new());
        };
        let slot = slot.lock().await;
        Ok(slot
            .entries
            .iter()
            .rev()
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn leaderboard(&self, limit: u32) -> Result<Vec<Account>, AppError> {
        let slots: Vec<_> = self.accounts.iter().map(|s| s.value().clone()).collect();

        let mut accounts = Vec::with_capacity(slots.len());
        for slot in slots {
            accounts.push(slot.lock().await.account.clone());
        }

        accounts.sort_by(leaderboard_order);
        accounts.truncate(limit as usize);
        Ok(accounts)
    }

    async fn get_reward(&self, reward_id: &str) -> Result<Option<Reward>, AppError> {
        Ok(self.rewards.get(reward_id).map(|r| r.value().clone()))
    }

    async fn list_rewards(&self, include_inactive: bool) -> Result<Vec<Reward>, AppError> {
        let mut rewards: Vec<Reward> = self
            .rewards
            .iter()
            .map(|r| r.value().clone())
            .filter(|r| include_inactive || r.active)
            .collect();
        rewards.sort_by(|a, b| {
            a.point_cost
                .cmp(&b.point_cost)
                .then_with(|| a.title.cmp(&b.title))
        });
        Ok(rewards)
    }

    async fn upsert_reward(&self, reward: &Reward) -> Result<(), AppError> {
        self.rewards.insert(reward.id.clone(), reward.clone());
        Ok(())
    }

    async fn redemptions_for_user(&self, user_id: u64) -> Result<Vec<Redemption>, AppError> {
        let Some(slot) = self.slot(user_id) else {
            return Ok(Vec::new());
        };
        let slot = slot.lock().await;
        Ok(slot.redemptions.iter().rev().cloned().collect())
    }
}
