// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore-backed ledger store.
//!
//! Collections:
//! - `accounts` (point balances, keyed by user_id)
//! - `ledger_entries` (append-only balance changes)
//! - `rewards` (catalog)
//! - `redemptions` (claimed rewards, keyed like their debit entry)
//!
//! Balance changes run in a Firestore transaction whose reads are bound to
//! the transaction, so two writers racing on one account conflict at commit
//! and the loser retries against fresh data.

use crate::db::{collections, entry_id, leaderboard_order, ApplyOutcome, BalanceGuard, LedgerStore};
use crate::error::AppError;
use crate::models::{Account, LedgerEntry, NewLedgerEntry, NewRedemption, Redemption, Reward};
use async_trait::async_trait;
use firestore::errors::FirestoreError;
use firestore::{FirestoreConsistencySelector, FirestoreQueryDirection, FirestoreTransaction};

/// Upper bound on commit attempts for one contended write.
const MAX_TRANSACTION_ATTEMPTS: u32 = 5;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

/// Whether a transaction attempt committed or must be retried.
enum Attempt<T> {
    Done(T),
    Retry(String),
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create an offline client for testing.
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    async fn begin(&self) -> Result<(FirestoreTransaction<'_>, firestore::FirestoreDb), AppError> {
        let client = self.get_client()?;
        let transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        // Reads through this handle are part of the transaction and register
        // the documents for conflict detection.
        let bound = client.clone_with_consistency_selector(FirestoreConsistencySelector::Transaction(
            transaction.transaction_id().clone(),
        ));

        Ok((transaction, bound))
    }

    async fn commit(transaction: FirestoreTransaction<'_>) -> Result<Attempt<()>, AppError> {
        match transaction.commit().await {
            Ok(_) => Ok(Attempt::Done(())),
            Err(FirestoreError::DatabaseError(e)) if e.retry_possible => {
                Ok(Attempt::Retry(e.to_string()))
            }
            Err(e) => Err(AppError::Database(format!(
                "Transaction commit failed: {}",
                e
            ))),
        }
    }

    async fn read_account(
        client: &firestore::FirestoreDb,
        user_id: u64,
    ) -> Result<Option<Account>, AppError> {
        client
            .fluent()
            .select()
            .by_id_in(collections::ACCOUNTS)
            .obj()
            .one(&user_id.to_string())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// One transaction attempt of `apply_entry`.
    async fn try_apply_entry(
        &self,
        user_id: u64,
        entry: &NewLedgerEntry,
        guard: BalanceGuard,
        redemption: Option<&NewRedemption>,
    ) -> Result<Attempt<ApplyOutcome>, AppError> {
        let (mut transaction, bound) = self.begin().await?;
        let client = self.get_client()?;

        let Some(mut account) = Self::read_account(&bound, user_id).await? else {
            let _ = transaction.rollback().await;
            return Ok(Attempt::Done(ApplyOutcome::AccountNotFound));
        };

        let id = entry_id(user_id, entry.idempotency_key.as_deref());
        if entry.idempotency_key.is_some() {
            let existing: Option<LedgerEntry> = bound
                .fluent()
                .select()
                .by_id_in(collections::LEDGER_ENTRIES)
                .obj()
                .one(&id)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;

            if let Some(existing) = existing {
                let _ = transaction.rollback().await;
                return Ok(Attempt::Done(ApplyOutcome::Duplicate {
                    entry: existing,
                    balance: account.points,
                }));
            }
        }

        let balance = account.points;
        let Some(new_balance) = balance.checked_add(entry.delta) else {
            let _ = transaction.rollback().await;
            return Ok(Attempt::Done(ApplyOutcome::Overflow { balance }));
        };
        if guard == BalanceGuard::NonNegative && new_balance < 0 {
            let _ = transaction.rollback().await;
            return Ok(Attempt::Done(ApplyOutcome::InsufficientBalance { balance }));
        }

        let now = chrono::Utc::now();
        let stored = entry.clone().into_entry(id.clone(), user_id, now);
        account.points = new_balance;

        client
            .fluent()
            .update()
            .in_col(collections::ACCOUNTS)
            .document_id(user_id.to_string())
            .object(&account)
            .add_to_transaction(&mut transaction)
            .map_err(|e| AppError::Database(format!("Failed to add account to transaction: {}", e)))?;

        client
            .fluent()
            .update()
            .in_col(collections::LEDGER_ENTRIES)
            .document_id(&id)
            .object(&stored)
            .add_to_transaction(&mut transaction)
            .map_err(|e| AppError::Database(format!("Failed to add entry to transaction: {}", e)))?;

        if let Some(redemption) = redemption {
            let record = redemption.clone().into_redemption(id.clone(), user_id, now);
            client
                .fluent()
                .update()
                .in_col(collections::REDEMPTIONS)
                .document_id(&id)
                .object(&record)
                .add_to_transaction(&mut transaction)
                .map_err(|e| {
                    AppError::Database(format!("Failed to add redemption to transaction: {}", e))
                })?;
        }

        Ok(match Self::commit(transaction).await? {
            Attempt::Done(()) => Attempt::Done(ApplyOutcome::Applied {
                entry: stored,
                balance: new_balance,
            }),
            Attempt::Retry(reason) => Attempt::Retry(reason),
        })
    }

    async fn try_create_account(&self, account: &Account) -> Result<Attempt<Account>, AppError> {
        let (mut transaction, bound) = self.begin().await?;

        if let Some(existing) = Self::read_account(&bound, account.user_id).await? {
            let _ = transaction.rollback().await;
            return Ok(Attempt::Done(existing));
        }

        self.get_client()?
            .fluent()
            .update()
            .in_col(collections::ACCOUNTS)
            .document_id(account.user_id.to_string())
            .object(account)
            .add_to_transaction(&mut transaction)
            .map_err(|e| AppError::Database(format!("Failed to add account to transaction: {}", e)))?;

        Ok(match Self::commit(transaction).await? {
            Attempt::Done(()) => Attempt::Done(account.clone()),
            Attempt::Retry(reason) => Attempt::Retry(reason),
        })
    }
}

#[async_trait]
impl LedgerStore for FirestoreDb {
    async fn get_account(&self, user_id: u64) -> Result<Option<Account>, AppError> {
        Self::read_account(self.get_client()?, user_id).await
    }

    async fn create_account(&self, account: &Account) -> Result<Account, AppError> {
        for attempt in 1..=MAX_TRANSACTION_ATTEMPTS {
            match self.try_create_account(account).await? {
                Attempt::Done(stored) => return Ok(stored),
                Attempt::Retry(reason) => {
                    tracing::debug!(user_id = account.user_id, attempt, reason = %reason, "Retrying account creation");
                }
            }
        }
        Err(AppError::Database(format!(
            "Account creation for user {} did not commit after {} attempts",
            account.user_id, MAX_TRANSACTION_ATTEMPTS
        )))
    }

    async fn apply_entry(
        &self,
        user_id: u64,
        entry: NewLedgerEntry,
        guard: BalanceGuard,
        redemption: Option<NewRedemption>,
    ) -> Result<ApplyOutcome, AppError> {
        for attempt in 1..=MAX_TRANSACTION_ATTEMPTS {
            match self
                .try_apply_entry(user_id, &entry, guard, redemption.as_ref())
                .await?
            {
                Attempt::Done(outcome) => return Ok(outcome),
                Attempt::Retry(reason) => {
                    tracing::debug!(
                        user_id,
                        attempt,
                        reason = %reason,
                        "Ledger transaction contended, retrying"
                    );
                }
            }
        }

        tracing::warn!(user_id, "Ledger transaction gave up after retries");
        Err(AppError::Database(format!(
            "Ledger write for user {} did not commit after {} attempts",
            user_id, MAX_TRANSACTION_ATTEMPTS
        )))
    }

    async fn history(&self, user_id: u64, limit: u32) -> Result<Vec<LedgerEntry>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::LEDGER_ENTRIES)
            .filter(move |q| q.for_all([q.field("user_id").eq(user_id)]))
            .order_by([("created_at", FirestoreQueryDirection::Descending)])
            .limit(limit)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn leaderboard(&self, limit: u32) -> Result<Vec<Account>, AppError> {
        // Requires a composite index on (points desc, created_at asc, user_id asc).
        let mut accounts: Vec<Account> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::ACCOUNTS)
            .order_by([
                ("points", FirestoreQueryDirection::Descending),
                ("created_at", FirestoreQueryDirection::Ascending),
                ("user_id", FirestoreQueryDirection::Ascending),
            ])
            .limit(limit)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        // Keep the shared ordering authoritative even if the index lags.
        accounts.sort_by(leaderboard_order);
        Ok(accounts)
    }

    async fn get_reward(&self, reward_id: &str) -> Result<Option<Reward>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::REWARDS)
            .obj()
            .one(reward_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn list_rewards(&self, include_inactive: bool) -> Result<Vec<Reward>, AppError> {
        let query = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::REWARDS);

        let mut rewards: Vec<Reward> = if include_inactive {
            query.obj().query().await
        } else {
            query
                .filter(|q| q.for_all([q.field("active").eq(true)]))
                .obj()
                .query()
                .await
        }
        .map_err(|e| AppError::Database(e.to_string()))?;

        rewards.sort_by(|a, b| {
            a.point_cost
                .cmp(&b.point_cost)
                .then_with(|| a.title.cmp(&b.title))
        });
        Ok(rewards)
    }

    async fn upsert_reward(&self, reward: &Reward) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::REWARDS)
            .document_id(&reward.id)
            .object(reward)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn redemptions_for_user(&self, user_id: u64) -> Result<Vec<Redemption>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::REDEMPTIONS)
            .filter(move |q| q.for_all([q.field("user_id").eq(user_id)]))
            .order_by([("created_at", FirestoreQueryDirection::Descending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
