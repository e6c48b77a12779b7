// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod account;
pub mod ledger;
pub mod level;
pub mod reward;

pub use account::Account;
pub use ledger::{ActivityType, LedgerEntry, NewLedgerEntry};
pub use level::{calculate_level, level_progress, level_table, Level, LevelProgress};
pub use reward::{NewRedemption, Redemption, RedemptionStatus, Reward};
