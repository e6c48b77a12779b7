// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Level threshold table and level derivation.
//!
//! Levels are never stored. They are derived from the current point
//! balance every time they are needed, so a level can never drift from
//! the balance it describes.

use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// One row of the static threshold table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelThreshold {
    pub level: u32,
    pub min_points: i64,
    pub name: &'static str,
    pub color: &'static str,
}

/// Threshold table, sorted ascending by `min_points`. Level 1 starts at 0.
pub const LEVEL_THRESHOLDS: &[LevelThreshold] = &[
    LevelThreshold {
        level: 1,
        min_points: 0,
        name: "Bronze",
        color: "#CD7F32",
    },
    LevelThreshold {
        level: 2,
        min_points: 500,
        name: "Silver",
        color: "#C0C0C0",
    },
    LevelThreshold {
        level: 3,
        min_points: 1500,
        name: "Gold",
        color: "#FFD700",
    },
    LevelThreshold {
        level: 4,
        min_points: 3000,
        name: "Platinum",
        color: "#E5E4E2",
    },
    LevelThreshold {
        level: 5,
        min_points: 5000,
        name: "Diamond",
        color: "#B9F2FF",
    },
];

/// Level descriptor returned to callers and API clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Level {
    pub level: u32,
    pub name: String,
    pub color: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub min_points: i64,
}

impl From<&LevelThreshold> for Level {
    fn from(t: &LevelThreshold) -> Self {
        Self {
            level: t.level,
            name: t.name.to_string(),
            color: t.color.to_string(),
            min_points: t.min_points,
        }
    }
}

/// Progress of a balance through the level table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LevelProgress {
    pub current: Level,
    /// `None` at the top level.
    pub next: Option<Level>,
    /// Points still needed to reach `next` (0 at the top level).
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub points_to_next: i64,
    /// Percent through the current band, 0..=100.
    pub percent: u8,
}

fn threshold_for(points: i64) -> &'static LevelThreshold {
    // Negative balances are not expected but are not prevented everywhere
    // upstream, so they fall back to the first level.
    let points = points.max(0);
    LEVEL_THRESHOLDS
        .iter()
        .rev()
        .find(|t| t.min_points <= points)
        .unwrap_or(&LEVEL_THRESHOLDS[0])
}

/// Derive the level for a point balance.
///
/// Returns the highest threshold whose `min_points` is at or below `points`.
pub fn calculate_level(points: i64) -> Level {
    threshold_for(points).into()
}

/// Derive the current level plus progress toward the next one.
pub fn level_progress(points: i64) -> LevelProgress {
    let points = points.max(0);
    let current = threshold_for(points);
    let next = LEVEL_THRESHOLDS
        .iter()
        .find(|t| t.min_points > current.min_points);

    let (points_to_next, percent) = match next {
        Some(next) => {
            let band = next.min_points - current.min_points;
            let into_band = points - current.min_points;
            let percent = (into_band * 100 / band).clamp(0, 100) as u8;
            (next.min_points - points, percent)
        }
        None => (0, 100),
    };

    LevelProgress {
        current: current.into(),
        next: next.map(Level::from),
        points_to_next,
        percent,
    }
}

/// The full table as descriptors, lowest level first.
pub fn level_table() -> Vec<Level> {
    LEVEL_THRESHOLDS.iter().map(Level::from).collect()
}
