// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! tDIL points: the points & leveling ledger for the tDIL member platform.
//!
//! Members earn points for activity (connections, job applications,
//! events), climb a fixed level table, and spend points on catalog
//! rewards. This crate provides the ledger as a library (`PointsService`)
//! and as an authenticated HTTP API.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use services::PointsService;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub points: PointsService,
}
