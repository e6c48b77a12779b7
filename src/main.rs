// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! tDIL Points API Server
//!
//! Serves the points & leveling ledger: balances, history, leaderboard,
//! reward redemption and admin adjustments.

use std::sync::Arc;
use tdil_points::{
    config::{Config, StorageBackend},
    db::{FirestoreDb, LedgerStore, MemoryStore},
    services::PointsService,
    AppState,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(
        port = config.port,
        storage = ?config.storage_backend,
        login_streak_enabled = config.login_streak_enabled,
        "Starting tDIL Points API"
    );

    let store: Arc<dyn LedgerStore> = match config.storage_backend {
        StorageBackend::Firestore => Arc::new(FirestoreDb::new(&config.gcp_project_id).await?),
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory ledger store; balances are lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    let points = PointsService::new(store, config.login_streak_enabled);

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        points,
    });

    // Build router
    let app = tdil_points::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("tdil_points=debug,info"));

    tracing_subscriber::registry().with(filter).with(format).init();
}
