// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Activity-Metrics API Server
//!
//! Serves cleaned telemetry samples and training metrics for activity
//! webhooks stored in PostgreSQL.

use activity_metrics::{
    config::Config,
    db::PostgresDb,
    services::{load_model, ActivityService, QueryCache},
    AppState,
};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting Activity-Metrics API");

    // Connect to PostgreSQL
    let db = PostgresDb::new(&config.database).await?;

    let cache = QueryCache::new(Duration::from_secs(config.cache_ttl_secs));
    tracing::info!(ttl_secs = config.cache_ttl_secs, "Query cache initialized");

    if let Some(target) = &config.target_user_id {
        tracing::info!(target_user_id = %target, "Filtering activities by user");
    }
    let activities = ActivityService::new(db, cache, config.target_user_id.clone());

    let physio_model = load_model(config.physio_model);

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        activities,
        physio_model,
    });

    // Build router
    let app = activity_metrics::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("activity_metrics=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
