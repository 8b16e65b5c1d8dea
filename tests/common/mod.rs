// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use activity_metrics::config::Config;
use activity_metrics::db::PostgresDb;
use activity_metrics::routes::create_router;
use activity_metrics::services::cache::QueryKey;
use activity_metrics::services::{load_model, normalize_record, ActivityService, QueryCache};
use activity_metrics::AppState;
use axum::body::Body;
use axum::http::Response;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Load a JSON fixture from `tests/fixtures`.
#[allow(dead_code)]
pub fn fixture(name: &str) -> Value {
    let path = format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name);
    let text = std::fs::read_to_string(&path).expect("Failed to read fixture");
    serde_json::from_str(&text).expect("Failed to parse fixture")
}

/// Stored webhook row wrapping `data`, as the database layer returns it.
#[allow(dead_code)]
pub fn webhook_row(id: i64, created_at: &str, data: Value) -> Value {
    serde_json::json!({
        "id": id,
        "type": "activity-details",
        "created_at": created_at,
        // The database layer always hands over the payload as text
        "data": data.to_string(),
    })
}

/// Create a test app with an offline database.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    create_test_app_with_config(Config::test_default())
}

/// Create a test app from a specific configuration.
#[allow(dead_code)]
pub fn create_test_app_with_config(config: Config) -> (axum::Router, Arc<AppState>) {
    let cache = QueryCache::new(Duration::from_secs(config.cache_ttl_secs));
    let activities = ActivityService::new(
        PostgresDb::new_mock(),
        cache,
        config.target_user_id.clone(),
    );
    let physio_model = load_model(config.physio_model);

    let state = Arc::new(AppState {
        config,
        activities,
        physio_model,
    });

    (create_router(state.clone()), state)
}

/// Pre-populate the query cache for the default list query, so requests
/// without `limit`/`since` never reach the (offline) database.
///
/// Rows are cached unfiltered, exactly as fetched.
#[allow(dead_code)]
pub fn seed_records(state: &AppState, rows: Vec<Value>) {
    let records = rows
        .into_iter()
        .map(|row| normalize_record(row.as_object().cloned().expect("row must be an object")))
        .collect();
    state.activities.cache().insert(
        QueryKey {
            limit: state.config.activity_limit,
            since: None,
        },
        records,
    );
}

/// Read a response body as JSON.
#[allow(dead_code)]
pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    serde_json::from_slice(&bytes).expect("Body is not JSON")
}
