// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! PostgreSQL client wrapper for the webhooks table.
//!
//! Rows are returned as raw JSON records; interpreting them is the job of
//! the payload normalizer.

use crate::config::DatabaseConfig;
use crate::db::tables;
use crate::error::AppError;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions, PgRow, PgSslMode};
use sqlx::Row;
use std::str::FromStr;
use std::time::Duration;

const MAX_CONNECTIONS: u32 = 5;
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// PostgreSQL database client.
#[derive(Clone)]
pub struct PostgresDb {
    pool: Option<PgPool>,
}

impl PostgresDb {
    /// Connect to PostgreSQL using the configured credentials.
    pub async fn new(config: &DatabaseConfig) -> Result<Self, AppError> {
        let options = connect_options(config)?;
        let pool = PgPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .acquire_timeout(CONNECT_TIMEOUT)
            .connect_with(options)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to PostgreSQL: {}", e)))?;

        tracing::info!(
            host = %config.host,
            port = config.port,
            database = config.dbname.as_deref().unwrap_or(""),
            "Connected to PostgreSQL"
        );

        Ok(Self { pool: Some(pool) })
    }

    /// Create a mock client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { pool: None }
    }

    /// Helper to get the pool or return an error if offline.
    fn get_pool(&self) -> Result<&PgPool, AppError> {
        self.pool
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    /// Fetch webhook rows of one type, newest first.
    ///
    /// `data` is read as text so both `json`/`jsonb` and plain text columns
    /// come back in the same form.
    pub async fn fetch_activity_records(
        &self,
        record_type: &str,
        since: Option<DateTime<Utc>>,
        limit: u32,
    ) -> Result<Vec<Map<String, Value>>, AppError> {
        let query = format!(
            r#"
            SELECT id::bigint AS id, type, data::text AS data, created_at::timestamptz AS created_at
            FROM {}
            WHERE type = $1
              AND ($2::timestamptz IS NULL OR created_at >= $2)
            ORDER BY created_at DESC
            LIMIT $3
            "#,
            tables::WEBHOOKS
        );

        let rows = sqlx::query(&query)
            .bind(record_type)
            .bind(since)
            .bind(i64::from(limit))
            .fetch_all(self.get_pool()?)
            .await?;

        tracing::debug!(
            record_type,
            ?since,
            limit,
            count = rows.len(),
            "Fetched webhook rows"
        );

        rows.iter().map(row_to_record).collect()
    }
}

fn connect_options(config: &DatabaseConfig) -> Result<PgConnectOptions, AppError> {
    let mut options = PgConnectOptions::new()
        .host(&config.host)
        .port(config.port);
    if let Some(dbname) = &config.dbname {
        options = options.database(dbname);
    }
    if let Some(user) = &config.user {
        options = options.username(user);
    }
    if let Some(password) = &config.password {
        options = options.password(password);
    }
    if let Some(sslmode) = &config.sslmode {
        let mode = PgSslMode::from_str(sslmode)
            .map_err(|e| AppError::Database(format!("Invalid sslmode '{}': {}", sslmode, e)))?;
        options = options.ssl_mode(mode);
    }
    Ok(options)
}

/// Convert one result row into a raw record object.
fn row_to_record(row: &PgRow) -> Result<Map<String, Value>, AppError> {
    let id: Option<i64> = row.try_get("id")?;
    let record_type: Option<String> = row.try_get("type")?;
    let data: Option<String> = row.try_get("data")?;
    let created_at: Option<DateTime<Utc>> = row.try_get("created_at")?;

    let mut record = Map::new();
    record.insert("id".to_string(), id.map_or(Value::Null, Value::from));
    record.insert(
        "type".to_string(),
        record_type.map_or(Value::Null, Value::from),
    );
    record.insert("data".to_string(), data.map_or(Value::Null, Value::from));
    record.insert(
        "created_at".to_string(),
        created_at.map_or(Value::Null, |ts| Value::from(ts.to_rfc3339())),
    );
    Ok(record)
}
