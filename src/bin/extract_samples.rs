// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Command-line sample extraction.
//!
//! Usage:
//!   extract-samples PAYLOAD.json   print aggregated rows as JSON lines
//!   extract-samples                summarize the 10 most recent stored records

use activity_metrics::{
    config::Config,
    db::PostgresDb,
    models::record::ACTIVITY_DETAILS_TYPE,
    services::{activity::record_samples, extract_all_samples, normalize_record},
};
use anyhow::{bail, Context, Result};
use serde_json::Value;
use std::io::Write;
use tracing_subscriber::EnvFilter;

/// Records inspected when no payload file is given.
const RECENT_RECORDS: u32 = 10;

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout stays machine-readable
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    match std::env::args().nth(1) {
        Some(path) => extract_file(&path),
        None => summarize_recent().await,
    }
}

/// Print every aggregated row of a payload file as one JSON line.
fn extract_file(path: &str) -> Result<()> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path))?;
    let payload: Value =
        serde_json::from_str(&text).with_context(|| format!("parsing {} as JSON", path))?;
    let Value::Object(payload) = payload else {
        bail!("{} does not contain a JSON object", path);
    };

    let rows = extract_all_samples(&payload);
    let mut stdout = std::io::stdout().lock();
    for row in &rows {
        serde_json::to_writer(&mut stdout, row)?;
        writeln!(stdout)?;
    }
    tracing::info!(path, rows = rows.len(), "Extracted samples");
    Ok(())
}

/// Print the cleaned row count of each recent stored record.
async fn summarize_recent() -> Result<()> {
    let config = Config::from_env()?;
    let db = PostgresDb::new(&config.database).await?;

    let raw = db
        .fetch_activity_records(ACTIVITY_DETAILS_TYPE, None, RECENT_RECORDS)
        .await?;
    for record in raw.into_iter().map(normalize_record) {
        let rows = record_samples(&record);
        let id = record
            .id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        println!("{}\t{}", id, rows.len());
    }
    Ok(())
}
