// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Activity record service.
//!
//! Handles the read path behind the dashboard:
//! 1. Fetch `activity-details` rows from PostgreSQL (or the query cache)
//! 2. Normalize each row into an [`ActivityRecord`]
//! 3. Drop records that belong to another user (if a target user is set)
//! 4. Extract cleaned samples and the summary block on demand

use crate::db::PostgresDb;
use crate::error::{AppError, Result};
use crate::models::record::ACTIVITY_DETAILS_TYPE;
use crate::models::{ActivityRecord, ActivitySummary, CleanedSampleRow};
use crate::services::cache::{QueryCache, QueryKey};
use crate::services::extractor::extract_samples;
use crate::services::normalizer::{detail_block, normalize_record, user_id};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Loads and filters activity records.
#[derive(Clone)]
pub struct ActivityService {
    db: PostgresDb,
    cache: QueryCache,
    target_user_id: Option<String>,
}

impl ActivityService {
    pub fn new(db: PostgresDb, cache: QueryCache, target_user_id: Option<String>) -> Self {
        Self {
            db,
            cache,
            target_user_id,
        }
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    /// Most recent activity records, newest first.
    ///
    /// Served from the cache when possible; `refresh` drops every cached
    /// result first. The cache holds every fetched record; the target-user
    /// filter is applied on the way out.
    pub async fn load_records(
        &self,
        limit: u32,
        since: Option<DateTime<Utc>>,
        refresh: bool,
    ) -> Result<Arc<Vec<ActivityRecord>>> {
        if refresh {
            self.cache.clear();
        }

        let key = QueryKey { limit, since };
        if let Some(records) = self.cache.get(&key) {
            tracing::debug!(limit, count = records.len(), "Activity records cache hit");
            return Ok(self.for_target(records));
        }

        let rows = self
            .db
            .fetch_activity_records(ACTIVITY_DETAILS_TYPE, since, limit)
            .await?;
        let records: Vec<ActivityRecord> = rows.into_iter().map(normalize_record).collect();
        let records = self.for_target(self.cache.insert(key, records));

        tracing::info!(limit, kept = records.len(), "Loaded activity records");

        Ok(records)
    }

    /// Records of a loaded list that pass the target-user filter.
    fn for_target(&self, records: Arc<Vec<ActivityRecord>>) -> Arc<Vec<ActivityRecord>> {
        if self.target_user_id.is_none() {
            return records;
        }
        let kept: Vec<ActivityRecord> = records
            .iter()
            .filter(|record| self.belongs_to_target(record))
            .cloned()
            .collect();
        if kept.len() < records.len() {
            tracing::debug!(
                dropped = records.len() - kept.len(),
                "Dropped records of other users"
            );
        }
        Arc::new(kept)
    }

    /// Whether a record passes the target-user filter.
    ///
    /// Records without a user ID are kept.
    pub fn belongs_to_target(&self, record: &ActivityRecord) -> bool {
        let Some(target) = &self.target_user_id else {
            return true;
        };
        match user_id(record) {
            Some(owner) => owner == *target,
            None => true,
        }
    }
}

/// Record at `index` in a loaded list.
pub fn record_at(records: &[ActivityRecord], index: usize) -> Result<&ActivityRecord> {
    records.get(index).ok_or_else(|| {
        AppError::NotFound(format!(
            "Activity {} not found ({} loaded)",
            index,
            records.len()
        ))
    })
}

/// Cleaned samples of a record's authoritative detail block.
pub fn record_samples(record: &ActivityRecord) -> Vec<CleanedSampleRow> {
    detail_block(record)
        .map(extract_samples)
        .unwrap_or_default()
}

/// Summary block of a record, if the detail block carries one.
pub fn record_summary(record: &ActivityRecord) -> Option<ActivitySummary> {
    detail_block(record)
        .and_then(|detail| detail.get("summary"))
        .filter(|summary| summary.is_object())
        .map(ActivitySummary::from_json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use std::time::Duration;

    fn record(value: Value) -> ActivityRecord {
        normalize_record(value.as_object().cloned().unwrap())
    }

    fn service(target: Option<&str>) -> ActivityService {
        ActivityService::new(
            PostgresDb::new_mock(),
            QueryCache::new(Duration::from_secs(60)),
            target.map(str::to_string),
        )
    }

    #[test]
    fn test_target_user_filter() {
        let svc = service(Some("u-1"));
        let mine = record(json!({ "data": { "userId": "u-1" } }));
        let theirs = record(json!({ "data": { "activityDetails": [ { "userId": "u-2" } ] } }));
        let anonymous = record(json!({ "data": { "samples": [] } }));

        assert!(svc.belongs_to_target(&mine));
        assert!(!svc.belongs_to_target(&theirs));
        assert!(svc.belongs_to_target(&anonymous));
        assert!(service(None).belongs_to_target(&theirs));
    }

    #[test]
    fn test_record_samples_and_summary() {
        let rec = record(json!({
            "data": {
                "activityDetails": [ {
                    "summary": { "durationInSeconds": 600, "distanceInMeters": 2000 },
                    "samples": [
                        { "totalDistanceInMeters": 0, "timerDurationInSeconds": 0 },
                        { "totalDistanceInMeters": 40, "timerDurationInSeconds": 10 }
                    ]
                } ]
            }
        }));

        let rows = record_samples(&rec);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].sample.speed_meters_per_second, Some(4.0));

        let summary = record_summary(&rec).unwrap();
        assert_eq!(summary.distance_in_meters, Some(2000.0));
    }

    #[test]
    fn test_unstructured_record_has_no_samples() {
        let rec = record(json!({ "data": "not json at all" }));
        assert!(record_samples(&rec).is_empty());
        assert!(record_summary(&rec).is_none());
    }

    #[test]
    fn test_record_at_out_of_range() {
        let records = vec![record(json!({ "id": 1 }))];
        assert_eq!(record_at(&records, 0).unwrap().id, Some(1));
        assert!(matches!(record_at(&records, 1), Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_cached_records_are_filtered_by_user() {
        let svc = service(Some("u-1"));
        svc.cache().insert(
            QueryKey { limit: 10, since: None },
            vec![
                record(json!({ "id": 1, "data": { "userId": "u-1" } })),
                record(json!({ "id": 2, "data": { "userId": "u-2" } })),
                record(json!({ "id": 3, "data": {} })),
            ],
        );

        let records = svc.load_records(10, None, false).await.unwrap();
        let ids: Vec<_> = records.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![Some(1), Some(3)]);
    }

    #[tokio::test]
    async fn test_load_records_prefers_cache() {
        let svc = service(None);
        svc.cache()
            .insert(QueryKey { limit: 10, since: None }, vec![record(json!({ "id": 7 }))]);

        let records = svc.load_records(10, None, false).await.unwrap();
        assert_eq!(records[0].id, Some(7));

        // Refresh clears the cache and hits the (offline) database.
        let err = svc.load_records(10, None, true).await.unwrap_err();
        assert!(matches!(err, AppError::Database(_)));
        assert!(svc.cache().is_empty());
    }
}
