// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Time-bounded read cache for activity record queries.
//!
//! The dashboard re-renders on every interaction; caching the last query
//! result keeps that from hitting the database each time.

use crate::models::ActivityRecord;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Parameters identifying one records query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    pub limit: u32,
    pub since: Option<DateTime<Utc>>,
}

struct CachedQuery {
    records: Arc<Vec<ActivityRecord>>,
    fetched_at: Instant,
}

/// Shared query cache with a fixed time-to-live.
#[derive(Clone)]
pub struct QueryCache {
    entries: Arc<DashMap<QueryKey, CachedQuery>>,
    ttl: Duration,
}

impl QueryCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            ttl,
        }
    }

    fn is_fresh(&self, entry: &CachedQuery) -> bool {
        entry.fetched_at.elapsed() < self.ttl
    }

    /// Cached records for `key`, if present and not expired.
    pub fn get(&self, key: &QueryKey) -> Option<Arc<Vec<ActivityRecord>>> {
        {
            let entry = self.entries.get(key)?;
            if self.is_fresh(&entry) {
                return Some(entry.records.clone());
            }
        }
        // Another request may have refreshed the entry since the guard was dropped
        if self
            .entries
            .remove_if(key, |_, entry| !self.is_fresh(entry))
            .is_some()
        {
            tracing::debug!(?key, "Query cache entry expired");
        }
        None
    }

    /// Store a fresh result and return the shared handle.
    ///
    /// Expired entries for other keys are swept first, so the map never holds
    /// more than the results fetched within one TTL.
    pub fn insert(&self, key: QueryKey, records: Vec<ActivityRecord>) -> Arc<Vec<ActivityRecord>> {
        self.entries.retain(|_, entry| self.is_fresh(entry));

        let records = Arc::new(records);
        self.entries.insert(
            key,
            CachedQuery {
                records: records.clone(),
                fetched_at: Instant::now(),
            },
        );
        records
    }

    /// Drop every cached result.
    pub fn clear(&self) {
        self.entries.clear();
        tracing::info!("Query cache cleared");
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Payload;
    use serde_json::Map;

    fn record(id: i64) -> ActivityRecord {
        ActivityRecord {
            id: Some(id),
            record_type: None,
            created_at: None,
            data: Payload::Absent,
            raw: Map::new(),
        }
    }

    fn key(limit: u32) -> QueryKey {
        QueryKey { limit, since: None }
    }

    #[test]
    fn test_hit_within_ttl() {
        let cache = QueryCache::new(Duration::from_secs(60));
        cache.insert(key(10), vec![record(1)]);

        let hit = cache.get(&key(10)).unwrap();
        assert_eq!(hit[0].id, Some(1));
        assert!(cache.get(&key(20)).is_none());
    }

    #[test]
    fn test_expired_entry_is_evicted() {
        let cache = QueryCache::new(Duration::ZERO);
        cache.insert(key(10), vec![record(1)]);

        assert!(cache.get(&key(10)).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_insert_sweeps_expired_keys() {
        let cache = QueryCache::new(Duration::ZERO);
        for offset in 0..1000 {
            let key = QueryKey {
                limit: 200,
                since: DateTime::from_timestamp(1_700_000_000 + offset, 0),
            };
            assert!(cache.get(&key).is_none());
            cache.insert(key, vec![record(offset)]);
        }
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_expired_lookup_keeps_other_entries() {
        let cache = QueryCache::new(Duration::from_secs(60));
        cache.insert(key(10), vec![record(1)]);
        cache.insert(key(20), vec![record(2)]);

        assert!(cache.get(&key(30)).is_none());
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&key(20)).unwrap()[0].id, Some(2));
    }

    #[test]
    fn test_clear() {
        let cache = QueryCache::new(Duration::from_secs(60));
        cache.insert(key(10), vec![]);
        cache.insert(key(20), vec![]);
        assert_eq!(cache.len(), 2);

        cache.clear();
        assert!(cache.is_empty());
    }
}
