// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Multi-activity sample aggregation.

use crate::models::AggregatedSampleRow;
use crate::services::extractor::extract_samples;
use crate::services::normalizer::ACTIVITY_ID;
use serde_json::{Map, Value};

/// Extract samples from every entry of a payload's `activityDetails` list.
///
/// Rows are tagged with the activity's position and ID; activities without
/// any retained rows are skipped.
pub fn extract_all_samples(payload: &Map<String, Value>) -> Vec<AggregatedSampleRow> {
    let Some(Value::Array(details)) = payload.get("activityDetails") else {
        return Vec::new();
    };

    let mut rows = Vec::new();
    for (activity_index, detail) in details.iter().enumerate() {
        let Some(detail) = detail.as_object() else {
            tracing::debug!(activity_index, "Skipping non-object activity detail");
            continue;
        };

        let extracted = extract_samples(detail);
        if extracted.is_empty() {
            continue;
        }

        let activity_id = ACTIVITY_ID.lookup_set(detail).cloned();
        rows.extend(extracted.into_iter().map(|row| AggregatedSampleRow {
            row,
            activity_index,
            activity_id: activity_id.clone(),
        }));
    }

    tracing::debug!(
        activities = details.len(),
        rows = rows.len(),
        "Aggregated samples"
    );
    rows
}
