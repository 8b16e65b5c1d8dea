// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! View models consumed by the dashboard.
//!
//! Everything here is derived from already-cleaned rows: labels for the
//! activity picker, a compact payload summary, data-quality warnings, chart
//! series and the map track.

use crate::models::record::json_type_name;
use crate::models::{ActivityRecord, CleanedSampleRow, Payload, Sample};
use crate::services::normalizer::activity_name;
use crate::time_utils::format_utc_rfc3339;
use chrono::{DateTime, Utc};
use geo::{BoundingRect, MultiPoint, Point};
use serde::Serialize;
use serde_json::Value;

/// Rows below this count trigger a "few samples" warning.
pub const MIN_EXPECTED_SAMPLES: usize = 20;
/// Rows shown in the tabular preview.
pub const PREVIEW_ROWS: usize = 200;
const PAYLOAD_PREVIEW_CHARS: usize = 300;
const MIN_COORDINATE_ROWS: usize = 5;

/// Metrics charted against `timerDuration`, in display order.
pub const CHART_METRICS: &[(&str, fn(&Sample) -> Option<f64>)] = &[
    ("heartRate", |s| s.heart_rate),
    ("totalDistanceInMeters", |s| s.total_distance_in_meters),
    ("speedMetersPerSecond", |s| s.speed_meters_per_second),
    ("elevationInMeters", |s| s.elevation_in_meters),
];

// ─── Labels & Payload Summary ────────────────────────────────

/// Picker label: `"{created_at} — {name}"`, or `"{id} — {created_at}"`.
pub fn activity_label(record: &ActivityRecord) -> String {
    let created = record
        .created_at
        .map(format_utc_rfc3339)
        .unwrap_or_default();
    match activity_name(record) {
        Some(name) => format!("{} — {}", created, name),
        None => {
            let id = record
                .id
                .map(|id| id.to_string())
                .unwrap_or_else(|| "unknown".to_string());
            format!("{} — {}", id, created)
        }
    }
}

/// One top-level payload key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PayloadEntry {
    pub key: String,
    #[serde(rename = "type")]
    pub value_type: &'static str,
    /// Element count for arrays and objects
    pub len: Option<usize>,
}

/// Compact description of a payload (never the full JSON).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PayloadSummary {
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub entries: Vec<PayloadEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

pub fn summarize_payload(payload: &Payload) -> PayloadSummary {
    let (entries, preview) = match payload {
        Payload::Structured(map) => {
            let entries = map
                .iter()
                .map(|(key, value)| PayloadEntry {
                    key: key.clone(),
                    value_type: json_type_name(value),
                    len: match value {
                        Value::Array(items) => Some(items.len()),
                        Value::Object(fields) => Some(fields.len()),
                        _ => None,
                    },
                })
                .collect();
            (entries, None)
        }
        Payload::Other(value) => (
            Vec::new(),
            Some(truncate_chars(&value.to_string(), PAYLOAD_PREVIEW_CHARS)),
        ),
        Payload::Unparsed(text) => (
            Vec::new(),
            Some(truncate_chars(&format!("{:?}", text), PAYLOAD_PREVIEW_CHARS)),
        ),
        Payload::Absent => (Vec::new(), None),
    };

    PayloadSummary {
        kind: payload.kind(),
        entries,
        preview,
    }
}

// ─── Quality Warnings ────────────────────────────────────────

/// Non-blocking data-quality warning.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum QualityWarning {
    FewSamples { count: usize },
    NonMonotonicTimer,
    NoCoordinates,
    SparseCoordinates { valid: usize, total: usize },
}

impl QualityWarning {
    pub fn message(&self) -> String {
        match self {
            QualityWarning::FewSamples { count } => format!(
                "Activity has few samples ({}); data may be incomplete",
                count
            ),
            QualityWarning::NonMonotonicTimer => {
                "timerDuration is not monotonically increasing; samples may be out of order or duplicated"
                    .to_string()
            }
            QualityWarning::NoCoordinates => "No coordinates in this activity's samples".to_string(),
            QualityWarning::SparseCoordinates { valid, total } => format!(
                "Very few valid coordinates ({}/{}); the track may be incomplete",
                valid, total
            ),
        }
    }
}

fn timer_is_monotonic(rows: &[CleanedSampleRow]) -> bool {
    let mut previous: Option<DateTime<Utc>> = None;
    for row in rows {
        let Some(current) = row.timer_duration else {
            return false;
        };
        if previous.is_some_and(|p| current < p) {
            return false;
        }
        previous = Some(current);
    }
    true
}

/// Data-quality checks over cleaned rows.
pub fn quality_warnings(rows: &[CleanedSampleRow]) -> Vec<QualityWarning> {
    let mut warnings = Vec::new();
    let total = rows.len();

    if total < MIN_EXPECTED_SAMPLES {
        warnings.push(QualityWarning::FewSamples { count: total });
    }

    let has_timer = rows
        .iter()
        .any(|r| r.sample.timer_duration_in_seconds.is_some());
    if has_timer && !timer_is_monotonic(rows) {
        warnings.push(QualityWarning::NonMonotonicTimer);
    }

    // Both columns must appear somewhere before coordinates are judged
    let has_coordinate_fields = rows.iter().any(|r| r.sample.latitude_in_degree.is_some())
        && rows.iter().any(|r| r.sample.longitude_in_degree.is_some());
    if has_coordinate_fields {
        let valid = rows
            .iter()
            .filter(|r| r.sample.coordinates().is_some())
            .count();
        let threshold = MIN_COORDINATE_ROWS.max(total / 5);
        if valid == 0 {
            warnings.push(QualityWarning::NoCoordinates);
        } else if valid < threshold {
            warnings.push(QualityWarning::SparseCoordinates { valid, total });
        }
    }

    if !warnings.is_empty() {
        tracing::debug!(count = warnings.len(), "Sample quality warnings");
    }
    warnings
}

// ─── Chart & Map ─────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub t: DateTime<Utc>,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub metric: &'static str,
    pub points: Vec<ChartPoint>,
}

/// Rows ordered by `timerDuration` (stable; rows without one go last).
pub fn sort_by_timer(rows: &[CleanedSampleRow]) -> Vec<&CleanedSampleRow> {
    let mut sorted: Vec<&CleanedSampleRow> = rows.iter().collect();
    sorted.sort_by(|a, b| match (a.timer_duration, b.timer_duration) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
    sorted
}

/// One time series per chart metric that has any value.
pub fn chart_series(rows: &[CleanedSampleRow]) -> Vec<ChartSeries> {
    let sorted = sort_by_timer(rows);

    CHART_METRICS
        .iter()
        .filter(|(_, field)| rows.iter().any(|r| field(&r.sample).is_some()))
        .map(|(metric, field)| ChartSeries {
            metric: *metric,
            points: sorted
                .iter()
                .filter_map(|r| {
                    Some(ChartPoint {
                        t: r.timer_duration?,
                        value: field(&r.sample),
                    })
                })
                .collect(),
        })
        .collect()
}

/// GeoJSON feature of every sample position, with its bounding box.
pub fn map_track(rows: &[CleanedSampleRow]) -> Option<geojson::Feature> {
    let points: MultiPoint<f64> = rows
        .iter()
        .filter_map(|r| r.sample.coordinates())
        .map(|(lat, lon)| Point::new(lon, lat))
        .collect();
    let rect = points.bounding_rect()?;

    Some(geojson::Feature {
        bbox: Some(vec![rect.min().x, rect.min().y, rect.max().x, rect.max().y]),
        geometry: Some(geojson::Geometry::new(geojson::Value::from(&points))),
        id: None,
        properties: None,
        foreign_members: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::normalizer::normalize_record;
    use crate::time_utils::epoch_offset;
    use serde_json::json;

    fn row(seconds: Option<f64>, coords: Option<(f64, f64)>) -> CleanedSampleRow {
        CleanedSampleRow {
            sample: Sample {
                timer_duration_in_seconds: seconds,
                latitude_in_degree: coords.map(|c| c.0),
                longitude_in_degree: coords.map(|c| c.1),
                heart_rate: Some(140.0),
                ..Sample::default()
            },
            distance_diff: 1.0,
            seconds_diff: None,
            timer_duration: seconds.and_then(epoch_offset),
        }
    }

    fn record(value: Value) -> ActivityRecord {
        normalize_record(value.as_object().cloned().unwrap())
    }

    #[test]
    fn test_label_with_name() {
        let rec = record(json!({
            "id": 5,
            "created_at": "2024-05-01T08:00:00Z",
            "data": { "activityDetails": [ { "activityName": "Hill Repeats" } ] }
        }));
        assert_eq!(activity_label(&rec), "2024-05-01T08:00:00.000Z — Hill Repeats");
    }

    #[test]
    fn test_label_falls_back_to_id() {
        let rec = record(json!({ "id": 5, "created_at": "2024-05-01T08:00:00Z", "data": "oops" }));
        assert_eq!(activity_label(&rec), "5 — 2024-05-01T08:00:00.000Z");
    }

    #[test]
    fn test_summarize_structured_payload() {
        let rec = record(json!({ "data": { "activityDetails": [1, 2], "userId": "u", "meta": { "a": 1 } } }));
        let summary = summarize_payload(&rec.data);

        assert_eq!(summary.kind, "object");
        let details = summary.entries.iter().find(|e| e.key == "activityDetails").unwrap();
        assert_eq!(details.value_type, "array");
        assert_eq!(details.len, Some(2));
        let user = summary.entries.iter().find(|e| e.key == "userId").unwrap();
        assert_eq!(user.len, None);
    }

    #[test]
    fn test_summarize_unparsed_payload_is_truncated() {
        let summary = summarize_payload(&Payload::Unparsed("x".repeat(1000)));
        assert_eq!(summary.kind, "string");
        assert_eq!(summary.preview.unwrap().chars().count(), 300);
    }

    #[test]
    fn test_few_samples_warning() {
        let rows: Vec<_> = (0..3).map(|i| row(Some(i as f64), None)).collect();
        assert_eq!(
            quality_warnings(&rows),
            vec![QualityWarning::FewSamples { count: 3 }]
        );
    }

    #[test]
    fn test_non_monotonic_timer_warning() {
        let mut rows: Vec<_> = (0..25).map(|i| row(Some(i as f64), None)).collect();
        rows.swap(3, 4);
        assert_eq!(quality_warnings(&rows), vec![QualityWarning::NonMonotonicTimer]);
    }

    #[test]
    fn test_missing_timer_is_non_monotonic() {
        let mut rows: Vec<_> = (0..25).map(|i| row(Some(i as f64), None)).collect();
        rows[10] = row(None, None);
        assert_eq!(quality_warnings(&rows), vec![QualityWarning::NonMonotonicTimer]);
    }

    #[test]
    fn test_sparse_coordinates_warning() {
        let mut rows: Vec<_> = (0..30).map(|i| row(Some(i as f64), None)).collect();
        rows[0] = row(Some(0.0), Some((37.4, -122.1)));
        rows[1].sample.latitude_in_degree = Some(37.5);

        assert_eq!(
            quality_warnings(&rows),
            vec![QualityWarning::SparseCoordinates { valid: 1, total: 30 }]
        );
    }

    #[test]
    fn test_no_coordinates_warning() {
        let mut rows: Vec<_> = (0..30).map(|i| row(Some(i as f64), None)).collect();
        rows[1].sample.latitude_in_degree = Some(37.4);
        rows[2].sample.longitude_in_degree = Some(-122.0);
        assert_eq!(quality_warnings(&rows), vec![QualityWarning::NoCoordinates]);
    }

    #[test]
    fn test_single_coordinate_column_is_not_checked() {
        let mut rows: Vec<_> = (0..30).map(|i| row(Some(i as f64), None)).collect();
        rows[2].sample.latitude_in_degree = Some(37.4);
        assert!(quality_warnings(&rows).is_empty());
    }

    #[test]
    fn test_chart_series_sorted_and_filtered() {
        let rows = vec![row(Some(20.0), None), row(Some(10.0), None), row(None, None)];
        let series = chart_series(&rows);

        assert_eq!(series.len(), 1);
        assert_eq!(series[0].metric, "heartRate");
        assert_eq!(series[0].points.len(), 2);
        assert!(series[0].points[0].t < series[0].points[1].t);
    }

    #[test]
    fn test_map_track() {
        let rows = vec![
            row(Some(0.0), Some((37.0, -122.0))),
            row(Some(1.0), None),
            row(Some(2.0), Some((38.0, -121.0))),
        ];
        let feature = map_track(&rows).unwrap();
        assert_eq!(feature.bbox, Some(vec![-122.0, 37.0, -121.0, 38.0]));

        let value = serde_json::to_value(&feature).unwrap();
        assert_eq!(value["geometry"]["type"], json!("MultiPoint"));
        assert_eq!(value["geometry"]["coordinates"][0], json!([-122.0, 37.0]));

        assert!(map_track(&[row(Some(0.0), None)]).is_none());
    }
}
