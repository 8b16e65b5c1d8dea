// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Sample extraction for a single activity.
//!
//! Turns the raw `samples` list of an activity detail block into cleaned rows:
//! 1. Coerce numeric fields (non-numeric values become missing)
//! 2. Diff cumulative distance and timer against the preceding raw sample
//! 3. Drop rows that did not move forward (`distanceDiff <= 0` or missing)
//! 4. Backfill missing/zero speed from `distanceDiff / secondsDiff`
//! 5. Convert the timer to an absolute timestamp
//!
//! Malformed input never produces an error; it degrades to missing fields or
//! an empty result.

use crate::models::{CleanedSampleRow, Sample};
use crate::time_utils::epoch_offset;
use serde_json::{Map, Value};

/// Successive differences of a series; the first element keeps its own value.
///
/// A difference is missing when either side is missing.
fn successive_diffs(values: &[Option<f64>]) -> Vec<Option<f64>> {
    values
        .iter()
        .enumerate()
        .map(|(i, current)| {
            if i == 0 {
                *current
            } else {
                Some(current.as_ref()? - values[i - 1]?)
            }
        })
        .collect()
}

/// Speed from distance and time deltas, when well defined.
fn backfill_speed(distance_diff: f64, seconds_diff: Option<f64>) -> Option<f64> {
    let seconds = seconds_diff.filter(|s| *s != 0.0)?;
    let speed = distance_diff / seconds;
    speed.is_finite().then_some(speed)
}

/// Extract cleaned rows from one activity detail block.
pub fn extract_samples(detail: &Map<String, Value>) -> Vec<CleanedSampleRow> {
    let raw_samples = match detail.get("samples") {
        Some(Value::Array(samples)) if !samples.is_empty() => samples,
        _ => return Vec::new(),
    };

    let samples: Vec<Sample> = raw_samples.iter().map(Sample::from_json).collect();

    let distances: Vec<Option<f64>> = samples.iter().map(|s| s.total_distance_in_meters).collect();
    let timers: Vec<Option<f64>> = samples.iter().map(|s| s.timer_duration_in_seconds).collect();
    let distance_diffs = successive_diffs(&distances);
    let seconds_diffs = successive_diffs(&timers);

    let rows: Vec<CleanedSampleRow> = samples
        .into_iter()
        .zip(distance_diffs)
        .zip(seconds_diffs)
        .filter_map(|((mut sample, distance_diff), seconds_diff)| {
            let distance_diff = distance_diff.filter(|d| *d > 0.0)?;

            let needs_speed = sample
                .speed_meters_per_second
                .map_or(true, |speed| speed == 0.0);
            if needs_speed {
                if let Some(speed) = backfill_speed(distance_diff, seconds_diff) {
                    sample.speed_meters_per_second = Some(speed);
                }
            }

            let timer_duration = sample.timer_duration_in_seconds.and_then(epoch_offset);

            Some(CleanedSampleRow {
                sample,
                distance_diff,
                seconds_diff,
                timer_duration,
            })
        })
        .collect();

    tracing::debug!(
        raw = raw_samples.len(),
        retained = rows.len(),
        "Extracted samples"
    );

    rows
}
