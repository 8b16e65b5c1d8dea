// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Per-activity summary row.

use super::coerce_f64;
use serde::Serialize;
use serde_json::Value;

/// Scalar summary of one activity, read from the detail block's `summary` map.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivitySummary {
    pub duration_in_seconds: Option<f64>,
    pub distance_in_meters: Option<f64>,
    pub average_speed_in_meters_per_second: Option<f64>,
    pub total_elevation_gain_in_meters: Option<f64>,
    pub total_elevation_loss_in_meters: Option<f64>,
    pub activity_type: Option<String>,
}

impl ActivitySummary {
    /// Read a summary from a JSON object; unreadable fields are missing.
    pub fn from_json(value: &Value) -> Self {
        let field = |key: &str| value.get(key).and_then(coerce_f64);
        Self {
            duration_in_seconds: field("durationInSeconds"),
            distance_in_meters: field("distanceInMeters"),
            average_speed_in_meters_per_second: field("averageSpeedInMetersPerSecond"),
            total_elevation_gain_in_meters: field("totalElevationGainInMeters"),
            total_elevation_loss_in_meters: field("totalElevationLossInMeters"),
            activity_type: value
                .get("activityType")
                .and_then(Value::as_str)
                .map(str::to_string),
        }
    }
}
