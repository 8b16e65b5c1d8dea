// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Telemetry sample models.

use super::coerce_f64;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

/// One raw telemetry point.
///
/// Known numeric fields are coerced leniently; everything else is carried
/// through untouched in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Sample {
    pub total_distance_in_meters: Option<f64>,
    pub timer_duration_in_seconds: Option<f64>,
    pub speed_meters_per_second: Option<f64>,
    pub heart_rate: Option<f64>,
    pub elevation_in_meters: Option<f64>,
    pub latitude_in_degree: Option<f64>,
    pub longitude_in_degree: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub air_temperature_celcius: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub power_in_watts: Option<f64>,
    /// Unrecognized fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn take_numeric(fields: &mut Map<String, Value>, key: &str) -> Option<f64> {
    fields.remove(key).as_ref().and_then(coerce_f64)
}

impl Sample {
    /// Build a sample from one element of a payload's `samples` list.
    ///
    /// Non-object elements yield a sample with every field missing.
    pub fn from_json(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return Self::default();
        };
        let mut fields = obj.clone();

        let total_distance_in_meters = take_numeric(&mut fields, "totalDistanceInMeters");
        let timer_duration_in_seconds = take_numeric(&mut fields, "timerDurationInSeconds");
        let speed_meters_per_second = take_numeric(&mut fields, "speedMetersPerSecond");
        let heart_rate = take_numeric(&mut fields, "heartRate");
        let elevation_in_meters = take_numeric(&mut fields, "elevationInMeters");
        let latitude_in_degree = take_numeric(&mut fields, "latitudeInDegree");
        let longitude_in_degree = take_numeric(&mut fields, "longitudeInDegree");
        let air_temperature_celcius = take_numeric(&mut fields, "airTemperatureCelcius");
        let power_in_watts = take_numeric(&mut fields, "powerInWatts");

        Self {
            total_distance_in_meters,
            timer_duration_in_seconds,
            speed_meters_per_second,
            heart_rate,
            elevation_in_meters,
            latitude_in_degree,
            longitude_in_degree,
            air_temperature_celcius,
            power_in_watts,
            extra: fields,
        }
    }

    /// Latitude/longitude pair, if both are present.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        Some((self.latitude_in_degree?, self.longitude_in_degree?))
    }
}

/// A retained sample with derived fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanedSampleRow {
    #[serde(flatten)]
    pub sample: Sample,
    /// Distance gained since the preceding raw sample (always > 0)
    pub distance_diff: f64,
    /// Seconds elapsed since the preceding raw sample
    pub seconds_diff: Option<f64>,
    /// `timerDurationInSeconds` as an offset from the Unix epoch
    pub timer_duration: Option<DateTime<Utc>>,
}

/// A cleaned row tagged with the activity it came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedSampleRow {
    #[serde(flatten)]
    pub row: CleanedSampleRow,
    /// Position of the activity in the payload's `activityDetails` list
    pub activity_index: usize,
    /// `activityId` (or `id`) of that activity
    pub activity_id: Option<Value>,
}
