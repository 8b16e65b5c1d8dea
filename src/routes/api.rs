// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for the activity dashboard.

use crate::config::{parse_zone_boundaries, Config};
use crate::error::{AppError, Result};
use crate::models::{ActivityRecord, AggregatedSampleRow, CleanedSampleRow, Sample};
use crate::services::activity::{record_at, record_samples, record_summary};
use crate::services::aggregator::extract_all_samples;
use crate::services::dashboard::{
    activity_label, chart_series, map_track, quality_warnings, summarize_payload, ChartSeries,
    PayloadSummary, QualityWarning, PREVIEW_ROWS,
};
use crate::services::metrics::{
    self, clean_quartiles, elevation_grade, intensity_factor, is_power_sport, minutes_to_pace,
    mps_to_kph, pace_to_minutes, pace_to_speed, speed_flat_tp, speed_to_pace, threshold_speed,
    time_in_zones, Energy, Quartiles, Zone, ZoneTime,
};
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// API routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/activities", get(get_activities))
        .route("/api/activities/{index}", get(get_activity))
        .route("/api/activities/{index}/samples", get(get_activity_samples))
        .route("/api/activities/{index}/metrics", get(get_activity_metrics))
        .route("/api/extract", post(extract_payload))
}

// ─── Record Selection ────────────────────────────────────────

/// Query parameters selecting which records are loaded.
///
/// Activity indices are positions in the list these parameters produce, so
/// detail requests must repeat the list's `limit` and `since`.
#[derive(Deserialize)]
struct RecordsQuery {
    /// Maximum number of records (clamped to the supported range)
    limit: Option<u32>,
    /// Only records created at or after this time (RFC3339)
    since: Option<String>,
    /// Drop cached results before loading
    #[serde(default)]
    refresh: bool,
}

fn parse_since_timestamp(since: Option<&str>) -> Result<Option<chrono::DateTime<chrono::Utc>>> {
    since
        .map(|raw| {
            chrono::DateTime::parse_from_rfc3339(raw)
                .map(|dt| dt.with_timezone(&chrono::Utc))
                .map_err(|_| {
                    AppError::BadRequest(
                        "Invalid 'since' parameter: must be RFC3339 datetime".to_string(),
                    )
                })
        })
        .transpose()
}

async fn load_records(
    state: &AppState,
    limit: Option<u32>,
    since: Option<&str>,
    refresh: bool,
) -> Result<Arc<Vec<ActivityRecord>>> {
    let limit = Config::clamp_limit(limit, state.config.activity_limit);
    let since = parse_since_timestamp(since)?;
    state.activities.load_records(limit, since, refresh).await
}

impl RecordsQuery {
    async fn load(&self, state: &AppState) -> Result<Arc<Vec<ActivityRecord>>> {
        load_records(state, self.limit, self.since.as_deref(), self.refresh).await
    }
}

// ─── Activity List ───────────────────────────────────────────

#[derive(Serialize, Clone, Debug)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ActivityListItem {
    pub index: u32,
    #[cfg_attr(feature = "binding-generation", ts(type = "number | null"))]
    pub id: Option<i64>,
    pub created_at: Option<String>,
    pub record_type: Option<String>,
    pub label: String,
}

impl ActivityListItem {
    fn from_record(index: usize, record: &ActivityRecord) -> Self {
        Self {
            index: index as u32,
            id: record.id,
            created_at: record.created_at.map(format_utc_rfc3339),
            record_type: record.record_type.clone(),
            label: activity_label(record),
        }
    }
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ActivitiesResponse {
    pub activities: Vec<ActivityListItem>,
    pub total: u32,
}

/// List the most recent activity records.
async fn get_activities(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RecordsQuery>,
) -> Result<Json<ActivitiesResponse>> {
    tracing::debug!(
        limit = ?params.limit,
        since = ?params.since,
        refresh = params.refresh,
        "Fetching activities"
    );

    let records = params.load(&state).await?;
    let activities: Vec<ActivityListItem> = records
        .iter()
        .enumerate()
        .map(|(index, record)| ActivityListItem::from_record(index, record))
        .collect();

    Ok(Json(ActivitiesResponse {
        total: activities.len() as u32,
        activities,
    }))
}

// ─── Activity Detail ─────────────────────────────────────────

/// Warning with its human-readable message.
#[derive(Serialize)]
pub struct WarningResponse {
    #[serde(flatten)]
    pub warning: QualityWarning,
    pub message: String,
}

#[derive(Serialize)]
pub struct ActivityDetailResponse {
    #[serde(flatten)]
    pub record: ActivityListItem,
    pub payload: PayloadSummary,
    pub samples_available: bool,
    pub sample_count: usize,
    /// First rows of the cleaned table
    pub preview: Vec<CleanedSampleRow>,
    pub warnings: Vec<WarningResponse>,
    pub chart: Vec<ChartSeries>,
    pub map: Option<geojson::Feature>,
}

/// Everything the dashboard shows for one activity.
async fn get_activity(
    State(state): State<Arc<AppState>>,
    Path(index): Path<usize>,
    Query(params): Query<RecordsQuery>,
) -> Result<Json<ActivityDetailResponse>> {
    let records = params.load(&state).await?;
    let record = record_at(&records, index)?;
    let rows = record_samples(record);

    tracing::debug!(index, id = ?record.id, rows = rows.len(), "Activity detail");

    if rows.is_empty() {
        return Ok(Json(ActivityDetailResponse {
            record: ActivityListItem::from_record(index, record),
            payload: summarize_payload(&record.data),
            samples_available: false,
            sample_count: 0,
            preview: Vec::new(),
            warnings: Vec::new(),
            chart: Vec::new(),
            map: None,
        }));
    }

    let warnings = quality_warnings(&rows)
        .into_iter()
        .map(|warning| WarningResponse {
            message: warning.message(),
            warning,
        })
        .collect();

    Ok(Json(ActivityDetailResponse {
        record: ActivityListItem::from_record(index, record),
        payload: summarize_payload(&record.data),
        samples_available: true,
        sample_count: rows.len(),
        warnings,
        chart: chart_series(&rows),
        map: map_track(&rows),
        preview: rows.into_iter().take(PREVIEW_ROWS).collect(),
    }))
}

#[derive(Serialize)]
pub struct SamplesResponse {
    pub index: usize,
    pub count: usize,
    pub samples: Vec<CleanedSampleRow>,
}

/// Every cleaned sample row of one activity.
async fn get_activity_samples(
    State(state): State<Arc<AppState>>,
    Path(index): Path<usize>,
    Query(params): Query<RecordsQuery>,
) -> Result<Json<SamplesResponse>> {
    let records = params.load(&state).await?;
    let samples = record_samples(record_at(&records, index)?);

    Ok(Json(SamplesResponse {
        index,
        count: samples.len(),
        samples,
    }))
}

// ─── Metrics ─────────────────────────────────────────────────

#[derive(Deserialize)]
struct MetricsQuery {
    limit: Option<u32>,
    since: Option<String>,
    #[serde(default)]
    refresh: bool,
    /// Sport used to pick the reference threshold (default: running)
    sport: Option<String>,
    /// Athlete weight for energy (default: configured weight)
    weight_kg: Option<f64>,
    /// Threshold pace override, `"M:SS"` per km
    threshold_pace: Option<String>,
    /// Heart-rate zone boundaries override, e.g. `"120,140,160"`
    zones: Option<String>,
}

#[derive(Serialize)]
pub struct PaceStrings {
    pub average: String,
    pub normalized: String,
    pub threshold: String,
}

#[derive(Serialize)]
pub struct MetricsResponse {
    pub index: usize,
    pub sport: String,
    pub grade: f64,
    pub ngp_speed_factor: f64,
    /// Average speed (km/h)
    pub average_speed_kph: f64,
    /// Grade-adjusted flat speed (km/h)
    pub speed_flat_kph: f64,
    pub threshold: f64,
    pub intensity_factor: f64,
    pub rtss: Option<f64>,
    pub energy: Option<Energy>,
    pub weight_kg: f64,
    pub pace: PaceStrings,
    /// Sample speeds (km/h)
    pub speed_quartiles: Option<Quartiles>,
    pub heart_rate_quartiles: Option<Quartiles>,
    pub heart_rate_zones: Vec<ZoneTime>,
}

fn sample_values(rows: &[CleanedSampleRow], field: fn(&Sample) -> Option<f64>) -> Vec<f64> {
    rows.iter().filter_map(|r| field(&r.sample)).collect()
}

/// Training metrics for one activity.
async fn get_activity_metrics(
    State(state): State<Arc<AppState>>,
    Path(index): Path<usize>,
    Query(params): Query<MetricsQuery>,
) -> Result<Json<MetricsResponse>> {
    // Validate overrides before touching storage
    let threshold_override = params
        .threshold_pace
        .as_deref()
        .map(pace_to_minutes)
        .transpose()?;
    let boundaries = match params.zones.as_deref() {
        Some(raw) => parse_zone_boundaries(raw)
            .map_err(|e| AppError::BadRequest(format!("Invalid 'zones' parameter: {}", e)))?,
        None => state.config.hr_zone_boundaries.clone(),
    };
    let weight_kg = params.weight_kg.unwrap_or(state.config.athlete_weight_kg);
    if !weight_kg.is_finite() || weight_kg <= 0.0 {
        return Err(AppError::BadRequest(
            "Invalid 'weight_kg' parameter: must be a positive number".to_string(),
        ));
    }
    let sport = params.sport.unwrap_or_else(|| "running".to_string());

    let records = load_records(
        &state,
        params.limit,
        params.since.as_deref(),
        params.refresh,
    )
    .await?;
    let record = record_at(&records, index)?;
    let rows = record_samples(record);
    let summary = record_summary(record).unwrap_or_default();
    let model = state.physio_model.as_deref();

    let grade = elevation_grade(
        summary.total_elevation_gain_in_meters,
        summary.total_elevation_loss_in_meters,
        summary.distance_in_meters,
    );
    let ngp_factor = metrics::ngp_speed_factor(model, grade)?;
    let average_speed_kph = summary
        .average_speed_in_meters_per_second
        .map(mps_to_kph)
        .unwrap_or(0.0);
    // A power threshold has no pace equivalent unless a pace override is given
    let threshold_is_power = threshold_override.is_none() && is_power_sport(&sport);
    let threshold = match threshold_override {
        Some(minutes) => pace_to_speed(minutes),
        None => threshold_speed(&sport),
    };
    let speed_flat_kph = speed_flat_tp(model, average_speed_kph, grade)?;
    let intensity = intensity_factor(speed_flat_kph, threshold);
    let rtss = metrics::rtss(&summary, speed_flat_kph, intensity, threshold);
    let energy = metrics::energy(model, &summary, grade, weight_kg)?;

    let speeds: Vec<f64> = sample_values(&rows, |s| s.speed_meters_per_second)
        .into_iter()
        .map(mps_to_kph)
        .collect();
    let heart_rates: Vec<Option<f64>> = rows.iter().map(|r| r.sample.heart_rate).collect();
    let heart_rate_zones = time_in_zones(
        &heart_rates,
        &Zone::partition(&boundaries),
        summary.duration_in_seconds,
    );

    tracing::debug!(
        index,
        sport = %sport,
        grade,
        intensity,
        rtss = ?rtss,
        "Computed activity metrics"
    );

    Ok(Json(MetricsResponse {
        index,
        grade,
        ngp_speed_factor: ngp_factor,
        average_speed_kph,
        speed_flat_kph,
        threshold,
        intensity_factor: intensity,
        rtss,
        energy,
        weight_kg,
        pace: PaceStrings {
            average: minutes_to_pace(Some(speed_to_pace(average_speed_kph))),
            normalized: minutes_to_pace(Some(speed_to_pace(speed_flat_kph))),
            threshold: if threshold_is_power {
                String::new()
            } else {
                minutes_to_pace(Some(speed_to_pace(threshold)))
            },
        },
        speed_quartiles: clean_quartiles(&speeds),
        heart_rate_quartiles: clean_quartiles(&sample_values(&rows, |s| s.heart_rate)),
        heart_rate_zones,
        sport,
    }))
}

// ─── Ad-hoc Extraction ───────────────────────────────────────

#[derive(Serialize)]
pub struct ExtractResponse {
    pub count: usize,
    pub rows: Vec<AggregatedSampleRow>,
}

/// Run the multi-activity extraction over a payload posted by the caller.
async fn extract_payload(Json(payload): Json<Value>) -> Result<Json<ExtractResponse>> {
    let Value::Object(payload) = payload else {
        return Err(AppError::BadRequest(
            "Payload must be a JSON object".to_string(),
        ));
    };

    let rows = extract_all_samples(&payload);
    tracing::info!(rows = rows.len(), "Extracted samples from posted payload");

    Ok(Json(ExtractResponse {
        count: rows.len(),
        rows,
    }))
}
