// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Sports metrics: pace/speed conversions, grade, intensity, training
//! stress, energy expenditure, quartiles and time-in-zone.
//!
//! All functions are pure. Bad data degrades to `0.0`, `None` or an empty
//! result; only an unparseable pace string or a missing physiological model
//! produce an error.

use crate::models::ActivitySummary;
use crate::services::physiology::PhysiologicalModel;
use serde::Serialize;

/// Reference running threshold pace (min/km).
const RUN_THRESHOLD_PACE: f64 = 3.75;
/// Reference cycling threshold power (watts).
const BIKE_THRESHOLD_POWER: f64 = 200.0;
/// Reference swim threshold pace (min/100m).
const SWIM_THRESHOLD_PACE_100M: f64 = 2.0;
/// Default athlete weight for energy estimates (kg).
pub const DEFAULT_WEIGHT_KG: f64 = 73.0;
const JOULES_PER_CALORIE: f64 = 4.184;

/// Errors from metric calculations.
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    #[error("Invalid pace format: {0}")]
    InvalidPace(String),

    #[error("Physiological model '{0}' is not available; configure PHYSIO_MODEL to enable it")]
    ModelUnavailable(&'static str),
}

// ─── Pace & Speed ────────────────────────────────────────────

/// Parse `"M:SS"`/`"MM:SS"` (or a bare number) into decimal minutes.
pub fn pace_to_minutes(pace: &str) -> Result<f64, MetricsError> {
    let invalid = || MetricsError::InvalidPace(pace.to_string());
    let trimmed = pace.trim();

    match trimmed.split_once(':') {
        Some((minutes, rest)) => {
            let seconds = rest.split(':').next().unwrap_or_default();
            let minutes: f64 = minutes.trim().parse().map_err(|_| invalid())?;
            let seconds: f64 = seconds.trim().parse().map_err(|_| invalid())?;
            Ok(minutes + seconds / 60.0)
        }
        None => trimmed.parse().map_err(|_| invalid()),
    }
}

/// Format decimal minutes as `"M:SS"`; missing or non-finite input gives `""`.
pub fn minutes_to_pace(minutes: Option<f64>) -> String {
    let Some(minutes) = minutes.filter(|m| m.is_finite()) else {
        return String::new();
    };
    let total_seconds = (minutes * 60.0).round_ties_even() as i64;
    format!(
        "{}:{:02}",
        total_seconds.div_euclid(60),
        total_seconds.rem_euclid(60)
    )
}

/// Convert min/km to km/h; non-positive pace gives `0.0`.
pub fn pace_to_speed(minutes_per_km: f64) -> f64 {
    if minutes_per_km <= 0.0 {
        return 0.0;
    }
    60.0 / minutes_per_km
}

/// Convert km/h to min/km; non-positive speed gives `+inf`.
pub fn speed_to_pace(kph: f64) -> f64 {
    if kph <= 0.0 {
        return f64::INFINITY;
    }
    60.0 / kph
}

/// Convert m/s to km/h.
pub fn mps_to_kph(mps: f64) -> f64 {
    mps * 3.6
}

// ─── Grade & Intensity ───────────────────────────────────────

/// Net grade `(gain - loss) / distance`; never NaN or infinite.
pub fn elevation_grade(gain: Option<f64>, loss: Option<f64>, distance: Option<f64>) -> f64 {
    let (Some(gain), Some(loss), Some(distance)) = (gain, loss, distance) else {
        return 0.0;
    };
    if distance == 0.0 {
        return 0.0;
    }
    let grade = (gain - loss) / distance;
    if grade.is_finite() {
        grade
    } else {
        0.0
    }
}

fn require_model(
    model: Option<&dyn PhysiologicalModel>,
) -> Result<&dyn PhysiologicalModel, MetricsError> {
    model.ok_or(MetricsError::ModelUnavailable("ngp/minetti"))
}

/// Grade-adjustment factor from the physiological model.
pub fn ngp_speed_factor(
    model: Option<&dyn PhysiologicalModel>,
    grade: f64,
) -> Result<f64, MetricsError> {
    Ok(require_model(model)?.ngp_speed_factor(grade))
}

/// Whether a sport's threshold is a power (watts) rather than a speed.
pub fn is_power_sport(sport: &str) -> bool {
    matches!(sport.trim().to_lowercase().as_str(), "cycling" | "bike")
}

/// Per-sport threshold reference.
///
/// Running and swimming return a speed in km/h; cycling returns power in
/// watts. Unrecognized sports are treated as running.
pub fn threshold_speed(sport: &str) -> f64 {
    if is_power_sport(sport) {
        return BIKE_THRESHOLD_POWER;
    }
    match sport.trim().to_lowercase().as_str() {
        "swimming" | "swim" => pace_to_speed(SWIM_THRESHOLD_PACE_100M * 10.0),
        _ => pace_to_speed(RUN_THRESHOLD_PACE),
    }
}

/// Flat-equivalent speed: `avg_speed * ngp_speed_factor(grade)`.
pub fn speed_flat_tp(
    model: Option<&dyn PhysiologicalModel>,
    avg_speed: f64,
    grade: f64,
) -> Result<f64, MetricsError> {
    Ok(avg_speed * ngp_speed_factor(model, grade)?)
}

/// `speed_flat / threshold`, or `0.0` when the threshold is zero.
pub fn intensity_factor(speed_flat: f64, threshold: f64) -> f64 {
    if threshold == 0.0 {
        return 0.0;
    }
    speed_flat / threshold
}

/// Running training stress score.
///
/// `duration * speed_flat * intensity / (threshold * 3600) * 100`; `None`
/// when the duration is unreadable or the threshold is zero.
pub fn rtss(
    summary: &ActivitySummary,
    speed_flat: f64,
    intensity: f64,
    threshold: f64,
) -> Option<f64> {
    let duration = summary.duration_in_seconds?;
    if threshold == 0.0 {
        return None;
    }
    Some(duration * speed_flat * intensity / (threshold * 3600.0) * 100.0)
}

// ─── Energy ──────────────────────────────────────────────────

/// Estimated energy expenditure.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Energy {
    /// Kilojoules per kilogram of body weight
    pub kj_kg: f64,
    /// Kilocalories for the given weight
    pub kcal: f64,
}

/// Energy from the Minetti cost of running over the summary distance.
///
/// Fails only when no model is configured; an unreadable distance gives
/// `Ok(None)`.
pub fn energy(
    model: Option<&dyn PhysiologicalModel>,
    summary: &ActivitySummary,
    grade: f64,
    weight_kg: f64,
) -> Result<Option<Energy>, MetricsError> {
    let model = require_model(model)?;
    let Some(distance) = summary.distance_in_meters else {
        return Ok(None);
    };
    let kj_kg = model.cost_of_running(grade) * distance / 1000.0;
    let kcal = kj_kg * weight_kg / JOULES_PER_CALORIE;
    Ok(Some(Energy { kj_kg, kcal }))
}

// ─── Distributions ───────────────────────────────────────────

/// Quartile summary of strictly positive values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Quartiles {
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    /// Maximum (Q4)
    pub max: f64,
}

/// Linear-interpolation quantile of sorted data.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = (sorted.len() - 1) as f64 * q;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

/// Quartiles over the strictly positive values; `None` if there are none.
pub fn clean_quartiles(values: &[f64]) -> Option<Quartiles> {
    let mut clean: Vec<f64> = values.iter().copied().filter(|v| *v > 0.0).collect();
    if clean.is_empty() {
        return None;
    }
    clean.sort_by(f64::total_cmp);
    Some(Quartiles {
        q1: quantile(&clean, 0.25),
        median: quantile(&clean, 0.5),
        q3: quantile(&clean, 0.75),
        max: quantile(&clean, 1.0),
    })
}

/// Half-open band `[lo, hi)`; a missing bound is unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Zone {
    pub lo: Option<f64>,
    pub hi: Option<f64>,
}

impl Zone {
    pub fn contains(&self, value: f64) -> bool {
        self.lo.map_or(true, |lo| value >= lo) && self.hi.map_or(true, |hi| value < hi)
    }

    /// Contiguous zones covering the whole line, split at `boundaries`.
    pub fn partition(boundaries: &[f64]) -> Vec<Zone> {
        let mut zones = Vec::with_capacity(boundaries.len() + 1);
        let mut lo = None;
        for &b in boundaries {
            zones.push(Zone { lo, hi: Some(b) });
            lo = Some(b);
        }
        zones.push(Zone { lo, hi: None });
        zones
    }
}

/// Share of samples (and time) spent in one zone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ZoneTime {
    pub zone: Zone,
    /// Fraction of non-missing samples in the zone
    pub pct: f64,
    /// Absolute minutes when a total duration is known, else `pct * samples`
    pub minutes: f64,
    pub count: usize,
}

/// Distribution of values across zones.
pub fn time_in_zones(
    values: &[Option<f64>],
    zones: &[Zone],
    total_time_seconds: Option<f64>,
) -> Vec<ZoneTime> {
    let clean: Vec<f64> = values
        .iter()
        .filter_map(|v| *v)
        .filter(|v| !v.is_nan())
        .collect();
    if clean.is_empty() {
        return Vec::new();
    }
    let n = clean.len() as f64;

    zones
        .iter()
        .map(|zone| {
            let count = clean.iter().filter(|v| zone.contains(**v)).count();
            let pct = count as f64 / n;
            let minutes = match total_time_seconds {
                Some(total) => pct * total / 60.0,
                None => pct * n,
            };
            ZoneTime {
                zone: *zone,
                pct,
                minutes,
                count,
            }
        })
        .collect()
}
