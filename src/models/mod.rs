// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod record;
pub mod sample;
pub mod summary;

pub use record::{ActivityRecord, Payload};
pub use sample::{AggregatedSampleRow, CleanedSampleRow, Sample};
pub use summary::ActivitySummary;

use serde_json::Value;

/// Lenient numeric coercion for payload values.
///
/// Numbers and numeric strings become `f64`; NaN, booleans, nulls and
/// anything else are treated as missing.
pub fn coerce_f64(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    (!n.is_nan()).then_some(n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coerce_numbers_and_strings() {
        assert_eq!(coerce_f64(&json!(12)), Some(12.0));
        assert_eq!(coerce_f64(&json!(1.5)), Some(1.5));
        assert_eq!(coerce_f64(&json!(" 42.25 ")), Some(42.25));
    }

    #[test]
    fn test_coerce_non_numeric_is_missing() {
        assert_eq!(coerce_f64(&json!("fast")), None);
        assert_eq!(coerce_f64(&json!("NaN")), None);
        assert_eq!(coerce_f64(&json!(null)), None);
        assert_eq!(coerce_f64(&json!(true)), None);
        assert_eq!(coerce_f64(&json!([1])), None);
    }
}
