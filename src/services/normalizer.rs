// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Payload normalization.
//!
//! Stored webhook rows come in several shapes: the payload may live under
//! `data` or `payload`, may be a JSON-encoded string, and may wrap the
//! activity in an `activityDetails` list. Everything here resolves those
//! variants once so downstream code sees a single canonical shape.

use crate::models::{ActivityRecord, Payload};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::{Map, Value};

/// A logical attribute and the field names it may be stored under,
/// in priority order.
pub struct FieldAliases {
    pub name: &'static str,
    pub candidates: &'static [&'static str],
}

pub const RECORD_ID: FieldAliases = FieldAliases {
    name: "id",
    candidates: &["id", "webhook_id"],
};
pub const RECORD_TYPE: FieldAliases = FieldAliases {
    name: "type",
    candidates: &["type"],
};
pub const RECORD_CREATED_AT: FieldAliases = FieldAliases {
    name: "created_at",
    candidates: &["created_at", "created"],
};
pub const RECORD_DATA: FieldAliases = FieldAliases {
    name: "data",
    candidates: &["data", "payload"],
};
pub const ACTIVITY_ID: FieldAliases = FieldAliases {
    name: "activity_id",
    candidates: &["activityId", "id"],
};
pub const ACTIVITY_NAME: FieldAliases = FieldAliases {
    name: "activity_name",
    candidates: &["activityName", "activity_name", "name"],
};
pub const USER_ID: FieldAliases = FieldAliases {
    name: "user_id",
    candidates: &["userId", "user_id"],
};

impl FieldAliases {
    /// First candidate field present with a non-null value.
    pub fn lookup<'a>(&self, map: &'a Map<String, Value>) -> Option<&'a Value> {
        self.candidates
            .iter()
            .filter_map(|key| map.get(*key))
            .find(|v| !v.is_null())
    }

    /// First candidate field with a meaningful value.
    ///
    /// `0`, `false`, `""` and empty containers are treated like null, so a
    /// placeholder in an earlier field falls through to the next candidate.
    pub fn lookup_set<'a>(&self, map: &'a Map<String, Value>) -> Option<&'a Value> {
        self.candidates
            .iter()
            .filter_map(|key| map.get(*key))
            .find(|v| is_set(v))
    }

    /// Like [`lookup`](Self::lookup), but only non-empty strings count.
    pub fn lookup_str<'a>(&self, map: &'a Map<String, Value>) -> Option<&'a str> {
        self.candidates
            .iter()
            .filter_map(|key| map.get(*key))
            .filter_map(Value::as_str)
            .find(|s| !s.is_empty())
    }
}

fn is_set(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
    }
}

/// Parse a JSON-encoded payload string.
pub fn parse_payload_text(text: &str) -> Result<Value, serde_json::Error> {
    serde_json::from_str(text)
}

/// Resolve a raw `data` value into the canonical payload union.
pub fn resolve_payload(value: Option<&Value>) -> Payload {
    match value {
        None | Some(Value::Null) => Payload::Absent,
        Some(Value::Object(map)) => Payload::Structured(map.clone()),
        Some(Value::String(text)) => match parse_payload_text(text) {
            Ok(Value::Object(map)) => Payload::Structured(map),
            Ok(other) => Payload::Other(other),
            Err(e) => {
                tracing::debug!(error = %e, "Payload string is not JSON; keeping original text");
                Payload::Unparsed(text.clone())
            }
        },
        Some(other) => Payload::Other(other.clone()),
    }
}

fn coerce_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn coerce_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    let text = value.as_str()?.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S%.f%#z", "%Y-%m-%d %H:%M:%S%#z"]
        .iter()
        .find_map(|fmt| DateTime::parse_from_str(text, fmt).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|| {
            ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
                .map(|naive| naive.and_utc())
        })
}

/// Normalize one stored row into an [`ActivityRecord`].
pub fn normalize_record(raw: Map<String, Value>) -> ActivityRecord {
    let id = RECORD_ID.lookup_set(&raw).and_then(coerce_id);
    let record_type = RECORD_TYPE.lookup_str(&raw).map(str::to_string);
    let created_at = RECORD_CREATED_AT
        .lookup_set(&raw)
        .and_then(coerce_timestamp);
    let data = resolve_payload(RECORD_DATA.lookup(&raw));

    ActivityRecord {
        id,
        record_type,
        created_at,
        data,
        raw,
    }
}

/// Locate the authoritative activity detail block within a payload map.
///
/// A non-empty `activityDetails` list contributes its first element;
/// otherwise the payload itself is the detail block.
pub fn detail_block_of(data: &Map<String, Value>) -> Option<&Value> {
    match data.get("activityDetails") {
        Some(Value::Array(details)) if !details.is_empty() => details.first(),
        _ => None,
    }
}

/// The activity detail block of a normalized record.
///
/// Returns `None` when the payload is not a JSON object.
pub fn detail_block(record: &ActivityRecord) -> Option<&Map<String, Value>> {
    let data = record.data.as_map()?;
    match detail_block_of(data) {
        Some(first) => first.as_object(),
        None => Some(data),
    }
}

/// Human-friendly name of the activity, if the payload carries one.
pub fn activity_name(record: &ActivityRecord) -> Option<&str> {
    let data = record.data.as_map()?;
    detail_block_of(data)
        .and_then(Value::as_object)
        .and_then(|first| ACTIVITY_NAME.lookup_str(first))
        .or_else(|| ACTIVITY_NAME.lookup_str(data))
}

/// User ID the activity belongs to, if the payload carries one.
pub fn user_id(record: &ActivityRecord) -> Option<String> {
    let data = record.data.as_map()?;
    let value = detail_block(record)
        .and_then(|detail| USER_ID.lookup(detail))
        .or_else(|| USER_ID.lookup(data))?;
    Some(match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_normalize_primary_names() {
        let record = normalize_record(raw(json!({
            "id": 7,
            "type": "activity-details",
            "created_at": "2024-05-01T08:00:00Z",
            "data": { "samples": [] }
        })));

        assert_eq!(record.id, Some(7));
        assert_eq!(record.record_type.as_deref(), Some("activity-details"));
        assert_eq!(
            record.created_at.map(|d| d.to_rfc3339()),
            Some("2024-05-01T08:00:00+00:00".to_string())
        );
        assert!(matches!(record.data, Payload::Structured(_)));
        assert!(record.raw.contains_key("type"));
    }

    #[test]
    fn test_normalize_aliases() {
        let record = normalize_record(raw(json!({
            "webhook_id": "12",
            "created": "2024-05-01 08:00:00.123+00",
            "payload": "{\"activityDetails\": []}"
        })));

        assert_eq!(record.id, Some(12));
        assert!(record.created_at.is_some());
        assert!(record.data.as_map().unwrap().contains_key("activityDetails"));
    }

    #[test]
    fn test_primary_name_wins_over_alias() {
        let record = normalize_record(raw(json!({
            "id": 1,
            "webhook_id": 2,
            "data": { "a": 1 },
            "payload": { "b": 2 }
        })));

        assert_eq!(record.id, Some(1));
        assert!(record.data.as_map().unwrap().contains_key("a"));
    }

    #[test]
    fn test_placeholder_id_falls_through_to_alias() {
        let record = normalize_record(raw(json!({
            "id": 0,
            "webhook_id": 17,
            "created_at": "",
            "created": "2024-05-01T08:00:00Z"
        })));
        assert_eq!(record.id, Some(17));
        assert!(record.created_at.is_some());

        let record = normalize_record(raw(json!({ "id": "", "webhook_id": "23" })));
        assert_eq!(record.id, Some(23));
    }

    #[test]
    fn test_null_data_falls_back_to_payload() {
        let record = normalize_record(raw(json!({ "data": null, "payload": { "b": 2 } })));
        assert!(record.data.as_map().unwrap().contains_key("b"));
    }

    #[test]
    fn test_unparseable_string_kept_verbatim() {
        let record = normalize_record(raw(json!({ "data": "{not json" })));
        assert_eq!(record.data, Payload::Unparsed("{not json".to_string()));
        assert!(detail_block(&record).is_none());
    }

    #[test]
    fn test_string_encoding_a_list_is_other() {
        let record = normalize_record(raw(json!({ "data": "[1, 2]" })));
        assert_eq!(record.data, Payload::Other(json!([1, 2])));
        assert!(detail_block(&record).is_none());
    }

    #[test]
    fn test_missing_data_is_absent() {
        let record = normalize_record(raw(json!({ "id": 3 })));
        assert_eq!(record.data, Payload::Absent);
    }

    #[test]
    fn test_detail_block_unwraps_first_activity() {
        let record = normalize_record(raw(json!({
            "data": { "activityDetails": [ { "activityId": 1 }, { "activityId": 2 } ] }
        })));
        let detail = detail_block(&record).unwrap();
        assert_eq!(detail.get("activityId"), Some(&json!(1)));
    }

    #[test]
    fn test_detail_block_empty_list_uses_data() {
        let record = normalize_record(raw(json!({
            "data": { "activityDetails": [], "samples": [ {} ] }
        })));
        let detail = detail_block(&record).unwrap();
        assert!(detail.contains_key("samples"));
    }

    #[test]
    fn test_activity_name_lookup() {
        let nested = normalize_record(raw(json!({
            "data": { "activityDetails": [ { "activity_name": "Morning Run" } ] }
        })));
        assert_eq!(activity_name(&nested), Some("Morning Run"));

        let bare = normalize_record(raw(json!({ "data": { "name": "Track" } })));
        assert_eq!(activity_name(&bare), Some("Track"));

        let none = normalize_record(raw(json!({ "data": { "activityName": "" } })));
        assert_eq!(activity_name(&none), None);
    }

    #[test]
    fn test_user_id_lookup() {
        let record = normalize_record(raw(json!({
            "data": { "activityDetails": [ { "userId": "abc" } ] }
        })));
        assert_eq!(user_id(&record).as_deref(), Some("abc"));

        let numeric = normalize_record(raw(json!({ "data": { "user_id": 42 } })));
        assert_eq!(user_id(&numeric).as_deref(), Some("42"));
    }
}
