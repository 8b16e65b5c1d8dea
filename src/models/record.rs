// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Stored webhook record model.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

/// Webhook type tag for activity detail payloads.
pub const ACTIVITY_DETAILS_TYPE: &str = "activity-details";

/// The `data` field of a stored record, resolved once at normalization time.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// A JSON object (stored structured, or parsed from a string)
    Structured(Map<String, Value>),
    /// Valid JSON that is not an object (array, number, ...)
    Other(Value),
    /// A string that did not parse as JSON, kept verbatim
    Unparsed(String),
    /// No data field at all
    Absent,
}

impl Payload {
    /// The payload as a JSON object, if it is one.
    pub fn as_map(&self) -> Option<&Map<String, Value>> {
        match self {
            Payload::Structured(map) => Some(map),
            _ => None,
        }
    }

    /// Short type name used in payload summaries.
    pub fn kind(&self) -> &'static str {
        match self {
            Payload::Structured(_) => "object",
            Payload::Other(value) => json_type_name(value),
            Payload::Unparsed(_) => "string",
            Payload::Absent => "null",
        }
    }
}

/// Name of a JSON value's type.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// One stored webhook row after normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityRecord {
    /// Row ID (`id` or `webhook_id`)
    pub id: Option<i64>,
    /// Type tag, normally `activity-details`
    pub record_type: Option<String>,
    /// Ingestion timestamp
    pub created_at: Option<DateTime<Utc>>,
    /// Resolved payload
    pub data: Payload,
    /// The entire original record
    pub raw: Map<String, Value>,
}
