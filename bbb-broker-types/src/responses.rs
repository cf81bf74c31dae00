/*
 * Copyright 2025 Security Union LLC
 *
 * Licensed under either of
 *
 * * Apache License, Version 2.0
 *   (http://www.apache.org/licenses/LICENSE-2.0)
 * * MIT license
 *   (http://opensource.org/licenses/MIT)
 *
 * at your option.
 */

//! Response payloads returned by the broker.
//!
//! The broker has shipped two envelope styles over time:
//! - `{ "status": true, "data": { ... } }`
//! - `{ "data": { ... } }` or a bare object with the fields at the top level
//!
//! [`StateSnapshot`] hides that difference when looking fields up.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// Generic envelope
// ---------------------------------------------------------------------------

/// A decoded broker response, queried by field name.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateSnapshot(Value);

impl StateSnapshot {
    pub fn new(body: Value) -> Self {
        Self(body)
    }

    /// Look a state field up, first under `data`, then at the top level.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.data()
            .and_then(|data| data.get(name))
            .or_else(|| self.0.as_object().and_then(|body| body.get(name)))
    }

    /// The envelope's boolean `status`, if the endpoint sends one.
    pub fn status(&self) -> Option<bool> {
        self.0.get("status").and_then(Value::as_bool)
    }

    /// The boolean `status` nested in `data`, as sent by meeting endpoints.
    pub fn data_status(&self) -> Option<bool> {
        self.data()
            .and_then(|data| data.get("status"))
            .and_then(Value::as_bool)
    }

    /// A server-provided human readable message, if any.
    pub fn message(&self) -> Option<&str> {
        self.0
            .get("message")
            .or_else(|| self.data().and_then(|data| data.get("message")))
            .and_then(Value::as_str)
    }

    pub fn data(&self) -> Option<&Map<String, Value>> {
        self.0.get("data").and_then(Value::as_object)
    }

    /// The object holding the payload: `data` when present, else the body.
    pub fn payload(&self) -> &Value {
        match self.0.get("data") {
            Some(data) if data.is_object() || data.is_array() => data,
            _ => &self.0,
        }
    }

    /// Playback URL carried by a `recording_play` answer (`href`), if non-empty.
    pub fn playback_href(&self) -> Option<&str> {
        self.field("href")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|href| !href.is_empty())
    }
}

impl From<Value> for StateSnapshot {
    fn from(body: Value) -> Self {
        Self(body)
    }
}

// ---------------------------------------------------------------------------
// Meeting payloads
// ---------------------------------------------------------------------------

/// Response payload for `action=meeting_info`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct MeetingInfo {
    #[serde(default)]
    pub running: bool,
    #[serde(default)]
    pub status: MeetingStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<MeetingCounts>,
}

impl MeetingInfo {
    /// Decode from either envelope style.
    pub fn from_snapshot(snapshot: &StateSnapshot) -> Result<Self, serde_json::Error> {
        MeetingInfo::deserialize(snapshot.payload())
    }

    pub fn can_join(&self) -> bool {
        self.status.can_join.unwrap_or(false)
    }

    pub fn can_end(&self) -> bool {
        self.status.can_end.unwrap_or(false)
    }
}

/// What the current user may do in the room, and the banner to show.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct MeetingStatus {
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_join: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_end: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join_button_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_button_text: Option<String>,
}

/// Attendance figures for a running meeting.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct MeetingCounts {
    /// Start time in milliseconds since the Unix epoch.
    /// The BBB server sends it as a string; some broker versions as a number.
    #[serde(default, deserialize_with = "lenient_u64")]
    pub start_time: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub moderator_count: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub participant_count: u64,
}

impl MeetingCounts {
    pub fn viewer_count(&self) -> u64 {
        self.participant_count.saturating_sub(self.moderator_count)
    }

    /// Start time truncated to whole seconds.
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        let secs = i64::try_from(self.start_time / 1000).ok()?;
        DateTime::from_timestamp(secs, 0)
    }
}

fn lenient_u64<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Lenient {
        Number(u64),
        Text(String),
        Null,
    }

    match Lenient::deserialize(deserializer)? {
        Lenient::Number(n) => Ok(n),
        Lenient::Text(s) if s.trim().is_empty() => Ok(0),
        Lenient::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
        Lenient::Null => Ok(0),
    }
}

// ---------------------------------------------------------------------------
// Recording payloads
// ---------------------------------------------------------------------------

/// One row of `action=recording_list_table`, kept as an open map because the
/// columns depend on the broker version and the activity's settings.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(transparent)]
pub struct RecordingRow(pub Map<String, Value>);

impl RecordingRow {
    pub fn recording_id(&self) -> Option<&str> {
        ["recordingid", "recordingID", "recording_id"]
            .iter()
            .find_map(|key| self.0.get(*key))
            .and_then(Value::as_str)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }
}

/// Extract the rows of a `recording_list_table` response.
///
/// Accepts `data` as an array, or as an object with a `recordings` array.
pub fn recording_rows(snapshot: &StateSnapshot) -> Vec<RecordingRow> {
    let rows = match snapshot.payload() {
        Value::Array(rows) => Some(rows),
        Value::Object(body) => body.get("recordings").and_then(Value::as_array),
        _ => None,
    };
    rows.map(|rows| {
        rows.iter()
            .filter_map(|row| row.as_object().cloned().map(RecordingRow))
            .collect()
    })
    .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn playback_href_ignores_blank_values() {
        let nested = StateSnapshot::new(json!({"data": {"href": "https://bbb/playback/1"}}));
        assert_eq!(nested.playback_href(), Some("https://bbb/playback/1"));
        let blank = StateSnapshot::new(json!({"status": true, "href": " "}));
        assert_eq!(blank.playback_href(), None);
        assert_eq!(StateSnapshot::default().playback_href(), None);
    }

    #[test]
    fn field_prefers_data_then_top_level() {
        let nested = StateSnapshot::new(json!({"status": true, "data": {"published": "false"}}));
        assert_eq!(nested.field("published"), Some(&json!("false")));

        let flat = StateSnapshot::new(json!({"published": "true"}));
        assert_eq!(flat.field("published"), Some(&json!("true")));
        assert_eq!(flat.field("protected"), None);
    }

    #[test]
    fn status_falls_back_to_envelope_for_imported_deletes() {
        let body = StateSnapshot::new(json!({"status": true}));
        assert_eq!(body.field("status"), Some(&json!(true)));
        assert_eq!(body.status(), Some(true));
        assert_eq!(body.data_status(), None);
    }

    #[test]
    fn meeting_info_decodes_string_counts() {
        let snapshot = StateSnapshot::new(json!({
            "running": true,
            "status": {
                "message": "This conference is in progress.",
                "can_join": true,
                "can_end": false,
                "join_url": "https://bbb.example.com/join"
            },
            "info": {
                "startTime": "1600000000123",
                "moderatorCount": 1,
                "participantCount": "4"
            }
        }));
        let info = MeetingInfo::from_snapshot(&snapshot).unwrap();
        assert!(info.running);
        assert!(info.can_join());
        assert!(!info.can_end());
        let counts = info.info.unwrap();
        assert_eq!(counts.viewer_count(), 3);
        assert_eq!(counts.started_at().unwrap().timestamp(), 1_600_000_000);
    }

    #[test]
    fn meeting_info_reads_data_envelope() {
        let snapshot = StateSnapshot::new(json!({"data": {"running": false}}));
        let info = MeetingInfo::from_snapshot(&snapshot).unwrap();
        assert!(!info.running);
        assert!(!info.can_join());
        assert!(info.info.is_none());
    }

    #[test]
    fn viewer_count_never_underflows() {
        let counts = MeetingCounts {
            start_time: 0,
            moderator_count: 2,
            participant_count: 1,
        };
        assert_eq!(counts.viewer_count(), 0);
    }

    #[test]
    fn recording_rows_accept_both_shapes() {
        let array = StateSnapshot::new(json!({"status": true, "data": [{"recordingid": "a"}]}));
        let rows = recording_rows(&array);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].recording_id(), Some("a"));

        let object = StateSnapshot::new(json!({"data": {"recordings": [{"recordingID": "b"}, 3]}}));
        let rows = recording_rows(&object);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].recording_id(), Some("b"));
    }
}
