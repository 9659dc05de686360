use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::DraftError;

/// Start or end of an event in the calendar service's insert schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDateTime {
    #[serde(rename = "dateTime")]
    pub date_time: String,
    #[serde(rename = "timeZone")]
    pub time_zone: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attendee {
    pub email: String,
}

/// Event body accepted by the calendar insert endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEventDraft {
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub start: EventDateTime,
    pub end: EventDateTime,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub attendees: Vec<Attendee>,
}

impl CalendarEventDraft {
    /// Rejects drafts the calendar would store with an empty title or a
    /// non-positive duration.
    pub fn validate(&self) -> Result<(), DraftError> {
        if self.summary.trim().is_empty() {
            return Err(DraftError::EmptySummary);
        }
        let start = parse_event_time(&self.start.date_time, &self.start.time_zone).ok_or_else(|| {
            DraftError::InvalidTimestamp {
                field: "start",
                value: self.start.date_time.clone(),
            }
        })?;
        let end = parse_event_time(&self.end.date_time, &self.end.time_zone).ok_or_else(|| {
            DraftError::InvalidTimestamp {
                field: "end",
                value: self.end.date_time.clone(),
            }
        })?;
        if start >= end {
            return Err(DraftError::StartNotBeforeEnd {
                start: self.start.date_time.clone(),
                end: self.end.date_time.clone(),
            });
        }
        Ok(())
    }
}

/// Event as the model is asked to emit it: flat time fields and a plain
/// list of attendee emails.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FlatEventDraft {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "startTime")]
    pub start_time: String,
    #[serde(rename = "endTime")]
    pub end_time: String,
    #[serde(rename = "timeZone", default)]
    pub time_zone: Option<String>,
    #[serde(rename = "attendeesEmail", default, deserialize_with = "string_or_list")]
    pub attendees_email: Vec<String>,
}

impl FlatEventDraft {
    /// Nests the flat fields into the insert schema and validates the result.
    pub fn into_draft(self, default_time_zone: &str) -> Result<CalendarEventDraft, DraftError> {
        let time_zone = self
            .time_zone
            .filter(|tz| !tz.trim().is_empty())
            .unwrap_or_else(|| default_time_zone.to_string());
        let draft = CalendarEventDraft {
            summary: self.summary.trim().to_string(),
            location: non_empty(self.location),
            description: non_empty(self.description),
            start: EventDateTime {
                date_time: self.start_time,
                time_zone: time_zone.clone(),
            },
            end: EventDateTime {
                date_time: self.end_time,
                time_zone,
            },
            attendees: self
                .attendees_email
                .into_iter()
                .map(|email| email.trim().to_string())
                .filter(|email| !email.is_empty())
                .map(|email| Attendee { email })
                .collect(),
        };
        draft.validate()?;
        Ok(draft)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventTime {
    #[serde(rename = "dateTime", default, skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(rename = "timeZone", default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

/// Event record returned by the calendar list query.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CalendarEvent {
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub start: Option<EventTime>,
    #[serde(default)]
    pub end: Option<EventTime>,
    #[serde(default)]
    pub organizer: Option<Value>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub attendees: Option<Vec<Value>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CreatedEvent {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "htmlLink", default)]
    pub html_link: Option<String>,
}

/// Reads an RFC3339 timestamp, or a naive `YYYY-MM-DDTHH:MM:SS` one
/// interpreted in `time_zone` (UTC when the zone is unknown).
pub fn parse_event_time(value: &str, time_zone: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S"))
        .ok()?;
    match time_zone.parse::<Tz>() {
        Ok(tz) => tz
            .from_local_datetime(&naive)
            .earliest()
            .map(|local| local.with_timezone(&Utc)),
        Err(_) => Some(Utc.from_utc_datetime(&naive)),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn string_or_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(single)) => single
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                Value::Object(map) => map.get("email").and_then(Value::as_str).map(str::to_string),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    })
}
