use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::error::{ExtractError, OrchestratorError};
use crate::models::event::{CalendarEvent, EventTime};
use crate::service::date_resolver::{self, DateResolution};
use crate::service::extract;
use crate::service::orchestrator::TurnContext;
use crate::service::prompts;

/// Query bounds for the list call, midnight to midnight with a `Z` suffix.
///
/// The resolved dates carry no zone, so the range is UTC midnight to UTC
/// midnight rather than local midnight.
pub fn query_range(resolution: &DateResolution) -> (String, String) {
    (
        format!("{}T00:00:00Z", resolution.date.format("%Y-%m-%d")),
        format!("{}T00:00:00Z", resolution.date_after.format("%Y-%m-%d")),
    )
}

/// Display fields of one listed event; absent fields become `""`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventDigest {
    pub summary: Value,
    pub start: Value,
    pub organizer: Value,
    pub end: Value,
    pub location: Value,
    pub attendees: Value,
}

pub fn project_event(event: &CalendarEvent, date: NaiveDate) -> EventDigest {
    let text = |value: &Option<String>| value.clone().map(Value::String).unwrap_or_else(empty);
    EventDigest {
        summary: text(&event.summary),
        start: event.start.as_ref().map(|t| shift_to_date(t, date)).unwrap_or_else(empty),
        organizer: event.organizer.clone().unwrap_or_else(empty),
        end: event.end.as_ref().map(|t| shift_to_date(t, date)).unwrap_or_else(empty),
        location: text(&event.location),
        attendees: event.attendees.clone().map(Value::Array).unwrap_or_else(empty),
    }
}

fn empty() -> Value {
    Value::String(String::new())
}

/// Replaces the date part of a timed event's `dateTime` with `date`. This
/// only affects what the model is shown; all-day times pass through.
fn shift_to_date(time: &EventTime, date: NaiveDate) -> Value {
    let mut shifted = time.clone();
    if let Some(date_time) = &time.date_time {
        let has_date_prefix = date_time
            .get(..10)
            .is_some_and(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").is_ok());
        if has_date_prefix {
            shifted.date_time = Some(format!("{}{}", date.format("%Y-%m-%d"), &date_time[10..]));
        }
    }
    serde_json::to_value(shifted).unwrap_or_else(|_| empty())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgendaItem {
    pub summary: String,
    pub start_time: String,
    pub location: String,
    pub participants: Vec<String>,
}

/// Reads the narrated agenda. Keys are matched case-insensitively and
/// participants may be an empty string, a list of emails, or a list of
/// `{email}` objects.
pub fn read_agenda(reply: &str) -> Result<Vec<AgendaItem>, ExtractError> {
    let value = extract::parse_value(reply)?;
    let schedule = match &value {
        Value::Array(items) => items,
        Value::Object(object) => match field(object, &["schedule"]) {
            Some(Value::Array(items)) => items,
            Some(Value::String(s)) if s.is_empty() => return Ok(Vec::new()),
            _ => return Err(ExtractError::Shape("agenda has no schedule list".to_string())),
        },
        _ => return Err(ExtractError::Shape("agenda is not an object".to_string())),
    };

    schedule
        .iter()
        .map(|item| -> Result<AgendaItem, ExtractError> {
            let object = item
                .as_object()
                .ok_or_else(|| ExtractError::Shape(format!("schedule entry is not an object: {item}")))?;
            Ok(AgendaItem {
                summary: text_field(object, &["summary", "schedule", "title"]),
                start_time: text_field(object, &["start_time", "starttime", "start"]),
                location: text_field(object, &["location"]),
                participants: participants(field(object, &["participants", "attendees"])),
            })
        })
        .collect()
}

fn field<'a>(object: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|wanted| {
        object
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(wanted))
            .map(|(_, value)| value)
    })
}

fn text_field(object: &Map<String, Value>, keys: &[&str]) -> String {
    match field(object, keys) {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn participants(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.trim().to_string()),
                Value::Object(object) => Some(text_field(object, &["email", "displayName", "name"])),
                _ => None,
            })
            .filter(|p| !p.is_empty())
            .collect(),
        Some(Value::String(s)) => s
            .split(',')
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect(),
        _ => Vec::new(),
    }
}

fn join_participants(participants: &[String]) -> String {
    match participants {
        [] => String::new(),
        [only] => only.clone(),
        [first, second] => format!("{first} and {second}"),
        [rest @ .., last] => format!("{}, and {last}", rest.join(", ")),
    }
}

pub fn render_summary(resolution: &DateResolution, items: &[AgendaItem]) -> String {
    let date = resolution.date.format("%Y-%m-%d");
    let mut output = if resolution.detected_phrase.is_empty() {
        format!("You have total {} schedules for {date}.\n", items.len())
    } else {
        format!(
            "You have total {} schedules for {}, {date}.\n",
            items.len(),
            resolution.detected_phrase
        )
    };
    for (i, item) in items.iter().enumerate() {
        output.push_str(&format!(
            "schedule {i} is {}. Start time ⏰ is {}. ",
            item.summary, item.start_time
        ));
        if !item.location.is_empty() {
            output.push_str(&format!("Location is {}. ", item.location));
        }
        if !item.participants.is_empty() {
            output.push_str(&format!("Participants are {}. ", join_participants(&item.participants)));
        }
        output.push('\n');
    }
    output
}

pub async fn summarize(ctx: &TurnContext<'_>, text: &str) -> Result<String, OrchestratorError> {
    let resolution = date_resolver::resolve_date(ctx.openai, ctx.transcript, text, ctx.today).await?;
    let (time_min, time_max) = query_range(&resolution);
    info!(phrase = %resolution.detected_phrase, %time_min, %time_max, "summarizing calendar range");

    let events = ctx
        .calendar
        .list_events(&ctx.config.calendar_id, &time_min, &time_max)
        .await?;
    let digests: Vec<EventDigest> = events
        .iter()
        .map(|event| project_event(event, resolution.date))
        .collect();
    let calendar_input = serde_json::to_string(&digests).map_err(|source| ExtractError::Json {
        source,
        payload: format!("{} events", digests.len()),
    })?;

    let prompt = prompts::summary_prompt(text, resolution.date, &calendar_input);
    debug!(%prompt, "summary prompt");
    let reply = ctx.openai.complete(&ctx.transcript.with_scratch(prompt)).await?;
    debug!(%reply, "summary reply");

    let items = read_agenda(&reply)?;
    Ok(render_summary(&resolution, &items))
}
