use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::models::event::{CalendarEventDraft, EventDateTime};

pub const DEFAULT_MAX_SUBTASKS: u32 = 3;

/// What the user wants planned, as read back by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanExtraction {
    pub target_task: String,
    pub target_time: String,
    pub max_subtasks: u32,
}

impl PlanExtraction {
    /// Builds the triple from a model object. Keys are compared lower-cased
    /// so `Target Task`, `target_task` and `target task` all match.
    pub fn from_object(object: &Map<String, Value>) -> Result<Self, String> {
        let lowered: Map<String, Value> = object
            .iter()
            .map(|(k, v)| (k.trim().to_lowercase().replace([' ', '-'], "_"), v.clone()))
            .collect();

        let target_task = lookup_str(&lowered, &["target_task", "task"])
            .ok_or_else(|| "missing target_task".to_string())?;
        let target_time = lookup_str(&lowered, &["target_time", "deadline", "time"])
            .ok_or_else(|| "missing target_time".to_string())?;
        let max_subtasks = [
            "max_subtasks",
            "maximum_number_of_detailed_tasks",
            "maximum_number_of_detailed_task",
        ]
        .iter()
        .find_map(|key| lowered.get(*key))
        .and_then(|value| match value {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
        .filter(|n| *n > 0)
        .map(|n| n.min(u64::from(u32::MAX)) as u32)
        .unwrap_or(DEFAULT_MAX_SUBTASKS);

        Ok(Self {
            target_task,
            target_time,
            max_subtasks,
        })
    }
}

/// One dated step of a decomposed task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtask {
    pub task: String,
    pub start: String,
    pub end: String,
    #[serde(rename = "timeZone")]
    pub time_zone: String,
}

impl Subtask {
    /// Reads a subtask from model output. Accepts flat `start`/`end` strings
    /// or nested `{dateTime, timeZone}` objects, and `summary` in place of
    /// `task`.
    pub fn from_value(value: &Value, default_time_zone: &str) -> Result<Self, String> {
        let object = value
            .as_object()
            .ok_or_else(|| format!("subtask is not an object: {value}"))?;
        let task = ["task", "summary", "summery", "title"]
            .iter()
            .find_map(|key| object.get(*key).and_then(Value::as_str))
            .unwrap_or_default()
            .trim()
            .to_string();

        let (start, start_zone) = read_time(object.get("start"))
            .ok_or_else(|| format!("subtask '{task}' has no start"))?;
        let (end, end_zone) = read_time(object.get("end"))
            .ok_or_else(|| format!("subtask '{task}' has no end"))?;
        let time_zone = object
            .get("timeZone")
            .or_else(|| object.get("timezone"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .or(start_zone)
            .or(end_zone)
            .unwrap_or_else(|| default_time_zone.to_string());

        Ok(Self {
            task,
            start,
            end,
            time_zone,
        })
    }

    pub fn to_draft(&self) -> CalendarEventDraft {
        CalendarEventDraft {
            summary: self.task.clone(),
            location: None,
            description: None,
            start: EventDateTime {
                date_time: self.start.clone(),
                time_zone: self.time_zone.clone(),
            },
            end: EventDateTime {
                date_time: self.end.clone(),
                time_zone: self.time_zone.clone(),
            },
            attendees: Vec::new(),
        }
    }
}

/// A subtask after insertion, carrying the created event's link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedSubtask {
    #[serde(flatten)]
    pub subtask: Subtask,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

fn lookup_str(object: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| object.get(*key))
        .and_then(|value| match value {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
}

fn read_time(value: Option<&Value>) -> Option<(String, Option<String>)> {
    match value? {
        Value::String(s) => Some((s.trim().to_string(), None)),
        Value::Object(nested) => {
            let date_time = nested.get("dateTime").and_then(Value::as_str)?;
            let zone = nested
                .get("timeZone")
                .and_then(Value::as_str)
                .map(str::to_string);
            Some((date_time.trim().to_string(), zone))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extraction_keys_are_case_insensitive() {
        let object = json!({
            "Target Task": "present a paper",
            "TARGET_TIME": "next Monday",
            "Maximum number of detailed tasks": "5"
        });
        let extraction = PlanExtraction::from_object(object.as_object().unwrap()).unwrap();
        assert_eq!(extraction.target_task, "present a paper");
        assert_eq!(extraction.target_time, "next Monday");
        assert_eq!(extraction.max_subtasks, 5);
    }

    #[test]
    fn extraction_defaults_to_three_subtasks() {
        let object = json!({"target_task": "move house", "target_time": "Friday"});
        let extraction = PlanExtraction::from_object(object.as_object().unwrap()).unwrap();
        assert_eq!(extraction.max_subtasks, DEFAULT_MAX_SUBTASKS);
    }

    #[test]
    fn extraction_requires_a_task() {
        let object = json!({"target_time": "Friday"});
        assert!(PlanExtraction::from_object(object.as_object().unwrap()).is_err());
    }

    #[test]
    fn subtask_reads_nested_times() {
        let value = json!({
            "summery": "Selecting a Paper",
            "start": {"dateTime": "2023-11-21T09:00:00+09:00", "timeZone": "Asia/Seoul"},
            "end": {"dateTime": "2023-11-21T12:00:00+09:00", "timeZone": "Asia/Seoul"}
        });
        let subtask = Subtask::from_value(&value, "UTC").unwrap();
        assert_eq!(subtask.task, "Selecting a Paper");
        assert_eq!(subtask.start, "2023-11-21T09:00:00+09:00");
        assert_eq!(subtask.time_zone, "Asia/Seoul");
    }

    #[test]
    fn planned_subtask_serializes_flat_with_url() {
        let planned = PlannedSubtask {
            subtask: Subtask {
                task: "Read".to_string(),
                start: "2023-11-21T09:00:00+09:00".to_string(),
                end: "2023-11-21T11:00:00+09:00".to_string(),
                time_zone: "Asia/Seoul".to_string(),
            },
            url: Some("https://calendar.example/e1".to_string()),
        };
        let value = serde_json::to_value(&planned).unwrap();
        assert_eq!(value["task"], "Read");
        assert_eq!(value["timeZone"], "Asia/Seoul");
        assert_eq!(value["url"], "https://calendar.example/e1");
    }
}
