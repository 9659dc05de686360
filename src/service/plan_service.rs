use chrono::{Duration, NaiveTime};
use chrono_tz::Tz;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{ExtractError, OrchestratorError, PlanError};
use crate::models::event::parse_event_time;
use crate::models::plan::{PlanExtraction, PlannedSubtask, Subtask};
use crate::service::extract;
use crate::service::orchestrator::TurnContext;
use crate::service::prompts;

/// A daily period in which no subtask may be scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExclusionWindow {
    pub label: &'static str,
    pub start_hour: u32,
    pub end_hour: u32,
}

impl ExclusionWindow {
    fn start(&self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.start_hour, 0, 0).unwrap_or_default()
    }

    fn end(&self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.end_hour, 0, 0).unwrap_or_default()
    }

    /// True when an interval starting at `start` begins inside the window.
    fn holds_start(&self, start: NaiveTime) -> bool {
        self.start() <= start && start < self.end()
    }

    /// True when an interval ending at `end` spent its last moments inside
    /// the window.
    fn holds_end(&self, end: NaiveTime) -> bool {
        self.start() < end && end <= self.end()
    }

    fn overlaps(&self, start: NaiveTime, end: NaiveTime) -> bool {
        start < self.end() && self.start() < end
    }
}

pub const EXCLUSION_WINDOWS: [ExclusionWindow; 3] = [
    ExclusionWindow {
        label: "sleep",
        start_hour: 0,
        end_hour: 9,
    },
    ExclusionWindow {
        label: "lunch",
        start_hour: 12,
        end_hour: 13,
    },
    ExclusionWindow {
        label: "dinner",
        start_hour: 18,
        end_hour: 20,
    },
];

pub const MAX_SUBTASK_HOURS: i64 = 3;

pub fn read_extraction(reply: &str) -> Result<PlanExtraction, PlanError> {
    let value = extract::parse_value(reply).map_err(PlanError::Extraction)?;
    let object = value
        .as_object()
        .ok_or_else(|| PlanError::Extraction(ExtractError::Shape("plan request is not an object".to_string())))?;
    PlanExtraction::from_object(object).map_err(|reason| PlanError::Extraction(ExtractError::Shape(reason)))
}

/// Reads the decomposition reply: a list, an object holding a list, or a
/// bare comma-separated run of objects.
pub fn read_subtasks(reply: &str, default_time_zone: &str) -> Result<Vec<Subtask>, PlanError> {
    let value = match extract::parse_value(reply) {
        Ok(value) => value,
        Err(first) => {
            let span = extract::payload_span(reply).ok_or(PlanError::Decomposition(first))?;
            extract::parse_literal(&format!("[{span}]")).map_err(PlanError::Decomposition)?
        }
    };

    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut object) => {
            let nested = ["subtasks", "tasks", "schedule", "plan"]
                .iter()
                .find_map(|key| match object.remove(*key) {
                    Some(Value::Array(items)) => Some(items),
                    _ => None,
                });
            nested.unwrap_or_else(|| vec![Value::Object(object)])
        }
        other => {
            return Err(PlanError::Decomposition(ExtractError::Shape(format!(
                "subtasks are not a list: {other}"
            ))));
        }
    };

    items
        .iter()
        .map(|item| {
            Subtask::from_value(item, default_time_zone)
                .map_err(|reason| PlanError::Decomposition(ExtractError::Shape(reason)))
        })
        .collect()
}

/// Checks one subtask against the daily exclusion windows in `zone`.
/// Same-day subtasks may not touch a window and are capped at
/// `MAX_SUBTASK_HOURS`; subtasks crossing midnight only need both
/// endpoints outside the windows.
pub fn check_subtask(subtask: &Subtask, zone: Tz) -> Result<(), PlanError> {
    let violation = |reason: String| PlanError::ConstraintViolated {
        task: subtask.task.clone(),
        reason,
    };

    if subtask.task.is_empty() {
        return Err(violation("task name is empty".to_string()));
    }
    let start = parse_event_time(&subtask.start, &subtask.time_zone)
        .ok_or_else(|| violation(format!("unreadable start {}", subtask.start)))?;
    let end = parse_event_time(&subtask.end, &subtask.time_zone)
        .ok_or_else(|| violation(format!("unreadable end {}", subtask.end)))?;
    if start >= end {
        return Err(violation(format!("start {} is not before end {}", subtask.start, subtask.end)));
    }

    let local_start = start.with_timezone(&zone);
    let local_end = end.with_timezone(&zone);
    let (start_time, end_time) = (local_start.time(), local_end.time());
    // An end at exactly midnight still belongs to the start's day.
    let last_day = (end - Duration::nanoseconds(1)).with_timezone(&zone).date_naive();

    if local_start.date_naive() == last_day {
        if end - start > Duration::hours(MAX_SUBTASK_HOURS) {
            return Err(violation(format!("longer than {MAX_SUBTASK_HOURS} hours")));
        }
        if let Some(window) = EXCLUSION_WINDOWS.iter().find(|w| w.overlaps(start_time, end_time)) {
            return Err(violation(format!("overlaps {} time", window.label)));
        }
    } else {
        if let Some(window) = EXCLUSION_WINDOWS.iter().find(|w| w.holds_start(start_time)) {
            return Err(violation(format!("starts during {} time", window.label)));
        }
        if let Some(window) = EXCLUSION_WINDOWS.iter().find(|w| w.holds_end(end_time)) {
            return Err(violation(format!("ends during {} time", window.label)));
        }
    }
    Ok(())
}

pub fn render_plan(planned: &[PlannedSubtask]) -> String {
    let body = serde_json::to_string_pretty(planned).unwrap_or_else(|_| "[]".to_string());
    format!("Added {} events to your calendar:\n{body}", planned.len())
}

pub async fn plan_and_add(ctx: &TurnContext<'_>, text: &str) -> Result<String, OrchestratorError> {
    let time_zone = ctx.config.timezone.name();

    let prompt = prompts::plan_extraction_prompt(text, ctx.today);
    debug!(%prompt, "plan extraction prompt");
    let reply = ctx.openai.complete(&ctx.transcript.with_scratch(prompt)).await?;
    debug!(%reply, "plan extraction reply");
    let extraction = read_extraction(&reply)?;
    info!(task = %extraction.target_task, time = %extraction.target_time, max = extraction.max_subtasks, "planning task");

    let prompt = prompts::plan_decomposition_prompt(&extraction, time_zone, ctx.today);
    debug!(%prompt, "plan decomposition prompt");
    let reply = ctx.openai.complete(&ctx.transcript.with_scratch(prompt)).await?;
    debug!(%reply, "plan decomposition reply");

    let mut subtasks = read_subtasks(&reply, time_zone)?;
    let limit = extraction.max_subtasks as usize;
    if subtasks.len() > limit {
        warn!(returned = subtasks.len(), limit, "model returned too many subtasks, keeping the first ones");
        subtasks.truncate(limit);
    }
    for subtask in &subtasks {
        check_subtask(subtask, ctx.config.timezone)?;
    }

    let mut created = Vec::with_capacity(subtasks.len());
    for subtask in subtasks {
        match ctx.calendar.insert_event(&ctx.config.calendar_id, &subtask.to_draft()).await {
            Ok(event) => {
                info!(task = %subtask.task, link = ?event.html_link, "subtask scheduled");
                created.push(PlannedSubtask {
                    subtask,
                    url: event.html_link,
                });
            }
            Err(source) => {
                warn!(task = %subtask.task, created = created.len(), "subtask insert failed, earlier events are kept");
                return Err(PlanError::PartialInsert {
                    created,
                    failed_task: subtask.task,
                    source,
                }
                .into());
            }
        }
    }
    Ok(render_plan(&created))
}
