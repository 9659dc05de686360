use thiserror::Error;

use crate::models::plan::PlannedSubtask;

#[derive(Debug, Error)]
pub enum OpenAIError {
    #[error("request to chat completion endpoint failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("chat completion failed with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("failed to decode chat completion body: {source}\nRaw body: {body}")]
    Decode {
        #[source]
        source: serde_json::Error,
        body: String,
    },
    #[error("no response from model")]
    EmptyResponse,
}

#[derive(Debug, Error)]
pub enum CalendarError {
    #[error("request to calendar service failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid calendar service url: {0}")]
    InvalidUrl(String),
    #[error("calendar service returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("failed to decode calendar response: {source}\nRaw body: {body}")]
    Decode {
        #[source]
        source: serde_json::Error,
        body: String,
    },
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("model reply contained no structured payload")]
    NoPayload,
    #[error("model reply is not valid JSON: {source}\nPayload: {payload}")]
    Json {
        #[source]
        source: serde_json::Error,
        payload: String,
    },
    #[error("model reply is not a readable literal at offset {offset}: {reason}")]
    Literal { offset: usize, reason: String },
    #[error("model reply has an unexpected shape: {0}")]
    Shape(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DraftError {
    #[error("event summary is empty")]
    EmptySummary,
    #[error("unreadable {field} timestamp: {value}")]
    InvalidTimestamp { field: &'static str, value: String },
    #[error("event starts at {start} which is not before its end {end}")]
    StartNotBeforeEnd { start: String, end: String },
}

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("could not read the plan request: {0}")]
    Extraction(#[source] ExtractError),
    #[error("could not read the planned subtasks: {0}")]
    Decomposition(#[source] ExtractError),
    #[error("planned subtask '{task}' is invalid: {reason}")]
    ConstraintViolated { task: String, reason: String },
    #[error("inserting '{failed_task}' failed after {} event(s) were created: {source}", .created.len())]
    PartialInsert {
        created: Vec<PlannedSubtask>,
        failed_task: String,
        #[source]
        source: CalendarError,
    },
}

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error(transparent)]
    Model(#[from] OpenAIError),
    #[error(transparent)]
    Calendar(#[from] CalendarError),
    #[error(transparent)]
    Extract(#[from] ExtractError),
    #[error(transparent)]
    Draft(#[from] DraftError),
    #[error(transparent)]
    Plan(#[from] PlanError),
    #[error("model returned an unreadable date: {0}")]
    InvalidDate(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("could not read config file {path}: {reason}")]
    Read { path: String, reason: String },
    #[error("invalid config line {line}: {content}")]
    InvalidLine { line: usize, content: String },
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}
