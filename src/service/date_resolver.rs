use chrono::{Days, NaiveDate};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::OrchestratorError;
use crate::models::transcript::Transcript;
use crate::service::extract;
use crate::service::openai_service::OpenAIClient;
use crate::service::prompts;

/// A relative-date phrase resolved to a one-day range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateResolution {
    pub detected_phrase: String,
    pub date: NaiveDate,
    pub date_after: NaiveDate,
}

#[derive(Debug, Deserialize)]
struct RawResolution {
    #[serde(default)]
    detected_phrase: String,
    date: String,
    #[serde(default, alias = "date_after")]
    date_after_date: Option<String>,
}

/// Accepts `YYYY/M/D` and `YYYY-MM-DD`, with or without zero padding.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    ["%Y/%m/%d", "%Y-%m-%d", "%Y.%m.%d"]
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
}

/// Reads the model's reply. `date_after` is always `date + 1 day`; a
/// disagreeing model value is logged and ignored.
pub fn read_resolution(reply: &str) -> Result<DateResolution, OrchestratorError> {
    let raw: RawResolution = extract::parse_payload(reply)?;
    let date = parse_date(&raw.date).ok_or_else(|| OrchestratorError::InvalidDate(raw.date.clone()))?;
    let date_after = date
        .checked_add_days(Days::new(1))
        .ok_or_else(|| OrchestratorError::InvalidDate(raw.date.clone()))?;

    if let Some(model_after) = raw.date_after_date.as_deref() {
        if parse_date(model_after) != Some(date_after) {
            warn!(model_after, %date_after, "model's following date disagrees, using date + 1");
        }
    }

    Ok(DateResolution {
        detected_phrase: raw.detected_phrase.trim().to_string(),
        date,
        date_after,
    })
}

pub async fn resolve_date(
    openai: &dyn OpenAIClient,
    transcript: &Transcript,
    text: &str,
    today: NaiveDate,
) -> Result<DateResolution, OrchestratorError> {
    let prompt = prompts::date_prompt(text, today);
    debug!(%prompt, "date detection prompt");
    let reply = openai.complete(&transcript.with_scratch(prompt)).await?;
    debug!(%reply, "date detection reply");
    read_resolution(&reply)
}
