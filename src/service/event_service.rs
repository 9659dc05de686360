use tracing::{debug, info};

use crate::error::OrchestratorError;
use crate::models::event::{CalendarEventDraft, FlatEventDraft};
use crate::service::extract;
use crate::service::orchestrator::TurnContext;
use crate::service::prompts;

/// Reads the model's flat event object and nests it into the insert schema.
pub fn read_event_draft(reply: &str, default_time_zone: &str) -> Result<CalendarEventDraft, OrchestratorError> {
    let flat: FlatEventDraft = extract::parse_payload(reply)?;
    Ok(flat.into_draft(default_time_zone)?)
}

pub fn render_created(link: Option<&str>) -> String {
    match link {
        Some(link) => format!("Event created: {link}"),
        None => "Event created.".to_string(),
    }
}

pub async fn add_event(ctx: &TurnContext<'_>, text: &str) -> Result<String, OrchestratorError> {
    let time_zone = ctx.config.timezone.name();
    let prompt = prompts::add_event_prompt(text, time_zone, ctx.today);
    debug!(%prompt, "add event prompt");

    let reply = ctx.openai.complete(&ctx.transcript.with_scratch(prompt)).await?;
    debug!(%reply, "add event reply");

    let draft = read_event_draft(&reply, time_zone)?;
    let created = ctx.calendar.insert_event(&ctx.config.calendar_id, &draft).await?;
    info!(summary = %draft.summary, link = ?created.html_link, "event created");
    Ok(render_created(created.html_link.as_deref()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DraftError;

    #[test]
    fn reads_fenced_reply_with_trailing_commas() {
        let reply = "```json\n{\n  \"summary\": \"Lunch with Kim\",\n  \"startTime\": \"2023-11-22T12:00:00+09:00\",\n  \"endTime\": \"2023-11-22T13:00:00+09:00\",\n}\n```";
        let draft = read_event_draft(reply, "Asia/Seoul").unwrap();
        assert_eq!(draft.summary, "Lunch with Kim");
        assert_eq!(draft.end.time_zone, "Asia/Seoul");
    }

    #[test]
    fn invalid_draft_is_reported() {
        let reply = r#"{"summary": "", "startTime": "2023-11-22T12:00:00Z", "endTime": "2023-11-22T13:00:00Z"}"#;
        assert!(matches!(
            read_event_draft(reply, "UTC"),
            Err(OrchestratorError::Draft(DraftError::EmptySummary))
        ));
    }

    #[test]
    fn missing_link_still_confirms() {
        assert_eq!(render_created(Some("https://cal/e1")), "Event created: https://cal/e1");
        assert_eq!(render_created(None), "Event created.");
    }
}
