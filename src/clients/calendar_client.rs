use reqwest::Url;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::CalendarError;
use crate::models::event::{CalendarEvent, CalendarEventDraft, CreatedEvent};

pub const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/calendar/v3";

#[derive(Debug, Deserialize)]
struct EventPage {
    #[serde(default)]
    items: Vec<CalendarEvent>,
    #[serde(rename = "nextPageToken", default)]
    next_page_token: Option<String>,
}

fn events_url(base_url: &str, calendar_id: &str) -> Result<Url, CalendarError> {
    let mut url = Url::parse(base_url.trim_end_matches('/'))
        .map_err(|e| CalendarError::InvalidUrl(format!("{base_url}: {e}")))?;
    url.path_segments_mut()
        .map_err(|_| CalendarError::InvalidUrl(base_url.to_string()))?
        .pop_if_empty()
        .extend(["calendars", calendar_id, "events"]);
    Ok(url)
}

async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, CalendarError> {
    let status = response.status();
    let text = response.text().await?;
    if !status.is_success() {
        warn!(status = status.as_u16(), "calendar request rejected");
        return Err(CalendarError::Status {
            status: status.as_u16(),
            body: text,
        });
    }
    serde_json::from_str(&text).map_err(|source| CalendarError::Decode {
        source,
        body: text.clone(),
    })
}

/// Lists single (expanded) events in `[time_min, time_max)`, following
/// page tokens until the service reports no more.
pub async fn list_events(
    client: &reqwest::Client,
    base_url: &str,
    access_token: &str,
    calendar_id: &str,
    time_min: &str,
    time_max: &str,
) -> Result<Vec<CalendarEvent>, CalendarError> {
    let url = events_url(base_url, calendar_id)?;
    let mut events = Vec::new();
    let mut page_token: Option<String> = None;

    loop {
        let mut query = vec![
            ("timeMin", time_min.to_string()),
            ("timeMax", time_max.to_string()),
            ("singleEvents", "true".to_string()),
            ("orderBy", "startTime".to_string()),
        ];
        if let Some(token) = &page_token {
            query.push(("pageToken", token.clone()));
        }
        debug!(calendar_id, time_min, time_max, "listing calendar events");
        let response = client
            .get(url.clone())
            .bearer_auth(access_token)
            .query(&query)
            .send()
            .await?;
        let page: EventPage = read_json(response).await?;
        events.extend(page.items);
        match page.next_page_token {
            Some(token) if !token.is_empty() => page_token = Some(token),
            _ => break,
        }
    }
    Ok(events)
}

pub async fn insert_event(
    client: &reqwest::Client,
    base_url: &str,
    access_token: &str,
    calendar_id: &str,
    event: &CalendarEventDraft,
) -> Result<CreatedEvent, CalendarError> {
    let url = events_url(base_url, calendar_id)?;
    debug!(calendar_id, summary = %event.summary, "inserting calendar event");
    let response = client
        .post(url)
        .bearer_auth(access_token)
        .json(event)
        .send()
        .await?;
    read_json(response).await
}
