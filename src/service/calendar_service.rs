use async_trait::async_trait;

use crate::clients::calendar_client;
use crate::error::CalendarError;
use crate::models::event::{CalendarEvent, CalendarEventDraft, CreatedEvent};

#[async_trait]
pub trait CalendarClient: Send + Sync {
    async fn list_events(
        &self,
        calendar_id: &str,
        time_min: &str,
        time_max: &str,
    ) -> Result<Vec<CalendarEvent>, CalendarError>;

    async fn insert_event(
        &self,
        calendar_id: &str,
        event: &CalendarEventDraft,
    ) -> Result<CreatedEvent, CalendarError>;
}

/// Calendar backed by the Google Calendar v3 REST API.
pub struct GoogleCalendarService {
    http: reqwest::Client,
    base_url: String,
    access_token: String,
}

impl GoogleCalendarService {
    pub fn new(access_token: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: calendar_client::DEFAULT_BASE_URL.to_string(),
            access_token,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl CalendarClient for GoogleCalendarService {
    async fn list_events(
        &self,
        calendar_id: &str,
        time_min: &str,
        time_max: &str,
    ) -> Result<Vec<CalendarEvent>, CalendarError> {
        calendar_client::list_events(
            &self.http,
            &self.base_url,
            &self.access_token,
            calendar_id,
            time_min,
            time_max,
        )
        .await
    }

    async fn insert_event(
        &self,
        calendar_id: &str,
        event: &CalendarEventDraft,
    ) -> Result<CreatedEvent, CalendarError> {
        calendar_client::insert_event(&self.http, &self.base_url, &self.access_token, calendar_id, event)
            .await
    }
}
