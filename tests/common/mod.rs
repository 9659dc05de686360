#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;

use calendarBot::error::{CalendarError, OpenAIError};
use calendarBot::models::event::{CalendarEvent, CalendarEventDraft, CreatedEvent};
use calendarBot::models::transcript::ChatMessage;
use calendarBot::service::calendar_service::CalendarClient;
use calendarBot::service::openai_service::OpenAIClient;

/// Returns canned replies in order and records every message list it saw.
pub struct ScriptedOpenAI {
    replies: Mutex<VecDeque<String>>,
    pub calls: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedOpenAI {
    pub fn new(replies: &[&str]) -> Self {
        Self {
            replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn last_prompt(&self, call: usize) -> String {
        let calls = self.calls.lock().unwrap();
        calls[call].last().map(|m| m.content.clone()).unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl OpenAIClient for ScriptedOpenAI {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, OpenAIError> {
        self.calls.lock().unwrap().push(messages.to_vec());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or(OpenAIError::EmptyResponse)
    }
}

#[derive(Default)]
pub struct FakeCalendar {
    pub events: Vec<CalendarEvent>,
    /// 1-based index of the insert that should fail.
    pub fail_on_insert: Option<usize>,
    pub list_calls: Mutex<Vec<(String, String, String)>>,
    pub inserted: Mutex<Vec<(String, CalendarEventDraft)>>,
    insert_attempts: Mutex<usize>,
}

impl FakeCalendar {
    pub fn with_events(events: Vec<CalendarEvent>) -> Self {
        Self {
            events,
            ..Self::default()
        }
    }

    pub fn failing_on_insert(n: usize) -> Self {
        Self {
            fail_on_insert: Some(n),
            ..Self::default()
        }
    }

    pub fn insert_attempts(&self) -> usize {
        *self.insert_attempts.lock().unwrap()
    }

    pub fn inserted(&self) -> Vec<(String, CalendarEventDraft)> {
        self.inserted.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl CalendarClient for FakeCalendar {
    async fn list_events(
        &self,
        calendar_id: &str,
        time_min: &str,
        time_max: &str,
    ) -> Result<Vec<CalendarEvent>, CalendarError> {
        self.list_calls.lock().unwrap().push((
            calendar_id.to_string(),
            time_min.to_string(),
            time_max.to_string(),
        ));
        Ok(self.events.clone())
    }

    async fn insert_event(
        &self,
        calendar_id: &str,
        event: &CalendarEventDraft,
    ) -> Result<CreatedEvent, CalendarError> {
        let attempt = {
            let mut attempts = self.insert_attempts.lock().unwrap();
            *attempts += 1;
            *attempts
        };
        if self.fail_on_insert == Some(attempt) {
            return Err(CalendarError::Status {
                status: 500,
                body: "backend error".to_string(),
            });
        }
        self.inserted
            .lock()
            .unwrap()
            .push((calendar_id.to_string(), event.clone()));
        Ok(CreatedEvent {
            id: Some(format!("evt{attempt}")),
            html_link: Some(format!("https://calendar.test/event?eid=evt{attempt}")),
        })
    }
}
