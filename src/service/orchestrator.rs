use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tracing::{debug, info};

use crate::config::{SessionConfig, Settings};
use crate::error::OrchestratorError;
use crate::models::transcript::{ChatMessage, Transcript};
use crate::service::calendar_service::{CalendarClient, GoogleCalendarService};
use crate::service::openai_service::{OpenAIClient, OpenAIService};
use crate::service::routing::{Intent, IntentRouter, OpenAIRouter};
use crate::service::{event_service, plan_service, summary_service};

/// Borrowed view handed to each sub-step for one turn.
pub struct TurnContext<'a> {
    pub openai: &'a dyn OpenAIClient,
    pub calendar: &'a dyn CalendarClient,
    pub transcript: &'a Transcript,
    pub config: &'a SessionConfig,
    pub today: NaiveDate,
}

/// Routes each user turn to summarize, add, plan, or free chat.
pub struct Orchestrator {
    openai: Arc<dyn OpenAIClient>,
    calendar: Arc<dyn CalendarClient>,
    router: Arc<dyn IntentRouter>,
    config: SessionConfig,
    transcript: Transcript,
    today: Option<NaiveDate>,
}

impl Orchestrator {
    pub fn new(openai: Arc<dyn OpenAIClient>, calendar: Arc<dyn CalendarClient>, config: SessionConfig) -> Self {
        let router = Arc::new(OpenAIRouter::new(openai.clone()));
        Self {
            openai,
            calendar,
            router,
            config,
            transcript: Transcript::new(),
            today: None,
        }
    }

    pub fn from_settings(settings: Settings) -> Self {
        let openai = OpenAIService::new(settings.openai_api_key, settings.session.model.clone())
            .with_base_url(settings.openai_base_url)
            .with_max_tokens(settings.session.max_tokens)
            .with_json_output(settings.session.json_output);
        let calendar =
            GoogleCalendarService::new(settings.calendar_token).with_base_url(settings.calendar_base_url);
        Self::new(Arc::new(openai), Arc::new(calendar), settings.session)
    }

    pub fn with_router(mut self, router: Arc<dyn IntentRouter>) -> Self {
        self.router = router;
        self
    }

    /// Pins "today" instead of reading the clock in the session zone.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    fn today(&self) -> NaiveDate {
        self.today
            .unwrap_or_else(|| Utc::now().with_timezone(&self.config.timezone).date_naive())
    }

    fn context(&self) -> TurnContext<'_> {
        TurnContext {
            openai: self.openai.as_ref(),
            calendar: self.calendar.as_ref(),
            transcript: &self.transcript,
            config: &self.config,
            today: self.today(),
        }
    }

    pub async fn prompt(&mut self, text: &str) -> Result<String, OrchestratorError> {
        let intent = self.router.route(&self.transcript, text).await?;
        info!(?intent, "handling turn");

        let reply = match intent {
            Intent::Summarize => summary_service::summarize(&self.context(), text).await?,
            Intent::AddEvent => event_service::add_event(&self.context(), text).await?,
            Intent::Plan => plan_service::plan_and_add(&self.context(), text).await?,
            Intent::Chat => return self.chat(text).await,
        };

        self.transcript.push(ChatMessage::user(text));
        self.transcript.push(ChatMessage::assistant(reply.clone()));
        Ok(reply)
    }

    async fn chat(&mut self, text: &str) -> Result<String, OrchestratorError> {
        let reply = self.openai.complete(&self.transcript.with_scratch(text)).await?;
        debug!(%reply, "chat reply");
        self.transcript.push(ChatMessage::user(text));
        self.transcript.push(ChatMessage::assistant(reply.clone()));
        Ok(reply)
    }
}
