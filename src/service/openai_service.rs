use async_trait::async_trait;

use crate::clients::openai_client::{self, OpenAIRequest, ResponseFormat};
use crate::error::OpenAIError;
use crate::models::transcript::ChatMessage;

#[async_trait]
pub trait OpenAIClient: Send + Sync {
    /// Sends the full message list and returns the model's reply text.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, OpenAIError>;
}

pub struct OpenAIService {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    max_tokens: Option<u32>,
    json_output: bool,
}

impl OpenAIService {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: openai_client::DEFAULT_BASE_URL.to_string(),
            api_key,
            model,
            max_tokens: None,
            json_output: false,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Forces the endpoint's JSON-object reply mode on every call.
    pub fn with_json_output(mut self, json_output: bool) -> Self {
        self.json_output = json_output;
        self
    }
}

#[async_trait]
impl OpenAIClient for OpenAIService {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, OpenAIError> {
        let request = OpenAIRequest {
            model: &self.model,
            messages,
            max_tokens: self.max_tokens,
            response_format: self.json_output.then(ResponseFormat::json_object),
        };
        openai_client::query_openai(&self.http, &self.base_url, &self.api_key, &request).await
    }
}
