use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::OpenAIError;
use crate::models::transcript::ChatMessage;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub kind: String,
}

impl ResponseFormat {
    pub fn json_object() -> Self {
        Self {
            kind: "json_object".to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OpenAIRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct Message {
    #[serde(default)]
    content: Option<String>,
}

pub async fn query_openai(
    client: &reqwest::Client,
    base_url: &str,
    api_key: &str,
    request: &OpenAIRequest<'_>,
) -> Result<String, OpenAIError> {
    let url = format!("{}/chat/completions", base_url.trim_end_matches('/'));
    debug!(model = request.model, messages = request.messages.len(), "sending chat completion");

    let response = client
        .post(&url)
        .bearer_auth(api_key)
        .json(request)
        .send()
        .await?;

    let status = response.status();
    let text = response.text().await?;

    if !status.is_success() {
        warn!(status = status.as_u16(), "chat completion rejected");
        return Err(OpenAIError::Status {
            status: status.as_u16(),
            body: text,
        });
    }

    let parsed: OpenAIResponse = serde_json::from_str(&text).map_err(|source| OpenAIError::Decode {
        source,
        body: text.clone(),
    })?;

    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or(OpenAIError::EmptyResponse)
}
