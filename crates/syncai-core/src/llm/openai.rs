use crate::error::SyncError;
use crate::llm::traits::*;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Model used for classification, checklist and title calls regardless of the
/// user-selected generation model.
pub const UTILITY_MODEL: &str = "gpt-4o-mini";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

pub struct OpenAiChat {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAiChat {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(DEFAULT_TIMEOUT)
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            model: model.into(),
            base_url: "https://api.openai.com".to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        self
    }

    async fn completions(&self, model: &str, messages: Vec<WireMessage>) -> Result<String, SyncError> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = CompletionRequest {
            model: model.to_string(),
            messages,
        };

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let text = response.text().await.map_err(map_transport_error)?;

        if status.as_u16() == 401 {
            return Err(SyncError::Auth(text));
        }
        if !status.is_success() {
            return Err(SyncError::api(status.as_u16(), text));
        }

        let parsed: CompletionResponse = serde_json::from_str(&text)
            .map_err(|e| SyncError::api(0, format!("malformed completion response: {e}")))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| SyncError::api(0, "completion had no choices"))
    }
}

#[async_trait::async_trait]
impl ChatClient for OpenAiChat {
    async fn chat(&self, messages: &[ChatMessage]) -> Result<String, SyncError> {
        let wire = messages.iter().map(WireMessage::from).collect();
        self.completions(&self.model, wire).await
    }

    async fn complete(&self, prompt: &str) -> Result<String, SyncError> {
        let wire = vec![WireMessage {
            role: "user".to_string(),
            content: prompt.to_string(),
        }];
        self.completions(UTILITY_MODEL, wire).await
    }
}

/// Translate reqwest transport failures into retry-classifiable errors.
pub(crate) fn map_transport_error(err: reqwest::Error) -> SyncError {
    if err.is_timeout() {
        SyncError::Timeout(err.to_string())
    } else {
        SyncError::Network(err.to_string())
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct WireMessage {
    pub role: String,
    pub content: String,
}

impl From<&ChatMessage> for WireMessage {
    fn from(m: &ChatMessage) -> Self {
        let role = match m.role {
            Role::User => "user",
            Role::Assistant => "assistant",
        };
        Self {
            role: role.to_string(),
            content: m.content.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct CompletionRequest {
    model: String,
    messages: Vec<WireMessage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CompletionResponse {
    pub choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CompletionChoice {
    pub message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CompletionMessage {
    pub content: String,
}
