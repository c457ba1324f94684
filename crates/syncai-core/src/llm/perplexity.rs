use crate::error::SyncError;
use crate::llm::openai::{map_transport_error, CompletionResponse, WireMessage};
use crate::llm::traits::ResearchClient;
use serde::Serialize;
use std::time::Duration;

pub const RESEARCH_MODEL: &str = "llama-3.1-sonar-small-128k-online";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(90);

/// Online-model research backend. Stateless: each call carries exactly one
/// user question and no conversation history.
pub struct PerplexityResearch {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl PerplexityResearch {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(DEFAULT_TIMEOUT)
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            base_url: "https://api.perplexity.ai".to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

#[derive(Debug, Serialize)]
struct ResearchRequest {
    model: String,
    messages: Vec<WireMessage>,
}

#[async_trait::async_trait]
impl ResearchClient for PerplexityResearch {
    async fn research(&self, question: &str) -> Result<String, SyncError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = ResearchRequest {
            model: RESEARCH_MODEL.to_string(),
            messages: vec![WireMessage {
                role: "user".to_string(),
                content: question.to_string(),
            }],
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
            .map_err(|e| SyncError::api(0, format!("malformed research response: {e}")))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| SyncError::api(0, "research response had no choices"))
    }
}
