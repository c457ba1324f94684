use crate::error::SyncError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One turn of conversation context sent to a backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Conversational backend: full-history generation plus single-shot utility
/// completions (classification, checklist extraction, title generation).
#[async_trait::async_trait]
pub trait ChatClient: Send + Sync {
    /// Produce an answer for the windowed conversation.
    async fn chat(&self, messages: &[ChatMessage]) -> Result<String, SyncError>;

    /// Single prompt in, single completion out. Uses the low-cost utility
    /// model; carries no conversation history.
    async fn complete(&self, prompt: &str) -> Result<String, SyncError>;
}

/// Research backend: answers one question with access to current information.
/// Takes only the latest utterance, never the conversation window.
#[async_trait::async_trait]
pub trait ResearchClient: Send + Sync {
    async fn research(&self, question: &str) -> Result<String, SyncError>;
}
