use crate::llm::ChatClient;
use crate::prompts;
use serde::{Deserialize, Serialize};

/// Whether a question can be answered from stable knowledge or needs current
/// information. Computed fresh per message; stored on the assistant message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    Universal,
    TimeSensitive,
}

/// Single-shot question classifier.
///
/// Fails open: any backend failure or off-vocabulary reply yields
/// `Universal`, so classification can never block the answer path.
pub struct Classifier;

impl Classifier {
    pub async fn classify(chat: &dyn ChatClient, question: &str) -> QuestionKind {
        match chat.complete(&prompts::classify(question)).await {
            Ok(reply) if reply.contains(prompts::TIME_SENSITIVE_TOKEN) => {
                QuestionKind::TimeSensitive
            }
            Ok(_) => QuestionKind::Universal,
            Err(err) => {
                tracing::warn!(error = %err, "classification failed, defaulting to universal");
                QuestionKind::Universal
            }
        }
    }
}
