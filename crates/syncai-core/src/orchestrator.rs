//! End-to-end send pipeline: classify, fan out to both backends, merge
//! fail-soft, persist the exchange.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, RwLock};

use chrono::{Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;

use crate::classify::{Classifier, QuestionKind};
use crate::config::{ApiKeyStatus, Settings};
use crate::context::HistoryWindower;
use crate::error::{ErrorKind, SyncError};
use crate::llm::{ChatClient, ResearchClient};
use crate::prompts;
use crate::retry::RetryPolicy;
use crate::store::{ResearchRecord, StoredMessage, Thread, ThreadStore, ThreadSummary};
use crate::synthesize::Synthesizer;
use crate::title::TitleGenerator;

pub const NOTICE_KEYS_MISSING: &str = "Set your API keys before sending messages";

pub const RESEARCH_SOURCE: &str = "https://perplexity.ai";

/// Outcome of one `send_message` call. Transient: never persisted itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendResult {
    pub status: SendStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_answer: Option<String>,
    #[serde(default)]
    pub notices: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<SendError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SendStatus {
    Idle,
    Completed,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendError {
    #[serde(rename = "type")]
    pub kind: ErrorKind,
    pub message: String,
}

/// Real state-machine transitions, emitted as they happen so the caller can
/// show progress instead of simulating it on a timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendEvent {
    Classifying,
    Generating,
    Researching,
    Integrating,
    Completed,
    Error,
}

impl SendResult {
    fn idle(notice: &str) -> Self {
        Self {
            status: SendStatus::Idle,
            final_answer: None,
            notices: vec![notice.to_string()],
            error: None,
        }
    }

    fn completed(final_answer: String, notices: Vec<String>) -> Self {
        Self {
            status: SendStatus::Completed,
            final_answer: Some(final_answer),
            notices,
            error: None,
        }
    }

    fn error(err: &SyncError) -> Self {
        Self {
            status: SendStatus::Error,
            final_answer: None,
            notices: Vec::new(),
            error: Some(SendError {
                kind: err.kind(),
                message: err.to_string(),
            }),
        }
    }
}

pub struct Orchestrator {
    store: Arc<dyn ThreadStore>,
    chat: Arc<dyn ChatClient>,
    research: Arc<dyn ResearchClient>,
    retry: RetryPolicy,
    windower: HistoryWindower,
    settings: RwLock<Settings>,
    config_path: Option<PathBuf>,
    send_locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl Orchestrator {
    pub fn new(
        store: Arc<dyn ThreadStore>,
        chat: Arc<dyn ChatClient>,
        research: Arc<dyn ResearchClient>,
        settings: Settings,
    ) -> Self {
        Self {
            store,
            chat,
            research,
            retry: RetryPolicy::default(),
            windower: HistoryWindower::default(),
            settings: RwLock::new(settings),
            config_path: None,
            send_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_windower(mut self, windower: HistoryWindower) -> Self {
        self.windower = windower;
        self
    }

    /// Where `save_api_keys` persists settings. Without one, changes are kept
    /// in memory only.
    pub fn with_config_path(mut self, path: PathBuf) -> Self {
        self.config_path = Some(path);
        self
    }

    // ---- Settings surface ----

    pub fn api_key_status(&self) -> ApiKeyStatus {
        self.settings
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .status()
    }

    pub fn save_api_keys(
        &self,
        chat_key: String,
        research_key: String,
        selected_model: String,
    ) -> Result<(), SyncError> {
        let mut settings = self.settings.write().unwrap_or_else(|e| e.into_inner());
        settings.chat_api_key = chat_key;
        settings.research_api_key = research_key;
        settings.selected_model = selected_model;
        if let Some(ref path) = self.config_path {
            settings.save_to(path)?;
        }
        Ok(())
    }

    // ---- Thread surface ----

    pub fn list_threads(&self) -> Result<Vec<ThreadSummary>, SyncError> {
        self.store.list_active()
    }

    pub fn get_thread(&self, id: &str) -> Result<Option<Thread>, SyncError> {
        self.store.get(id)
    }

    pub fn create_thread(&self) -> Result<Thread, SyncError> {
        self.store.create()
    }

    pub fn delete_thread(&self, id: &str) -> Result<(), SyncError> {
        self.store.soft_delete(id)
    }

    // ---- Send pipeline ----

    pub async fn send_message(&self, thread_id: &str, text: &str) -> SendResult {
        self.send_message_with_events(thread_id, text, None).await
    }

    /// Full send pipeline, optionally reporting state transitions.
    pub async fn send_message_with_events(
        &self,
        thread_id: &str,
        text: &str,
        events: Option<UnboundedSender<SendEvent>>,
    ) -> SendResult {
        // One in-flight send per thread; sends to other threads proceed in
        // parallel.
        let lock = self.send_lock_for(thread_id);
        let result = {
            let _guard = lock.lock().await;
            self.send_inner(thread_id, text, events.as_ref()).await
        };
        if result.status == SendStatus::Error {
            emit(events.as_ref(), SendEvent::Error);
        }
        drop(lock);
        self.prune_send_lock(thread_id);
        result
    }

    async fn send_inner(
        &self,
        thread_id: &str,
        text: &str,
        events: Option<&UnboundedSender<SendEvent>>,
    ) -> SendResult {
        let thread = match self.store.get(thread_id) {
            Ok(Some(thread)) => thread,
            Ok(None) => {
                return SendResult::error(&SyncError::Unknown(format!(
                    "thread not found: {thread_id}"
                )))
            }
            Err(err) => return SendResult::error(&err),
        };

        // Credential check short-circuits before any backend call.
        if !self
            .settings
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .keys_configured()
        {
            return SendResult::idle(NOTICE_KEYS_MISSING);
        }

        emit(events, SendEvent::Classifying);
        let kind = Classifier::classify(self.chat.as_ref(), text).await;
        tracing::debug!(thread = thread_id, ?kind, "question classified");

        let window = self.windower.window(&thread.messages, text);

        emit(events, SendEvent::Generating);
        if kind == QuestionKind::TimeSensitive {
            emit(events, SendEvent::Researching);
        }

        // Fan out: the chat completion and the research side run concurrently
        // once both are known to be needed.
        let chat_fut = self.retry.run(|| self.chat.chat(&window));
        let research_fut = async {
            if kind != QuestionKind::TimeSensitive {
                return (None, None);
            }
            // Checklist extraction is best-effort context for the stored
            // message, not a gate on the research call.
            let check_items = match self.chat.complete(&prompts::check_items(text)).await {
                Ok(items) => Some(items),
                Err(err) => {
                    tracing::warn!(error = %err, "checklist extraction failed");
                    None
                }
            };
            let answer = self.retry.run(|| self.research.research(text)).await;
            (check_items, Some(answer))
        };
        let (chat_result, (check_items, research_result)) = tokio::join!(chat_fut, research_fut);

        let chat_answer = match chat_result {
            Ok(answer) => Some(answer),
            Err(err) => {
                tracing::error!(error = %err, "chat backend failed after retries");
                None
            }
        };
        let research_answer = match research_result {
            Some(Ok(answer)) => Some(answer),
            Some(Err(err)) => {
                tracing::error!(error = %err, "research backend failed after retries");
                None
            }
            None => None,
        };

        if chat_answer.is_some() && research_answer.is_some() {
            emit(events, SendEvent::Integrating);
        }
        let synthesis = match Synthesizer::merge(
            self.chat.as_ref(),
            kind,
            chat_answer,
            research_answer.clone(),
        )
        .await
        {
            Ok(synthesis) => synthesis,
            // Total failure: nothing is persisted.
            Err(err) => return SendResult::error(&err),
        };

        // Opportunistic title for the first exchange only.
        if thread.messages.is_empty() {
            if let Some(title) = TitleGenerator::generate(self.chat.as_ref(), text).await {
                if let Err(err) = self.store.update_title(thread_id, &title) {
                    tracing::warn!(error = %err, "failed to persist generated title");
                }
            }
        }

        let now = Utc::now();
        let user = StoredMessage::user(thread_id, text, now.to_rfc3339());
        // Nudge the assistant timestamp so strict ordering holds within the pair.
        let mut assistant = StoredMessage::assistant(
            thread_id,
            synthesis.final_answer.clone(),
            (now + ChronoDuration::milliseconds(10)).to_rfc3339(),
        );
        assistant.question_kind = Some(kind);
        assistant.check_items = check_items;
        assistant.research = research_answer.map(|answer| ResearchRecord {
            answer,
            sources: vec![RESEARCH_SOURCE.to_string()],
        });

        if let Err(err) = self.store.append_message_pair(thread_id, user, assistant) {
            tracing::error!(error = %err, "failed to persist message pair");
            return SendResult::error(&err);
        }

        emit(events, SendEvent::Completed);
        SendResult::completed(synthesis.final_answer, synthesis.notices)
    }

    fn send_lock_for(&self, thread_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.send_locks.lock().unwrap_or_else(|e| e.into_inner());
        locks
            .entry(thread_id.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }

    /// Drop the per-thread lock entry once no send holds or awaits it, so the
    /// map does not grow with every thread ever sent to.
    fn prune_send_lock(&self, thread_id: &str) {
        let mut locks = self.send_locks.lock().unwrap_or_else(|e| e.into_inner());
        if locks.get(thread_id).map(Arc::strong_count) == Some(1) {
            locks.remove(thread_id);
        }
    }

    #[cfg(test)]
    fn send_lock_entries(&self) -> usize {
        self.send_locks
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }
}

fn emit(events: Option<&UnboundedSender<SendEvent>>, event: SendEvent) {
    if let Some(tx) = events {
        let _ = tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ChatMessage;
    use crate::store::FileThreadStore;
    use tempfile::TempDir;

    struct StubChat;

    #[async_trait::async_trait]
    impl ChatClient for StubChat {
        async fn chat(&self, _messages: &[ChatMessage]) -> Result<String, SyncError> {
            Ok("A".to_string())
        }

        async fn complete(&self, _prompt: &str) -> Result<String, SyncError> {
            Ok("UNIVERSAL".to_string())
        }
    }

    struct StubResearch;

    #[async_trait::async_trait]
    impl ResearchClient for StubResearch {
        async fn research(&self, _question: &str) -> Result<String, SyncError> {
            Ok("R".to_string())
        }
    }

    #[tokio::test]
    async fn send_lock_entries_are_pruned_after_the_send() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(FileThreadStore::with_dir(dir.path().to_path_buf()).unwrap());
        let settings = Settings {
            chat_api_key: "sk-test".into(),
            research_api_key: "pplx-test".into(),
            ..Settings::default()
        };
        let orchestrator = Orchestrator::new(
            store,
            Arc::new(StubChat),
            Arc::new(StubResearch),
            settings,
        );
        let thread = orchestrator.create_thread().unwrap();

        orchestrator.send_message(&thread.id, "hello").await;
        assert_eq!(orchestrator.send_lock_entries(), 0);

        // Contended sends still leave nothing behind once both complete.
        let (first, second) = tokio::join!(
            orchestrator.send_message(&thread.id, "one"),
            orchestrator.send_message(&thread.id, "two"),
        );
        assert_eq!(first.status, SendStatus::Completed);
        assert_eq!(second.status, SendStatus::Completed);
        assert_eq!(orchestrator.send_lock_entries(), 0);
    }
}
