mod file;

pub use file::FileThreadStore;

use crate::classify::QuestionKind;
use crate::error::SyncError;
use serde::{Deserialize, Serialize};

pub const DEFAULT_THREAD_TITLE: &str = "New conversation";

/// Thread metadata shown in listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadSummary {
    pub id: String,
    pub title: String,
    pub updated_at: String,
}

/// A conversation thread with its full ordered message log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thread {
    pub id: String,
    pub title: String,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default)]
    pub deleted_at: Option<String>,
    #[serde(default)]
    pub messages: Vec<StoredMessage>,
}

impl Thread {
    pub fn summary(&self) -> ThreadSummary {
        ThreadSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            updated_at: self.updated_at.clone(),
        }
    }
}

/// One immutable persisted message. The research-path extras are only ever
/// set on assistant messages produced for time-sensitive questions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredMessage {
    pub id: String,
    pub thread_id: String,
    pub role: String,
    pub content: String,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question_kind: Option<QuestionKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_items: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub research: Option<ResearchRecord>,
}

impl StoredMessage {
    pub fn user(thread_id: &str, content: impl Into<String>, created_at: String) -> Self {
        Self {
            id: format!("u-{}", uuid::Uuid::new_v4()),
            thread_id: thread_id.to_string(),
            role: "user".to_string(),
            content: content.into(),
            created_at,
            question_kind: None,
            check_items: None,
            research: None,
        }
    }

    pub fn assistant(thread_id: &str, content: impl Into<String>, created_at: String) -> Self {
        Self {
            id: format!("a-{}", uuid::Uuid::new_v4()),
            thread_id: thread_id.to_string(),
            role: "assistant".to_string(),
            content: content.into(),
            created_at,
            question_kind: None,
            check_items: None,
            research: None,
        }
    }
}

/// Research output kept alongside the assistant message for provenance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchRecord {
    pub answer: String,
    pub sources: Vec<String>,
}

/// Persistence contract consumed by the orchestrator. Implementations own
/// thread data exclusively; the orchestrator only goes through this trait.
pub trait ThreadStore: Send + Sync {
    /// Create a thread with the placeholder title.
    fn create(&self) -> Result<Thread, SyncError>;

    /// Fetch a thread by id. Soft-deleted threads are treated as absent.
    fn get(&self, id: &str) -> Result<Option<Thread>, SyncError>;

    /// Active threads, most recently updated first.
    fn list_active(&self) -> Result<Vec<ThreadSummary>, SyncError>;

    /// Hide a thread from listings without removing its data.
    fn soft_delete(&self, id: &str) -> Result<(), SyncError>;

    /// Append a user/assistant pair atomically: both become visible together
    /// or neither does. Bumps the thread's `updated_at`.
    fn append_message_pair(
        &self,
        thread_id: &str,
        user: StoredMessage,
        assistant: StoredMessage,
    ) -> Result<(), SyncError>;

    fn update_title(&self, thread_id: &str, title: &str) -> Result<(), SyncError>;

    fn touch_updated_at(&self, thread_id: &str) -> Result<(), SyncError>;
}
