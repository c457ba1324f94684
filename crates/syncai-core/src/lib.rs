pub mod classify;
pub mod config;
pub mod context;
pub mod error;
pub mod llm;
pub mod orchestrator;
pub mod prompts;
pub mod retry;
pub mod store;
pub mod synthesize;
pub mod title;

// Re-export key types
pub use classify::{Classifier, QuestionKind};
pub use config::{ApiKeyStatus, Settings};
pub use context::HistoryWindower;
pub use error::{ErrorKind, SyncError};
pub use llm::{ChatClient, ChatMessage, OpenAiChat, PerplexityResearch, ResearchClient, Role};
pub use orchestrator::{Orchestrator, SendEvent, SendResult, SendStatus};
pub use retry::RetryPolicy;
pub use store::{FileThreadStore, StoredMessage, Thread, ThreadStore, ThreadSummary};
pub use synthesize::{Synthesis, Synthesizer};
pub use title::TitleGenerator;
