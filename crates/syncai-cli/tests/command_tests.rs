use std::sync::Arc;

use syncai_cli::commands;
use syncai_core::error::SyncError;
use syncai_core::llm::{ChatClient, ChatMessage, ResearchClient};
use syncai_core::{FileThreadStore, Orchestrator, Settings};
use tempfile::TempDir;

struct StubChat;

#[async_trait::async_trait]
impl ChatClient for StubChat {
    async fn chat(&self, _messages: &[ChatMessage]) -> Result<String, SyncError> {
        Ok("stub answer".to_string())
    }

    async fn complete(&self, _prompt: &str) -> Result<String, SyncError> {
        Ok("UNIVERSAL".to_string())
    }
}

struct StubResearch;

#[async_trait::async_trait]
impl ResearchClient for StubResearch {
    async fn research(&self, _question: &str) -> Result<String, SyncError> {
        Ok("stub research".to_string())
    }
}

fn orchestrator(dir: &TempDir, settings: Settings) -> Orchestrator {
    let store = Arc::new(FileThreadStore::with_dir(dir.path().to_path_buf()).unwrap());
    Orchestrator::new(store, Arc::new(StubChat), Arc::new(StubResearch), settings)
}

#[test]
fn list_create_delete_flow() {
    let dir = TempDir::new().unwrap();
    let orch = orchestrator(&dir, Settings::default());

    assert!(commands::list_threads(&orch, false).is_ok());
    assert!(commands::create_thread(&orch, false).is_ok());

    let threads = orch.list_threads().unwrap();
    assert_eq!(threads.len(), 1);

    assert!(commands::show_thread(&orch, &threads[0].id, true).is_ok());
    assert!(commands::delete_thread(&orch, &threads[0].id).is_ok());
    assert!(orch.list_threads().unwrap().is_empty());
}

#[test]
fn show_missing_thread_fails() {
    let dir = TempDir::new().unwrap();
    let orch = orchestrator(&dir, Settings::default());
    assert!(commands::show_thread(&orch, "thread-nope", false).is_err());
}

#[test]
fn keys_status_never_errors() {
    let dir = TempDir::new().unwrap();
    let orch = orchestrator(&dir, Settings::default());
    assert!(commands::keys_status(&orch, true).is_ok());
}

#[tokio::test]
async fn send_with_configured_keys_prints_answer() {
    let dir = TempDir::new().unwrap();
    let settings = Settings {
        chat_api_key: "sk".into(),
        research_api_key: "pplx".into(),
        ..Settings::default()
    };
    let orch = orchestrator(&dir, settings);
    let thread = orch.create_thread().unwrap();

    assert!(commands::send_message(&orch, &thread.id, "hello", false)
        .await
        .is_ok());
}

#[tokio::test]
async fn send_to_missing_thread_fails() {
    let dir = TempDir::new().unwrap();
    let settings = Settings {
        chat_api_key: "sk".into(),
        research_api_key: "pplx".into(),
        ..Settings::default()
    };
    let orch = orchestrator(&dir, settings);
    assert!(commands::send_message(&orch, "thread-nope", "hello", false)
        .await
        .is_err());
}
