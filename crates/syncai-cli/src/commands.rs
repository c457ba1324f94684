use std::sync::Arc;

use anyhow::{Context, Result};
use syncai_core::orchestrator::SendEvent;
use syncai_core::{
    FileThreadStore, OpenAiChat, Orchestrator, PerplexityResearch, SendStatus, Settings,
};

/// Wire the orchestrator from persisted settings. Clients are built with
/// whatever keys are on disk; the orchestrator refuses to call out when they
/// are missing.
pub fn build_orchestrator() -> Result<Orchestrator> {
    let settings = Settings::load();
    let store = Arc::new(FileThreadStore::new().context("opening thread store")?);
    let chat = Arc::new(OpenAiChat::new(
        settings.chat_api_key.clone(),
        settings.selected_model.clone(),
    ));
    let research = Arc::new(PerplexityResearch::new(settings.research_api_key.clone()));
    Ok(Orchestrator::new(store, chat, research, settings)
        .with_config_path(Settings::config_path()))
}

pub fn keys_status(orchestrator: &Orchestrator, json: bool) -> Result<()> {
    let status = orchestrator.api_key_status();
    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("chat key:     {}", configured_label(status.chat_configured));
        println!("research key: {}", configured_label(status.research_configured));
        println!("model:        {}", status.selected_model);
    }
    Ok(())
}

pub fn keys_set(
    orchestrator: &Orchestrator,
    chat_key: String,
    research_key: String,
    model: Option<String>,
) -> Result<()> {
    let model = model.unwrap_or_else(|| orchestrator.api_key_status().selected_model);
    orchestrator.save_api_keys(chat_key, research_key, model)?;
    println!("API keys saved");
    Ok(())
}

pub fn list_threads(orchestrator: &Orchestrator, json: bool) -> Result<()> {
    let threads = orchestrator.list_threads()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&threads)?);
    } else if threads.is_empty() {
        println!("no threads");
    } else {
        for t in threads {
            println!("{}  {}  ({})", t.id, t.title, t.updated_at);
        }
    }
    Ok(())
}

pub fn create_thread(orchestrator: &Orchestrator, json: bool) -> Result<()> {
    let thread = orchestrator.create_thread()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&thread.summary())?);
    } else {
        println!("{}", thread.id);
    }
    Ok(())
}

pub fn show_thread(orchestrator: &Orchestrator, thread_id: &str, json: bool) -> Result<()> {
    match orchestrator.get_thread(thread_id)? {
        Some(thread) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&thread)?);
            } else {
                println!("{} ({} messages)", thread.title, thread.messages.len());
                for m in &thread.messages {
                    println!("[{}] {}", m.role, m.content);
                }
            }
            Ok(())
        }
        None => {
            anyhow::bail!("thread not found: {thread_id}")
        }
    }
}

pub fn delete_thread(orchestrator: &Orchestrator, thread_id: &str) -> Result<()> {
    orchestrator.delete_thread(thread_id)?;
    println!("deleted {thread_id}");
    Ok(())
}

pub async fn send_message(
    orchestrator: &Orchestrator,
    thread_id: &str,
    text: &str,
    json: bool,
) -> Result<()> {
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let progress = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            if let Some(label) = progress_label(event) {
                eprintln!("{label}");
            }
        }
    });

    let result = orchestrator
        .send_message_with_events(thread_id, text, Some(tx))
        .await;
    let _ = progress.await;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    for notice in &result.notices {
        eprintln!("notice: {notice}");
    }
    match result.status {
        SendStatus::Completed => {
            println!("{}", result.final_answer.unwrap_or_default());
            Ok(())
        }
        SendStatus::Idle => Ok(()),
        SendStatus::Error => match result.error {
            Some(error) => anyhow::bail!("{}", error.message),
            None => anyhow::bail!("send failed"),
        },
    }
}

fn progress_label(event: SendEvent) -> Option<&'static str> {
    match event {
        SendEvent::Classifying => Some("classifying question..."),
        SendEvent::Generating => Some("generating answer..."),
        SendEvent::Researching => Some("researching current information..."),
        SendEvent::Integrating => Some("integrating answers..."),
        SendEvent::Completed | SendEvent::Error => None,
    }
}

fn configured_label(configured: bool) -> &'static str {
    if configured {
        "configured"
    } else {
        "not set"
    }
}
