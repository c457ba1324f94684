use anyhow::Result;
use clap::{Parser, Subcommand};

use syncai_cli::commands;

#[derive(Parser)]
#[command(name = "syncai")]
#[command(about = "SyncAI - dual-backend question answering")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Print results as JSON instead of human-readable text
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Show or update API key configuration
    Keys {
        #[command(subcommand)]
        action: KeysAction,
    },
    /// List active conversation threads
    List,
    /// Create a new conversation thread
    New,
    /// Show a thread and its messages
    Show { thread_id: String },
    /// Soft-delete a thread
    Delete { thread_id: String },
    /// Send a message and print the synthesized answer
    Send { thread_id: String, text: String },
}

#[derive(Subcommand)]
enum KeysAction {
    /// Report which keys are configured (never prints key material)
    Status,
    /// Store API keys and the selected generation model
    Set {
        #[arg(long)]
        chat_key: String,
        #[arg(long)]
        research_key: String,
        #[arg(long)]
        model: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let orchestrator = commands::build_orchestrator()?;

    match cli.command {
        Command::Keys { action } => match action {
            KeysAction::Status => commands::keys_status(&orchestrator, cli.json),
            KeysAction::Set {
                chat_key,
                research_key,
                model,
            } => commands::keys_set(&orchestrator, chat_key, research_key, model),
        },
        Command::List => commands::list_threads(&orchestrator, cli.json),
        Command::New => commands::create_thread(&orchestrator, cli.json),
        Command::Show { thread_id } => commands::show_thread(&orchestrator, &thread_id, cli.json),
        Command::Delete { thread_id } => commands::delete_thread(&orchestrator, &thread_id),
        Command::Send { thread_id, text } => {
            commands::send_message(&orchestrator, &thread_id, &text, cli.json).await
        }
    }
}
