//! Command-line interface.

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};
use console::style;
use std::sync::Arc;

use crate::application::Orchestrator;
use crate::domain::errors::OrchestratorError;
use crate::domain::models::Config;
use crate::infrastructure::{ApiClient, ConfigLoader};

/// Conversation orchestration client for the assessment backend.
#[derive(Parser)]
#[command(name = "colloquy", version, about)]
pub struct Cli {
    /// Emit machine-readable JSON instead of formatted output
    #[arg(long, global = true)]
    pub json: bool,

    /// Load configuration from a specific file instead of .colloquy/
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check the token balance and admission level
    Balance(commands::balance::BalanceArgs),
    /// Send a message and wait for the generation batch to finish
    Chat(commands::chat::ChatArgs),
    /// Upload a source artifact into a conversation
    Upload(commands::chat::UploadArgs),
    /// Show the queued generation work for a conversation
    Tasks(commands::tasks::TasksArgs),
    /// Request cancellation of one generation task
    Cancel(commands::tasks::CancelArgs),
    /// Manage conversations (create, trash, restore, purge)
    #[command(subcommand)]
    Conversation(commands::conversation::ConversationCommand),
}

/// Load config and wire the orchestrator against the HTTP backend.
pub fn build_orchestrator(config_path: Option<&std::path::Path>) -> anyhow::Result<Orchestrator> {
    let config: Config = match config_path {
        Some(path) => ConfigLoader::load_from_file(path)?,
        None => ConfigLoader::load()?,
    };
    let client = Arc::new(ApiClient::new(&config.api)?);
    Ok(Orchestrator::new(
        client.clone(),
        client.clone(),
        client,
        &config,
    ))
}

/// Present a top-level error and exit non-zero.
pub fn handle_error(err: anyhow::Error, json: bool) -> ! {
    let exit_code = match err.downcast_ref::<OrchestratorError>() {
        Some(OrchestratorError::GateBlocked { .. }) => 2,
        _ => 1,
    };
    if json {
        let payload = serde_json::json!({ "error": format!("{err:#}") });
        eprintln!("{payload}");
    } else {
        eprintln!("{} {err:#}", style("error:").red().bold());
        if exit_code == 2 {
            eprintln!(
                "{}",
                style("Your token balance is exhausted. Top up to continue generating.").yellow()
            );
        }
    }
    std::process::exit(exit_code);
}
