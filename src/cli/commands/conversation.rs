use anyhow::Result;
use clap::{Args, Subcommand};
use console::style;

use crate::application::Orchestrator;
use crate::cli::output::{conversation_table, message_line};
use crate::domain::models::ConversationId;
use crate::domain::ports::ListFilter;

#[derive(Subcommand)]
pub enum ConversationCommand {
    /// Create a new conversation
    New,
    /// List conversations
    List(ListArgs),
    /// Show one conversation's messages and artifact state
    Show(IdArg),
    /// Rename a conversation
    Rename(RenameArgs),
    /// Move a conversation to the trash
    Trash(IdArg),
    /// Move every active conversation to the trash
    TrashAll,
    /// Restore a trashed conversation
    Restore(IdArg),
    /// Restore every trashed conversation
    RestoreAll,
    /// Permanently delete a trashed conversation
    Purge(IdArg),
    /// Permanently delete every trashed conversation
    PurgeAll,
}

#[derive(Args)]
pub struct ListArgs {
    /// Show the trash instead of active conversations
    #[arg(long)]
    pub trashed: bool,
}

#[derive(Args)]
pub struct IdArg {
    /// Conversation id
    pub id: String,
}

#[derive(Args)]
pub struct RenameArgs {
    /// Conversation id
    pub id: String,
    /// New title
    pub title: String,
}

/// Handle the conversation subcommands.
pub async fn execute(
    orchestrator: &Orchestrator,
    command: ConversationCommand,
    json: bool,
) -> Result<()> {
    match command {
        ConversationCommand::New => {
            let created = orchestrator.new_conversation().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&created)?);
            } else {
                println!("Created conversation {}", created.id);
            }
        }
        ConversationCommand::List(args) => {
            let filter = if args.trashed {
                ListFilter::Trashed
            } else {
                ListFilter::Active
            };
            let conversations = orchestrator.load_conversations(filter).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&conversations)?);
            } else if conversations.is_empty() {
                println!("No conversations.");
            } else {
                println!("{}", conversation_table(&conversations));
            }
        }
        ConversationCommand::Show(args) => {
            let conversation = orchestrator
                .select(&ConversationId::from(args.id.as_str()))
                .await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&conversation)?);
            } else {
                println!("{} {}", style("Title:").bold(), conversation.title);
                for message in &conversation.messages {
                    println!("{}", message_line(message));
                }
                if conversation.has_artifact() {
                    println!("{}", style("Generated test data is attached.").green());
                }
            }
        }
        ConversationCommand::Rename(args) => {
            let id = ConversationId::from(args.id.as_str());
            orchestrator.select(&id).await?;
            orchestrator.rename(&id, &args.title).await?;
            emit_ack(json, "renamed", &[id]);
        }
        ConversationCommand::Trash(args) => {
            let id = ConversationId::from(args.id.as_str());
            orchestrator.select(&id).await?;
            orchestrator.soft_delete(&id).await?;
            emit_ack(json, "trashed", &[id]);
        }
        ConversationCommand::TrashAll => {
            orchestrator.load_conversations(ListFilter::Active).await?;
            let ids = orchestrator.trash_all().await?;
            emit_ack(json, "trashed", &ids);
        }
        ConversationCommand::Restore(args) => {
            let id = ConversationId::from(args.id.as_str());
            orchestrator.select(&id).await?;
            orchestrator.restore(&id).await?;
            emit_ack(json, "restored", &[id]);
        }
        ConversationCommand::RestoreAll => {
            orchestrator.load_conversations(ListFilter::Trashed).await?;
            let ids = orchestrator.restore_all().await?;
            emit_ack(json, "restored", &ids);
        }
        ConversationCommand::Purge(args) => {
            let id = ConversationId::from(args.id.as_str());
            orchestrator.select(&id).await?;
            orchestrator.purge(&id).await?;
            emit_ack(json, "purged", &[id]);
        }
        ConversationCommand::PurgeAll => {
            orchestrator.load_conversations(ListFilter::Trashed).await?;
            let ids = orchestrator.purge_all().await?;
            emit_ack(json, "purged", &ids);
        }
    }
    Ok(())
}

fn emit_ack(json: bool, action: &str, ids: &[ConversationId]) {
    if json {
        println!("{}", serde_json::json!({ action: ids }));
    } else if ids.len() == 1 {
        println!("Conversation {} {action}.", ids[0]);
    } else {
        println!("{} conversation(s) {action}.", ids.len());
    }
}
