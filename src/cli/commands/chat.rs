use anyhow::{Context, Result};
use clap::Args;
use console::style;
use std::path::PathBuf;

use crate::application::{Orchestrator, SubmitOutcome};
use crate::cli::output::{message_line, polling_spinner};
use crate::domain::models::ConversationId;
use crate::services::{OrchestratorEvent, StopReason};

#[derive(Args)]
pub struct ChatArgs {
    /// The message to send
    pub text: String,

    /// Conversation to send into; a new one is created when omitted
    #[arg(long, value_name = "ID")]
    pub conversation: Option<String>,
}

#[derive(Args)]
pub struct UploadArgs {
    /// File to upload
    pub file: PathBuf,

    /// Conversation to upload into
    #[arg(long, value_name = "ID")]
    pub conversation: String,
}

/// Handle the chat command: send, then follow the generation batch until
/// the poll loop stops.
pub async fn execute(orchestrator: &Orchestrator, args: ChatArgs, json: bool) -> Result<()> {
    select_or_create(orchestrator, args.conversation.as_deref()).await?;

    let mut events = orchestrator.subscribe();
    let outcome = orchestrator.send_message(&args.text).await?;

    match outcome {
        SubmitOutcome::Replied { reply } => {
            if json {
                println!("{}", serde_json::json!({ "reply": reply }));
            } else {
                println!("{} {}", style(" ai").bold().magenta(), reply);
            }
        }
        SubmitOutcome::Processing { task_id } => {
            let spinner = (!json).then(|| polling_spinner("generating..."));
            let reason = loop {
                match events.recv().await {
                    Ok(envelope) => match envelope.event {
                        OrchestratorEvent::TaskCompleted { job_name, .. } => {
                            if let Some(spinner) = &spinner {
                                spinner.println(format!(
                                    "{} {job_name}",
                                    style("done:").green()
                                ));
                            }
                        }
                        OrchestratorEvent::TasksAdded { total_children, .. } => {
                            if let Some(spinner) = &spinner {
                                spinner.set_message(format!(
                                    "generating... ({total_children} jobs)"
                                ));
                            }
                        }
                        OrchestratorEvent::PollerStopped { reason, .. } => break reason,
                        _ => {}
                    },
                    Err(_) => break StopReason::Error,
                }
            };
            if let Some(spinner) = spinner {
                spinner.finish_and_clear();
            }

            let conversation = orchestrator.current_conversation().await;
            if json {
                println!(
                    "{}",
                    serde_json::json!({
                        "task_id": task_id,
                        "stop_reason": reason,
                        "conversation": conversation,
                    })
                );
            } else {
                if reason != StopReason::Complete {
                    println!(
                        "{} generation stopped: {reason}",
                        style("warning:").yellow()
                    );
                }
                if let Some(conversation) = conversation {
                    for message in conversation.messages.iter().rev().take(2).rev() {
                        println!("{}", message_line(message));
                    }
                    if conversation.has_artifact() {
                        println!("{}", style("Generated test data is ready.").green());
                    }
                }
            }
        }
    }
    Ok(())
}

/// Handle the upload command.
pub async fn execute_upload(
    orchestrator: &Orchestrator,
    args: UploadArgs,
    json: bool,
) -> Result<()> {
    let bytes = tokio::fs::read(&args.file)
        .await
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    let filename = args
        .file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());

    orchestrator
        .select(&ConversationId::from(args.conversation.as_str()))
        .await?;
    let outcome = orchestrator.upload_artifact(&filename, bytes).await?;

    if json {
        match &outcome {
            SubmitOutcome::Replied { reply } => {
                println!("{}", serde_json::json!({ "reply": reply }));
            }
            SubmitOutcome::Processing { task_id } => {
                println!("{}", serde_json::json!({ "task_id": task_id }));
            }
        }
    } else {
        match outcome {
            SubmitOutcome::Replied { reply } => println!("{reply}"),
            SubmitOutcome::Processing { task_id } => println!(
                "Upload accepted; generation queued as task {task_id}. Follow it with `colloquy tasks`."
            ),
        }
    }
    Ok(())
}

async fn select_or_create(
    orchestrator: &Orchestrator,
    conversation: Option<&str>,
) -> Result<()> {
    match conversation {
        Some(id) => {
            orchestrator
                .select(&ConversationId::from(id))
                .await
                .context("Failed to load conversation")?;
        }
        None => {
            let created = orchestrator
                .new_conversation()
                .await
                .context("Failed to create conversation")?;
            tracing::info!(conversation = %created.id, "created new conversation");
        }
    }
    Ok(())
}
