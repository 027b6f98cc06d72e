use anyhow::Result;
use clap::Args;

use crate::application::Orchestrator;
use crate::cli::output::task_table;
use crate::domain::models::{ConversationId, TaskId};

#[derive(Args)]
pub struct TasksArgs {
    /// Conversation whose task queue to show
    #[arg(long, value_name = "ID")]
    pub conversation: String,
}

#[derive(Args)]
pub struct CancelArgs {
    /// Task to cancel
    pub task: String,

    /// Conversation the task belongs to
    #[arg(long, value_name = "ID")]
    pub conversation: String,
}

/// Handle the tasks command.
pub async fn execute(orchestrator: &Orchestrator, args: TasksArgs, json: bool) -> Result<()> {
    let id = ConversationId::from(args.conversation.as_str());
    let snapshot = orchestrator.task_snapshot(&id).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    if snapshot.is_empty() {
        println!("No queued generation work.");
        return Ok(());
    }
    println!("{}", task_table(&snapshot));
    println!(
        "\n{} child task(s), {}",
        snapshot.total_child_count(),
        if snapshot.all_terminal() {
            "all finished"
        } else {
            "still running"
        }
    );
    Ok(())
}

/// Handle the cancel command.
pub async fn execute_cancel(
    orchestrator: &Orchestrator,
    args: CancelArgs,
    json: bool,
) -> Result<()> {
    let conversation = ConversationId::from(args.conversation.as_str());
    let task = TaskId::from(args.task.as_str());
    orchestrator.select(&conversation).await?;
    orchestrator.cancel_task(&conversation, &task).await?;

    if json {
        println!("{}", serde_json::json!({ "cancelled": task }));
    } else {
        println!("Cancellation requested for task {task}. The worker may still finish it.");
    }
    Ok(())
}
