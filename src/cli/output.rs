//! Terminal formatting helpers.

use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use crate::domain::models::{Conversation, Message, Sender, TaskQueueSnapshot, TaskStatus};

/// Spinner shown while a poll loop is draining a generation batch.
pub fn polling_spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner
}

/// Table of conversations for `conversation list`.
pub fn conversation_table(conversations: &[Conversation]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["ID", "Title", "Messages", "Artifact", "State"]);
    for conversation in conversations {
        table.add_row(vec![
            Cell::new(conversation.id.as_str()),
            Cell::new(&conversation.title),
            Cell::new(conversation.message_count()),
            Cell::new(if conversation.has_artifact() { "yes" } else { "-" }),
            Cell::new(if conversation.deleted { "trashed" } else { "active" }),
        ]);
    }
    table
}

/// Table of the task forest for `tasks`.
pub fn task_table(snapshot: &TaskQueueSnapshot) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Parent", "Task", "Job", "Status", "Error"]);
    for parent in &snapshot.parents {
        for child in &parent.children {
            table.add_row(vec![
                Cell::new(parent.parent_id.as_str()),
                Cell::new(child.id.as_str()),
                Cell::new(&child.job_name),
                Cell::new(status_label(child.status)),
                Cell::new(child.error.as_deref().unwrap_or("-")),
            ]);
        }
    }
    table
}

fn status_label(status: TaskStatus) -> String {
    match status {
        TaskStatus::Done => style(status.as_str()).green().to_string(),
        TaskStatus::Failed => style(status.as_str()).red().to_string(),
        TaskStatus::Cancelled => style(status.as_str()).dim().to_string(),
        TaskStatus::Queued | TaskStatus::Processing => {
            style(status.as_str()).yellow().to_string()
        }
    }
}

/// Render one chat message line.
pub fn message_line(message: &Message) -> String {
    let who = match message.sender {
        Sender::User => style("you").bold().cyan(),
        Sender::Ai => style(" ai").bold().magenta(),
    };
    format!("{who} {} {}", style("|").dim(), message.text)
}
