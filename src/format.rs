//! Output formatting for markdown and JSON.

use crate::store::GraphStore;
use crate::types::{Category, TaskRecord};
use crate::types::DATE_FORMAT;

/// Output format for `show`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    Json,
    #[default]
    #[value(alias = "md")]
    Markdown,
}

/// Render the whole board in `format`.
pub fn format_board(store: &GraphStore, format: OutputFormat) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Json => {
            let bytes = store.serialize().to_json_pretty()?;
            Ok(String::from_utf8_lossy(&bytes).into_owned())
        }
        OutputFormat::Markdown => Ok(format_board_markdown(store)),
    }
}

/// Format a single task as markdown, with the tasks it links to and from.
pub fn format_task_markdown(task: &TaskRecord, store: &GraphStore) -> String {
    let mut md = String::new();

    md.push_str(&format!("## Task: {}\n", task.title));
    md.push_str(&format!("- **id**: `{}`\n", task.id));
    md.push_str(&format!("- **category**: {}\n", task.category));
    md.push_str(&format!("- **due**: {}\n", task.due_date.format(DATE_FORMAT)));
    md.push_str(&format!("- **created**: {}\n", task.created_date.format(DATE_FORMAT)));
    md.push_str(&format!("- **color**: {}\n", task.color));
    md.push_str(&format!("- **pos**: ({}, {})\n", task.pos.x, task.pos.y));

    let (outgoing, incoming): (Vec<_>, Vec<_>) = store
        .connections_of(task.id.as_str())
        .partition(|c| c.from == task.id);
    if !outgoing.is_empty() {
        let targets: Vec<String> = outgoing.iter().map(|c| format!("`{}`", c.to)).collect();
        md.push_str(&format!("- **leads to**: {}\n", targets.join(", ")));
    }
    if !incoming.is_empty() {
        let sources: Vec<String> = incoming.iter().map(|c| format!("`{}`", c.from)).collect();
        md.push_str(&format!("- **follows**: {}\n", sources.join(", ")));
    }

    if !task.description.is_empty() {
        md.push_str("\n### Description\n");
        md.push_str(&task.description);
        md.push('\n');
    }

    md
}

/// Format every task grouped by category, then the connection list.
pub fn format_board_markdown(store: &GraphStore) -> String {
    let mut md = String::new();

    md.push_str(&format!("# Tasks ({})\n\n", store.task_count()));

    for category in Category::ALL {
        let tasks: Vec<&TaskRecord> = store
            .tasks()
            .iter()
            .filter(|t| t.category == category)
            .collect();
        if tasks.is_empty() {
            continue;
        }
        md.push_str(&format!("## {}\n\n", category));
        for task in tasks {
            md.push_str(&format_task_short(task));
        }
        md.push('\n');
    }

    if store.connection_count() > 0 {
        md.push_str(&format!("# Connections ({})\n\n", store.connection_count()));
        for connection in store.connections() {
            let title = |id: &str| {
                store
                    .task(id)
                    .map(|t| t.title.as_str())
                    .unwrap_or("?")
                    .to_string()
            };
            md.push_str(&format!(
                "- {} -> {} `{}`\n",
                title(connection.from.as_str()),
                title(connection.to.as_str()),
                connection.id
            ));
        }
    }

    md
}

fn format_task_short(task: &TaskRecord) -> String {
    let short: String = task.id.as_str().chars().take(8).collect();
    format!(
        "- {} `{}` due {}\n",
        task.title,
        short,
        task.due_date.format(DATE_FORMAT)
    )
}
