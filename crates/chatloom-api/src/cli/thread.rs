//! Thread CLI commands: list, ask, history, delete.

use anyhow::{Context, Result};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use dialoguer::Confirm;
use uuid::Uuid;

use chatloom_types::chat::{MessageRole, ThreadSummary};

use crate::state::AppState;

/// Sidebar label: the first message, cut to `max` characters.
fn preview(summary: &ThreadSummary, max: usize) -> String {
    let Some(text) = summary.first_message.as_deref() else {
        return "(empty)".to_string();
    };
    let line = text.lines().next().unwrap_or_default();
    if line.chars().count() > max {
        let cut: String = line.chars().take(max.saturating_sub(3)).collect();
        format!("{cut}...")
    } else {
        line.to_string()
    }
}

/// List a user's threads, most recently updated first.
///
/// # Examples
///
/// ```bash
/// chatloom threads
/// chatloom threads --user alice --json
/// ```
pub async fn list_threads(state: &AppState, user: Option<String>, json: bool) -> Result<()> {
    let user_id = state.user_or_default(user);
    let sidebar = state.sessions.list_for_sidebar(&user_id).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&sidebar)?);
        return Ok(());
    }

    if sidebar.is_empty() {
        println!();
        println!(
            "  {} No threads for '{}'. Start one with: {}",
            style("i").blue().bold(),
            style(&user_id).cyan(),
            style("chatloom ask \"Hello\"").yellow()
        );
        println!();
        return Ok(());
    }

    let mut entries: Vec<_> = sidebar.iter().collect();
    entries.sort_by(|a, b| b.1.updated.cmp(&a.1.updated));

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Thread").fg(Color::White),
        Cell::new("First message").fg(Color::White),
        Cell::new("Mode").fg(Color::White),
        Cell::new("Updated").fg(Color::White),
    ]);

    for (thread_id, summary) in &entries {
        table.add_row(vec![
            Cell::new(thread_id.to_string()).fg(Color::DarkGrey),
            Cell::new(preview(summary, 40)).fg(Color::Cyan),
            Cell::new(summary.mode.label()).fg(Color::White),
            Cell::new(summary.updated.format("%Y-%m-%d %H:%M").to_string()).fg(Color::DarkGrey),
        ]);
    }

    println!();
    println!("  Threads for '{}'", style(&user_id).cyan().bold());
    println!();
    println!("{table}");
    println!();
    println!(
        "  {} thread{}",
        style(entries.len()).bold(),
        if entries.len() == 1 { "" } else { "s" }
    );
    println!();

    Ok(())
}

/// Send one message. Without `thread` a new thread is started in `mode`.
pub async fn ask(
    state: &AppState,
    message: &str,
    thread: Option<Uuid>,
    mode: &str,
    user: Option<String>,
    json: bool,
) -> Result<()> {
    let user_id = state.user_or_default(user);

    let (thread_id, reply) = match thread {
        Some(thread_id) => {
            let details = state
                .sessions
                .thread_details(&user_id, &thread_id)
                .await
                .with_context(|| format!("Thread '{thread_id}' not found for '{user_id}'"))?;
            let reply = state
                .sessions
                .turn(&user_id, &thread_id, message, details.chat_mode.tag(), false)
                .await?;
            (thread_id, reply)
        }
        None => state.sessions.start_thread(&user_id, message, mode).await?,
    };

    if json {
        let out = serde_json::json!({
            "thread_id": thread_id,
            "reply": reply,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!();
    println!("  {}", reply);
    println!();
    if thread.is_none() {
        println!(
            "  {} Continue with: {}",
            style("i").blue().bold(),
            style(format!("chatloom ask --thread {thread_id} \"...\"")).yellow()
        );
        println!();
    }

    Ok(())
}

/// Print a thread's messages with its mode as a header.
pub async fn history(
    state: &AppState,
    thread_id: Uuid,
    user: Option<String>,
    json: bool,
) -> Result<()> {
    let user_id = state.user_or_default(user);
    let messages = state.sessions.history(&thread_id).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&messages)?);
        return Ok(());
    }

    println!();
    match state.sessions.thread_details(&user_id, &thread_id).await {
        Some(details) => println!(
            "  {} {}  {}",
            style("Mode:").dim(),
            style(details.chat_mode.label()).cyan().bold(),
            style(format!("started {}", details.created_date.format("%Y-%m-%d %H:%M"))).dim()
        ),
        None if messages.is_empty() => {
            println!("  {} No messages in thread '{thread_id}'.", style("i").blue().bold());
            println!();
            return Ok(());
        }
        None => {}
    }
    println!();

    for message in &messages {
        let who = match message.role {
            MessageRole::User => style("you").green().bold(),
            MessageRole::Assistant => style("assistant").cyan().bold(),
            MessageRole::System => style("system").dim(),
        };
        println!("  {who}");
        for line in message.content.lines() {
            println!("    {line}");
        }
        println!();
    }

    Ok(())
}

/// Delete one thread, after confirmation unless `force` is set.
pub async fn delete_thread(
    state: &AppState,
    thread_id: Uuid,
    user: Option<String>,
    force: bool,
    json: bool,
) -> Result<()> {
    let user_id = state.user_or_default(user);
    let details = state
        .sessions
        .thread_details(&user_id, &thread_id)
        .await
        .with_context(|| format!("Thread '{thread_id}' not found for '{user_id}'"))?;

    if !force && !json {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Delete {} thread '{}'?",
                details.chat_mode.label(),
                style(thread_id).red().bold()
            ))
            .default(false)
            .interact()?;

        if !confirmed {
            println!("  Cancelled.");
            return Ok(());
        }
    }

    let success = state.sessions.delete_thread(&user_id, &thread_id).await?;
    print_delete_result(success, 1, json)
}

/// Delete every thread the user owns, after confirmation unless `force` is set.
pub async fn delete_all(
    state: &AppState,
    user: Option<String>,
    force: bool,
    json: bool,
) -> Result<()> {
    let user_id = state.user_or_default(user);
    let count = state.sessions.metadata().list_threads(&user_id).await.len();

    if !force && !json {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Delete all {} threads for '{}'? This cannot be undone.",
                style(count).red().bold(),
                style(&user_id).cyan()
            ))
            .default(false)
            .interact()?;

        if !confirmed {
            println!("  Cancelled.");
            return Ok(());
        }
    }

    let success = state.sessions.delete_all(&user_id).await;
    print_delete_result(success, count, json)
}

fn print_delete_result(success: bool, count: usize, json: bool) -> Result<()> {
    if json {
        let out = serde_json::json!({ "success": success, "threads": count });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    if success {
        println!(
            "  {} Deleted {} thread{}.",
            style("✓").green().bold(),
            count,
            if count == 1 { "" } else { "s" }
        );
    } else {
        println!(
            "  {} Deletion was incomplete; run with -v for details.",
            style("!").yellow().bold()
        );
    }
    Ok(())
}
