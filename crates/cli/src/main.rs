//! Command-line consumer for the TaskHub client
//!
//! One-shot commands over the core data-access layer. The service address
//! comes from `TH_API_URL`; the session credential is seeded from
//! `TH_TOKEN` and printed by `login` for reuse:
//!
//! ```text
//! th login dev dev-pass
//! TH_TOKEN=<token> th add "Ship it" "wire everything up" 2024-06-01
//! TH_TOKEN=<token> th stats
//! ```

use std::sync::Arc;

use anyhow::{bail, Context};
use chrono::NaiveDate;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use th_core::auth::AuthFlow;
use th_core::config::ClientConfig;
use th_core::http::ClientFactory;
use th_core::session::SessionStore;
use th_core::task::{
    HttpTaskStore, Task, TaskDraft, TaskPatch, TaskRepository, TaskState, TaskStatus,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "th_cli=info,th_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ClientConfig::from_env();
    let session = Arc::new(SessionStore::new());
    if let Ok(token) = std::env::var("TH_TOKEN") {
        let token = token.trim().to_string();
        if !token.is_empty() {
            session.set(token).await;
        }
    }
    let factory = ClientFactory::new(&config, Arc::clone(&session));
    let auth = AuthFlow::new(factory.clone(), Arc::clone(&session));
    let store = Arc::new(HttpTaskStore::new(factory, Arc::clone(&session)));
    let state = TaskState::new(store.clone() as Arc<dyn TaskRepository>);

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = args.first().map(String::as_str).unwrap_or("help");

    match command {
        "register" => {
            let (username, password) = credentials(&args)?;
            auth.register(username, password).await?;
            println!("Registered {username}. Log in to get a token.");
        }
        "login" => {
            let (username, password) = credentials(&args)?;
            auth.login(username, password).await?;
            let token = session
                .get()
                .await
                .context("login did not yield a token")?;
            println!("{token}");
        }
        "list" => {
            state.refresh().await?;
            print_tasks(&state.tasks().await);
        }
        "show" => {
            let id = args.get(1).context("usage: show <id>")?;
            let task = store.get(id).await?;
            print_tasks(&[task]);
        }
        "add" => {
            let (title, description, due) = match (args.get(1), args.get(2), args.get(3)) {
                (Some(t), Some(d), Some(due)) => (t, d, due),
                _ => bail!("usage: add <title> <description> <YYYY-MM-DD>"),
            };
            let task = state
                .add(TaskDraft::new(title, description, parse_date(due)?))
                .await?;
            println!("Created task {}", task.id);
        }
        "edit" => {
            let (id, field, value) = match (args.get(1), args.get(2), args.get(3)) {
                (Some(id), Some(f), Some(v)) => (id, f, v),
                _ => bail!("usage: edit <id> <title|description|due|status> <value>"),
            };
            let patch = match field.as_str() {
                "title" => TaskPatch::default().with_title(value),
                "description" => TaskPatch::default().with_description(value),
                "due" => TaskPatch::default().with_due_date(parse_date(value)?),
                "status" => TaskPatch::default().with_status(parse_status(value)?),
                other => bail!("unknown field: {other}"),
            };
            let task = state.edit(id, patch).await?;
            println!("Updated task {}", task.id);
        }
        "remove" => {
            let id = args.get(1).context("usage: remove <id>")?;
            state.remove(id).await?;
            println!("Removed task {id}");
        }
        "stats" => {
            state.refresh().await?;
            let stats = state.stats().await;
            println!("total:       {}", stats.total);
            println!("completed:   {}", stats.completed);
            println!("pending:     {}", stats.pending);
            println!("in progress: {}", stats.in_progress);
            println!("not started: {}", stats.not_started);
        }
        _ => print_usage(),
    }

    Ok(())
}

fn credentials(args: &[String]) -> anyhow::Result<(&str, &str)> {
    match (args.get(1), args.get(2)) {
        (Some(username), Some(password)) => Ok((username, password)),
        _ => bail!("usage: {} <username> <password>", args[0]),
    }
}

fn parse_date(raw: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .with_context(|| format!("invalid date {raw:?}, expected YYYY-MM-DD"))
}

fn parse_status(raw: &str) -> anyhow::Result<TaskStatus> {
    match raw {
        "pending" => Ok(TaskStatus::Pending),
        "in-progress" => Ok(TaskStatus::InProgress),
        "completed" => Ok(TaskStatus::Completed),
        other => bail!("unknown status {other:?}, expected pending, in-progress or completed"),
    }
}

// Tasks without a status render as pending; statistics track them apart.
fn status_label(status: Option<TaskStatus>) -> &'static str {
    match status {
        Some(TaskStatus::Completed) => "completed",
        Some(TaskStatus::InProgress) => "in-progress",
        Some(TaskStatus::Pending) | None => "pending",
    }
}

fn print_tasks(tasks: &[Task]) {
    if tasks.is_empty() {
        println!("No tasks.");
        return;
    }
    for task in tasks {
        println!(
            "{:<8} {:<12} {}  {}",
            task.id,
            status_label(task.status),
            task.due_date,
            task.title
        );
        if !task.description.is_empty() {
            println!("         {}", task.description);
        }
    }
}

fn print_usage() {
    println!("TaskHub client");
    println!();
    println!("Usage: th <command> [args]");
    println!();
    println!("Commands:");
    println!("  register <username> <password>   Create an account");
    println!("  login <username> <password>      Log in and print the token");
    println!("  list                             List all tasks");
    println!("  show <id>                        Show one task");
    println!("  add <title> <description> <due>  Create a task (due: YYYY-MM-DD)");
    println!("  edit <id> <field> <value>        Update one field of a task");
    println!("  remove <id>                      Delete a task");
    println!("  stats                            Show counts by status");
    println!();
    println!("Environment:");
    println!("  TH_API_URL  Service base address (default {})", th_core::config::DEFAULT_API_URL);
    println!("  TH_TOKEN    Bearer token from a previous login");
}
