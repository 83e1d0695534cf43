//! # Smart Todo CLI
//!
//! A single-user, file-backed todo tracker with workflow statuses,
//! comments, and aggregate statistics.
//!
//! ## Key Features
//!
//! - **Full Task Lifecycle**: create, list, view, update, toggle, status
//!   changes, comments, and delete - all from the command line
//! - **Rich Task Metadata**: priority, workflow status, due dates, assignee,
//!   category, tags, subtasks, and effort estimates
//! - **Aggregate Statistics**: completion, priority, and per-status counts
//!   over the whole collection
//! - **Local File Storage**: one JSON file with whole-collection replace
//!   semantics and atomic writes
//!
//! ## Quick Start
//!
//! ```bash
//! # Add a task
//! todo add "Write spec" --priority high --tag docs --due tomorrow
//!
//! # List open work
//! todo list --completed false
//!
//! # Move it through the workflow
//! todo status 1 in-progress
//! todo comment 1 ana "halfway there"
//! todo toggle 1
//!
//! # See where things stand
//! todo stats
//! ```
//!
//! Data is stored in `~/.smart_todo/todos.json`; pass `--db` to use another
//! file. Every command loads the full collection, applies its change, and
//! writes the collection back.

use std::path::PathBuf;

use clap::Parser;

pub mod cli;
pub mod cmd;
pub mod error;
pub mod fields;
pub mod service;
pub mod store;
pub mod task;

use cli::Cli;
use cmd::*;
use service::{CompletionPolicy, TaskService};
use store::Store;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Completions don't need a data file.
    if let Commands::Completions { shell } = &cli.command {
        cmd_completions(*shell);
        return;
    }

    let db_path = cli.db.unwrap_or_else(|| {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        let data_dir = PathBuf::from(home).join(".smart_todo");
        if let Err(e) = std::fs::create_dir_all(&data_dir) {
            eprintln!("Failed to create data directory {}: {}", data_dir.display(), e);
            std::process::exit(1);
        }
        data_dir.join("todos.json")
    });

    let policy = if cli.couple_status {
        CompletionPolicy::CoupleDone
    } else {
        CompletionPolicy::Independent
    };
    let service = TaskService::with_policy(Store::new(db_path), policy);

    match cli.command {
        Commands::Completions { .. } => unreachable!("completions handled above"),

        Commands::Add {
            title, desc, priority, status, due, assignee, category, tags,
            estimate, actual, subtasks,
        } => cmd_add(
            &service, title, desc, priority, status, due, assignee, category,
            tags, estimate, actual, subtasks,
        ),

        Commands::List { completed, status, priority, assignee, json } =>
            cmd_list(&service, completed, status, priority, assignee, json),

        Commands::View { id, json } => cmd_view(&service, id, json),

        Commands::Update {
            id, title, desc, completed, priority, status, due, clear_due,
            assignee, category, tags, clear_tags, subtasks, estimate, actual,
        } => cmd_update(
            &service, id, title, desc, completed, priority, status, due,
            clear_due, assignee, category, tags, clear_tags, subtasks,
            estimate, actual,
        ),

        Commands::Toggle { id } => cmd_toggle(&service, id),

        Commands::Status { id, status } => cmd_status(&service, id, status),

        Commands::Comment { id, author, text } => cmd_comment(&service, id, author, text),

        Commands::Delete { id } => cmd_delete(&service, id),

        Commands::Clear => cmd_clear(&service),

        Commands::Stats { json } => cmd_stats(&service, json),
    }
}
