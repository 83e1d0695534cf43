use std::path::PathBuf;

use clap::Parser;

use crate::cmd::Commands;

/// Simple, file-backed todo tracker CLI.
/// Storage defaults to ~/.smart_todo/todos.json or a path passed via --db.
#[derive(Parser)]
#[command(name = "todo", version, about = "Smart todo tracking CLI")]
pub struct Cli {
    /// Path to the JSON data file.
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Mirror the completion flag into the workflow status and back.
    /// Off by default; completion and status are independent.
    #[arg(long, global = true)]
    pub couple_status: bool,

    #[command(subcommand)]
    pub command: Commands,
}
