//! Command implementations for the CLI interface.
//!
//! This module contains all the command handlers that implement the various
//! subcommands available in the CLI, from basic CRUD operations to status
//! changes, comments, and aggregate statistics.

use clap::Subcommand;
use clap_complete::{generate, Shell};

use chrono::{Duration, Local, NaiveDate, Utc};

use crate::fields::{format_priority, format_status, Priority, Status};
use crate::service::{ListFilter, Stats, TaskService};
use crate::task::{NewTask, Subtask, Task, TaskPatch};

#[derive(Subcommand)]
pub enum Commands {
    /// Add a new task.
    Add {
        /// Short title for the task.
        title: String,
        /// Optional longer description.
        #[arg(long)]
        desc: Option<String>,
        /// Priority: low | medium | high | urgent.
        #[arg(long, value_enum)]
        priority: Option<Priority>,
        /// Status: todo | in-progress | review | done.
        #[arg(long, value_enum)]
        status: Option<Status>,
        /// Due date: YYYY-MM-DD, "today", "tomorrow", or "in Nd".
        #[arg(long)]
        due: Option<String>,
        /// Person responsible for the task.
        #[arg(long)]
        assignee: Option<String>,
        /// Category label.
        #[arg(long)]
        category: Option<String>,
        /// Comma-separated tags. May be repeated.
        #[arg(long = "tag")]
        tags: Vec<String>,
        /// Estimated effort in hours.
        #[arg(long)]
        estimate: Option<f64>,
        /// Actual effort in hours.
        #[arg(long)]
        actual: Option<f64>,
        /// Subtask title. May be repeated.
        #[arg(long = "subtask")]
        subtasks: Vec<String>,
    },

    /// List tasks with optional filters.
    List {
        /// Filter by completion state: true | false.
        #[arg(long)]
        completed: Option<bool>,
        /// Filter by status.
        #[arg(long, value_enum)]
        status: Option<Status>,
        /// Filter by priority.
        #[arg(long, value_enum)]
        priority: Option<Priority>,
        /// Filter by assignee.
        #[arg(long)]
        assignee: Option<String>,
        /// Print the raw JSON listing instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// View a single task by ID.
    View {
        /// Task ID to view.
        id: String,
        /// Print the raw JSON record instead of the detail view.
        #[arg(long)]
        json: bool,
    },

    /// Update fields on a task.
    Update {
        /// Task ID to update.
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        desc: Option<String>,
        /// Set the completion flag directly: true | false.
        #[arg(long)]
        completed: Option<bool>,
        #[arg(long, value_enum)]
        priority: Option<Priority>,
        #[arg(long, value_enum)]
        status: Option<Status>,
        #[arg(long)]
        due: Option<String>,
        /// Clear due date.
        #[arg(long)]
        clear_due: bool,
        #[arg(long)]
        assignee: Option<String>,
        #[arg(long)]
        category: Option<String>,
        /// Replace tags. May be repeated and comma-separated.
        #[arg(long = "tag")]
        tags: Vec<String>,
        /// Remove all tags.
        #[arg(long)]
        clear_tags: bool,
        /// Replace subtasks. May be repeated.
        #[arg(long = "subtask")]
        subtasks: Vec<String>,
        #[arg(long)]
        estimate: Option<f64>,
        #[arg(long)]
        actual: Option<f64>,
    },

    /// Flip a task's completion flag.
    Toggle {
        /// Task ID to toggle.
        id: String,
    },

    /// Set a task's workflow status.
    Status {
        /// Task ID to change.
        id: String,
        /// New status: todo | in-progress | review | done.
        status: String,
    },

    /// Append a comment to a task.
    Comment {
        /// Task ID to comment on.
        id: String,
        /// Comment author.
        author: String,
        /// Comment text.
        text: String,
    },

    /// Delete a task by ID.
    Delete {
        /// Task ID to delete.
        id: String,
    },

    /// Delete every task and reset the id sequence.
    Clear,

    /// Show aggregate statistics.
    Stats {
        /// Print the raw JSON statistics instead of the summary.
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completion scripts.
    Completions {
        /// Shell to generate completions for.
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Add a new task.
pub fn cmd_add(
    service: &TaskService,
    title: String,
    desc: Option<String>,
    priority: Option<Priority>,
    status: Option<Status>,
    due: Option<String>,
    assignee: Option<String>,
    category: Option<String>,
    tags: Vec<String>,
    estimate: Option<f64>,
    actual: Option<f64>,
    subtasks: Vec<String>,
) {
    if title.trim().is_empty() {
        eprintln!("Title cannot be empty.");
        std::process::exit(1);
    }
    let due_date = due.as_deref().map(|s| parse_due_or_exit(s));

    let new = NewTask {
        title,
        description: desc,
        completed: None,
        priority,
        status,
        due_date,
        assignee,
        category,
        tags: split_and_normalise_tags(&tags),
        estimated_hours: estimate,
        actual_hours: actual,
        subtasks: make_subtasks(&subtasks),
    };
    match service.create(new) {
        Ok(task) => println!("Added task {}", task.id),
        Err(e) => {
            eprintln!("Failed to add task: {e}");
            std::process::exit(1);
        }
    }
}

/// List tasks with optional filtering.
pub fn cmd_list(
    service: &TaskService,
    completed: Option<bool>,
    status: Option<Status>,
    priority: Option<Priority>,
    assignee: Option<String>,
    json: bool,
) {
    let filter = ListFilter { completed, status, priority, assignee };
    let result = service.list(&filter);
    if json {
        match serde_json::to_string_pretty(&result) {
            Ok(out) => println!("{out}"),
            Err(e) => {
                eprintln!("Failed to encode listing: {e}");
                std::process::exit(1);
            }
        }
        return;
    }
    print_table(&result.tasks);
    println!("\n{} task(s)", result.count);
}

/// View detailed information about a specific task.
pub fn cmd_view(service: &TaskService, id: String, json: bool) {
    let task = match service.get(&id) {
        Ok(task) => task,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };
    if json {
        match serde_json::to_string_pretty(&task) {
            Ok(out) => println!("{out}"),
            Err(e) => {
                eprintln!("Failed to encode task: {e}");
                std::process::exit(1);
            }
        }
        return;
    }
    let today = Local::now().date_naive();
    println!("ID:           {}", task.id);
    println!("Title:        {}", task.title);
    println!("Completed:    {}", if task.completed { "yes" } else { "no" });
    println!("Status:       {}", format_status(task.status));
    println!("Priority:     {}", format_priority(task.priority));
    println!("Assignee:     {}", task.assignee.clone().unwrap_or_else(|| "-".into()));
    println!("Category:     {}", task.category.clone().unwrap_or_else(|| "-".into()));
    println!(
        "Due:          {}",
        match task.due_date {
            Some(d) => format!("{d} ({})", format_due_relative(Some(d), today)),
            None => "-".into(),
        }
    );
    println!("Tags:         {}", if task.tags.is_empty() { "-".into() } else { task.tags.join(",") });
    println!(
        "Hours:        est {} / actual {}",
        task.estimated_hours.map(|h| h.to_string()).unwrap_or_else(|| "-".into()),
        task.actual_hours.map(|h| h.to_string()).unwrap_or_else(|| "-".into())
    );
    println!("Created UTC:  {}", task.created_at.to_rfc3339());
    println!("Description:\n{}\n", if task.description.is_empty() { "-".into() } else { task.description.clone() });

    if !task.subtasks.is_empty() {
        println!("Subtasks:");
        for st in &task.subtasks {
            println!("  [{}] {} (#{})", if st.completed { "x" } else { " " }, st.title, st.id);
        }
    }
    if !task.comments.is_empty() {
        println!("Comments:");
        for c in &task.comments {
            println!("  {} ({}): {}", c.author, c.timestamp.to_rfc3339(), c.text);
        }
    }
}

/// Update an existing task's fields.
pub fn cmd_update(
    service: &TaskService,
    id: String,
    title: Option<String>,
    desc: Option<String>,
    completed: Option<bool>,
    priority: Option<Priority>,
    status: Option<Status>,
    due: Option<String>,
    clear_due: bool,
    assignee: Option<String>,
    category: Option<String>,
    tags: Vec<String>,
    clear_tags: bool,
    subtasks: Vec<String>,
    estimate: Option<f64>,
    actual: Option<f64>,
) {
    if let Some(ref t) = title {
        if t.trim().is_empty() {
            eprintln!("Title cannot be empty.");
            std::process::exit(1);
        }
    }
    let due_date = due.as_deref().map(|s| parse_due_or_exit(s));
    let tags = if clear_tags {
        Some(Vec::new())
    } else if tags.is_empty() {
        None
    } else {
        Some(split_and_normalise_tags(&tags))
    };
    let subtasks = if subtasks.is_empty() { None } else { Some(make_subtasks(&subtasks)) };

    let patch = TaskPatch {
        title,
        description: desc,
        completed,
        priority,
        status,
        due_date,
        clear_due_date: clear_due,
        assignee,
        category,
        estimated_hours: estimate,
        actual_hours: actual,
        tags,
        subtasks,
    };
    if patch.is_empty() {
        println!("Nothing to update.");
        return;
    }
    match service.update(&id, &patch) {
        Ok(task) => println!("Updated task {}", task.id),
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}

/// Flip a task's completion flag.
pub fn cmd_toggle(service: &TaskService, id: String) {
    match service.toggle(&id) {
        Ok(task) => {
            println!("Task {} is now {}", task.id, if task.completed { "completed" } else { "active" })
        }
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}

/// Set a task's workflow status. The raw value is validated by the service.
pub fn cmd_status(service: &TaskService, id: String, status: String) {
    match service.set_status(&id, &status) {
        Ok(task) => println!("Task {} status set to {}", task.id, task.status.as_str()),
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}

/// Append a comment to a task.
pub fn cmd_comment(service: &TaskService, id: String, author: String, text: String) {
    match service.add_comment(&id, &author, &text) {
        Ok(comment) => println!("Added comment {} to task {}", comment.id, id),
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}

/// Delete a task.
pub fn cmd_delete(service: &TaskService, id: String) {
    match service.delete(&id) {
        Ok(task) => println!("Deleted task {} ({})", task.id, task.title),
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}

/// Delete every task and reset the id sequence.
pub fn cmd_clear(service: &TaskService) {
    match service.clear_all() {
        Ok(()) => println!("All tasks deleted."),
        Err(e) => {
            eprintln!("Failed to clear tasks: {e}");
            std::process::exit(1);
        }
    }
}

/// Print aggregate statistics over the current collection.
pub fn cmd_stats(service: &TaskService, json: bool) {
    let stats = service.stats();
    if json {
        match serde_json::to_string_pretty(&stats) {
            Ok(out) => println!("{out}"),
            Err(e) => {
                eprintln!("Failed to encode statistics: {e}");
                std::process::exit(1);
            }
        }
        return;
    }
    print_stats(&stats);
}

/// Generate shell completion scripts.
pub fn cmd_completions(shell: Shell) {
    use crate::cli::Cli;
    use clap::CommandFactory;

    let mut app = Cli::command();
    let app_name = app.get_name().to_string();
    generate(shell, &mut app, app_name, &mut std::io::stdout());
}

fn print_stats(stats: &Stats) {
    println!("Total:          {}", stats.total);
    println!("Completed:      {}", stats.completed);
    println!("Active:         {}", stats.active);
    println!("In progress:    {}", stats.in_progress);
    println!("High priority:  {}", stats.high_priority);
    println!("By status:");
    println!("  {:<14} {}", "todo", stats.status_counts.todo);
    println!("  {:<14} {}", "in-progress", stats.status_counts.in_progress);
    println!("  {:<14} {}", "review", stats.status_counts.review);
    println!("  {:<14} {}", "done", stats.status_counts.done);
}

/// Print tasks in a formatted table.
pub fn print_table(tasks: &[Task]) {
    println!(
        "{:<5} {:<5} {:<12} {:<8} {:<12} {:<12} {}",
        "ID", "Done", "Status", "Pri", "Due", "Assignee", "Title [tags]"
    );
    let today = Local::now().date_naive();
    for t in tasks {
        let tags = if t.tags.is_empty() {
            String::new()
        } else {
            format!(" [{}]", t.tags.join(","))
        };
        let due = format_due_relative(t.due_date, today);
        let assignee = t.assignee.clone().unwrap_or_else(|| "-".into());
        println!(
            "{:<5} {:<5} {:<12} {:<8} {:<12} {:<12} {}{}",
            t.id,
            if t.completed { "x" } else { "-" },
            format_status(t.status),
            format_priority(t.priority),
            due,
            truncate(&assignee, 12),
            t.title,
            tags
        );
    }
}

/// Truncate a string to a maximum width, adding ellipsis if needed.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out = String::new();
        for (i, ch) in s.chars().enumerate() {
            if i + 1 >= width {
                out.push('…');
                break;
            }
            out.push(ch);
        }
        out
    }
}

/// Normalize a tag string by trimming, lowercasing, and replacing spaces
/// with hyphens.
pub fn normalise_tag(s: &str) -> String {
    s.trim().to_lowercase().replace(' ', "-")
}

/// Split comma-separated tag strings and normalize each tag.
pub fn split_and_normalise_tags(inputs: &[String]) -> Vec<String> {
    let mut tags = Vec::new();
    for raw in inputs {
        for part in raw.split(',') {
            let tag = normalise_tag(part);
            if !tag.is_empty() {
                tags.push(tag);
            }
        }
    }
    tags.sort();
    tags.dedup();
    tags
}

/// Build subtasks from a list of titles, issuing time-derived ids.
fn make_subtasks(titles: &[String]) -> Vec<Subtask> {
    let base = Utc::now().timestamp_millis();
    titles
        .iter()
        .filter(|t| !t.trim().is_empty())
        .enumerate()
        .map(|(i, title)| Subtask {
            id: (base + i as i64).to_string(),
            title: title.trim().to_string(),
            completed: false,
        })
        .collect()
}

fn parse_due_or_exit(s: &str) -> NaiveDate {
    match parse_due_input(s) {
        Some(d) => d,
        None => {
            eprintln!("Unrecognised due date. Use YYYY-MM-DD, 'today', 'tomorrow', or 'in Nd'.");
            std::process::exit(1);
        }
    }
}

/// Parse human-readable due date input.
///
/// Supports:
/// - "today", "tomorrow"
/// - "end of week" / "eow"
/// - "in 3d", "in 2w"
/// - "YYYY-MM-DD" format
pub fn parse_due_input(s: &str) -> Option<NaiveDate> {
    let s = s.trim().to_lowercase();
    let today = Local::now().date_naive();

    match s.as_str() {
        "today" => return Some(today),
        "tomorrow" => return Some(today + Duration::days(1)),
        "end of week" | "eow" => {
            // ISO week: Monday start.
            let weekday = chrono::Datelike::weekday(&today).num_days_from_monday() as i64;
            return Some(today - Duration::days(weekday) + Duration::days(6));
        }
        _ => {}
    }

    // "in X" patterns
    if let Some(rest) = s.strip_prefix("in ") {
        if let Some(nd) = rest.strip_suffix('d') {
            if let Ok(days) = nd.trim().parse::<i64>() {
                return Some(today + Duration::days(days));
            }
        }
        if let Some(nw) = rest.strip_suffix('w') {
            if let Ok(weeks) = nw.trim().parse::<i64>() {
                return Some(today + Duration::weeks(weeks));
            }
        }
    }

    NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()
}

/// Format a due date relative to today ("today", "tomorrow", "in 3d", "2d late").
pub fn format_due_relative(due: Option<NaiveDate>, today: NaiveDate) -> String {
    match due {
        None => "-".into(),
        Some(d) => {
            let delta = d - today;
            if delta.num_days() == 0 {
                "today".into()
            } else if delta.num_days() == 1 {
                "tomorrow".into()
            } else if delta.num_days() > 1 {
                format!("in {}d", delta.num_days())
            } else {
                format!("{}d late", -delta.num_days())
            }
        }
    }
}
