//! Task lifecycle and query operations.
//!
//! Every operation is a load → locate → mutate → save round trip over the
//! store. A single writer lock serialises the whole window so overlapping
//! operations cannot lose each other's writes. Filtering and aggregation
//! are single passes over the loaded collection; the expected collection
//! size is small and every operation already pays for a full load.

use chrono::Utc;
use parking_lot::Mutex;
use serde::Serialize;

use crate::error::ServiceError;
use crate::fields::{Priority, Status};
use crate::store::{Collection, Store};
use crate::task::{Comment, NewTask, Task, TaskPatch};

/// How the completion flag interacts with workflow status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CompletionPolicy {
    /// `completed` and `status` never touch each other. Canonical.
    #[default]
    Independent,
    /// Entering `done` marks the task completed, leaving it un-completes,
    /// and toggling completion moves the status to `done` or back to `todo`.
    CoupleDone,
}

/// Optional filters for task listing, combined with AND semantics.
#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    pub completed: Option<bool>,
    pub status: Option<Status>,
    pub priority: Option<Priority>,
    pub assignee: Option<String>,
}

impl ListFilter {
    fn matches(&self, task: &Task) -> bool {
        if let Some(completed) = self.completed {
            if task.completed != completed {
                return false;
            }
        }
        if let Some(status) = self.status {
            if task.status != status {
                return false;
            }
        }
        if let Some(priority) = self.priority {
            if task.priority != priority {
                return false;
            }
        }
        if let Some(ref assignee) = self.assignee {
            if task.assignee.as_deref() != Some(assignee.as_str()) {
                return false;
            }
        }
        true
    }
}

/// A filtered listing along with its size.
#[derive(Debug, Clone, Serialize)]
pub struct ListResult {
    #[serde(rename = "todos")]
    pub tasks: Vec<Task>,
    pub count: usize,
}

/// Per-status counts. All four statuses are present even when zero.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct StatusCounts {
    pub todo: usize,
    #[serde(rename = "in-progress")]
    pub in_progress: usize,
    pub review: usize,
    pub done: usize,
}

/// Aggregate counts over the current collection. Derived, never persisted.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total: usize,
    pub completed: usize,
    pub active: usize,
    pub in_progress: usize,
    pub high_priority: usize,
    pub status_counts: StatusCounts,
}

/// Implements every task lifecycle and query operation on top of a `Store`.
pub struct TaskService {
    store: Store,
    policy: CompletionPolicy,
    write_lock: Mutex<()>,
}

impl TaskService {
    pub fn new(store: Store) -> Self {
        Self::with_policy(store, CompletionPolicy::default())
    }

    pub fn with_policy(store: Store, policy: CompletionPolicy) -> Self {
        TaskService { store, policy, write_lock: Mutex::new(()) }
    }

    /// List tasks matching the conjunction of all supplied filters.
    pub fn list(&self, filter: &ListFilter) -> ListResult {
        let _guard = self.write_lock.lock();
        let data = self.store.load();
        let tasks: Vec<Task> = data.todos.into_iter().filter(|t| filter.matches(t)).collect();
        let count = tasks.len();
        ListResult { tasks, count }
    }

    /// Fetch a single task by id.
    pub fn get(&self, id: &str) -> Result<Task, ServiceError> {
        let _guard = self.write_lock.lock();
        let data = self.store.load();
        data.todos
            .into_iter()
            .find(|t| t.id == id)
            .ok_or_else(|| ServiceError::NotFound(id.to_string()))
    }

    /// Create a task with a freshly issued id, stamped with the current
    /// time and inserted at the front of the sequence (newest first).
    pub fn create(&self, new: NewTask) -> Result<Task, ServiceError> {
        let _guard = self.write_lock.lock();
        let mut data = self.store.load();
        let task = Task {
            id: data.allocate_id(),
            title: new.title,
            description: new.description.unwrap_or_default(),
            completed: new.completed.unwrap_or(false),
            priority: new.priority.unwrap_or_default(),
            created_at: Utc::now(),
            due_date: new.due_date,
            assignee: new.assignee,
            category: new.category,
            tags: new.tags,
            comments: Vec::new(),
            estimated_hours: new.estimated_hours,
            actual_hours: new.actual_hours,
            status: new.status.unwrap_or_default(),
            subtasks: new.subtasks,
        };
        data.todos.insert(0, task.clone());
        self.store.save(&data)?;
        tracing::debug!(target: "service", id = %task.id, "created task");
        Ok(task)
    }

    /// Merge the supplied patch onto an existing task. The task's id,
    /// creation time and comments are never altered by this path.
    pub fn update(&self, id: &str, patch: &TaskPatch) -> Result<Task, ServiceError> {
        let _guard = self.write_lock.lock();
        let mut data = self.store.load();
        let task = find_mut(&mut data, id)?;
        patch.apply_to(task);
        let updated = task.clone();
        self.store.save(&data)?;
        tracing::debug!(target: "service", id = %updated.id, "updated task");
        Ok(updated)
    }

    /// Remove a task from the collection and return it.
    pub fn delete(&self, id: &str) -> Result<Task, ServiceError> {
        let _guard = self.write_lock.lock();
        let mut data = self.store.load();
        let index = data
            .todos
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| ServiceError::NotFound(id.to_string()))?;
        let removed = data.todos.remove(index);
        self.store.save(&data)?;
        tracing::debug!(target: "service", id = %removed.id, "deleted task");
        Ok(removed)
    }

    /// Replace the collection with an empty one, resetting the id sequence.
    pub fn clear_all(&self) -> Result<(), ServiceError> {
        let _guard = self.write_lock.lock();
        self.store.save(&Collection::default())?;
        tracing::debug!(target: "service", "cleared all tasks");
        Ok(())
    }

    /// Flip a task's completion flag. Status is untouched unless the
    /// coupling policy is active.
    pub fn toggle(&self, id: &str) -> Result<Task, ServiceError> {
        let _guard = self.write_lock.lock();
        let mut data = self.store.load();
        let task = find_mut(&mut data, id)?;
        task.completed = !task.completed;
        if self.policy == CompletionPolicy::CoupleDone {
            task.status = if task.completed { Status::Done } else { Status::Todo };
        }
        let updated = task.clone();
        self.store.save(&data)?;
        Ok(updated)
    }

    /// Set a task's workflow status from its raw wire name. Values outside
    /// the four statuses are rejected before anything is loaded or written.
    pub fn set_status(&self, id: &str, status: &str) -> Result<Task, ServiceError> {
        let status =
            Status::parse(status).ok_or_else(|| ServiceError::InvalidStatus(status.to_string()))?;
        let _guard = self.write_lock.lock();
        let mut data = self.store.load();
        let task = find_mut(&mut data, id)?;
        task.status = status;
        if self.policy == CompletionPolicy::CoupleDone {
            task.completed = status == Status::Done;
        }
        let updated = task.clone();
        self.store.save(&data)?;
        Ok(updated)
    }

    /// Append a comment with a fresh time-derived id to a task.
    pub fn add_comment(&self, id: &str, author: &str, text: &str) -> Result<Comment, ServiceError> {
        let _guard = self.write_lock.lock();
        let mut data = self.store.load();
        let task = find_mut(&mut data, id)?;
        let now = Utc::now();
        // Millisecond-derived ids can collide within one task; bump until free.
        let mut id_ms = now.timestamp_millis();
        while task.comments.iter().any(|c| c.id == id_ms.to_string()) {
            id_ms += 1;
        }
        let comment = Comment {
            id: id_ms.to_string(),
            author: author.to_string(),
            text: text.to_string(),
            timestamp: now,
        };
        task.comments.push(comment.clone());
        self.store.save(&data)?;
        Ok(comment)
    }

    /// Compute aggregate statistics over the full collection.
    pub fn stats(&self) -> Stats {
        let _guard = self.write_lock.lock();
        let data = self.store.load();
        let mut stats = Stats { total: data.todos.len(), ..Stats::default() };
        for task in &data.todos {
            if task.completed {
                stats.completed += 1;
            }
            if task.priority.is_high() {
                stats.high_priority += 1;
            }
            match task.status {
                Status::Todo => stats.status_counts.todo += 1,
                Status::InProgress => stats.status_counts.in_progress += 1,
                Status::Review => stats.status_counts.review += 1,
                Status::Done => stats.status_counts.done += 1,
            }
        }
        stats.active = stats.total - stats.completed;
        stats.in_progress = stats.status_counts.in_progress;
        stats
    }
}

fn find_mut<'a>(data: &'a mut Collection, id: &str) -> Result<&'a mut Task, ServiceError> {
    data.todos
        .iter_mut()
        .find(|t| t.id == id)
        .ok_or_else(|| ServiceError::NotFound(id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn service_in(dir: &TempDir) -> TaskService {
        TaskService::new(Store::new(dir.path().join("todos.json")))
    }

    fn titled(title: &str) -> NewTask {
        NewTask { title: title.to_string(), ..NewTask::default() }
    }

    fn coupled_service_in(dir: &TempDir) -> TaskService {
        TaskService::with_policy(
            Store::new(dir.path().join("todos.json")),
            CompletionPolicy::CoupleDone,
        )
    }

    #[test]
    fn create_issues_monotonic_ids() {
        let dir = TempDir::new().unwrap();
        let svc = service_in(&dir);
        let ids: Vec<String> = (0..5)
            .map(|i| svc.create(titled(&format!("task {i}"))).unwrap().id)
            .collect();
        assert_eq!(ids, ["1", "2", "3", "4", "5"]);
    }

    #[test]
    fn create_round_trips_with_defaults() {
        let dir = TempDir::new().unwrap();
        let svc = service_in(&dir);
        let mut new = titled("Write spec");
        new.description = Some("first draft".into());
        new.priority = Some(Priority::High);
        new.assignee = Some("ana".into());
        new.tags = vec!["docs".into(), "q3".into()];
        let created = svc.create(new).unwrap();

        let fetched = svc.get(&created.id).unwrap();
        assert_eq!(fetched.title, "Write spec");
        assert_eq!(fetched.description, "first draft");
        assert_eq!(fetched.priority, Priority::High);
        assert_eq!(fetched.assignee.as_deref(), Some("ana"));
        assert_eq!(fetched.tags, vec!["docs".to_string(), "q3".to_string()]);
        // Stated defaults for everything omitted.
        assert!(!fetched.completed);
        assert_eq!(fetched.status, Status::Todo);
        assert_eq!(fetched.due_date, None);
        assert_eq!(fetched.category, None);
        assert_eq!(fetched.estimated_hours, None);
        assert_eq!(fetched.actual_hours, None);
        assert!(fetched.comments.is_empty());
        assert!(fetched.subtasks.is_empty());
        assert_eq!(fetched.created_at, created.created_at);
    }

    #[test]
    fn newest_task_lists_first() {
        let dir = TempDir::new().unwrap();
        let svc = service_in(&dir);
        svc.create(titled("older")).unwrap();
        svc.create(titled("newer")).unwrap();
        let result = svc.list(&ListFilter::default());
        assert_eq!(result.tasks[0].title, "newer");
        assert_eq!(result.tasks[1].title, "older");
        assert_eq!(result.count, 2);
    }

    #[test]
    fn toggle_twice_is_identity() {
        let dir = TempDir::new().unwrap();
        let svc = service_in(&dir);
        let id = svc.create(titled("flip me")).unwrap().id;
        assert!(svc.toggle(&id).unwrap().completed);
        assert!(!svc.toggle(&id).unwrap().completed);
    }

    #[test]
    fn toggle_leaves_status_alone() {
        let dir = TempDir::new().unwrap();
        let svc = service_in(&dir);
        let mut new = titled("in review");
        new.status = Some(Status::Review);
        let id = svc.create(new).unwrap().id;
        let toggled = svc.toggle(&id).unwrap();
        assert!(toggled.completed);
        assert_eq!(toggled.status, Status::Review);
    }

    #[test]
    fn partial_update_is_non_destructive() {
        let dir = TempDir::new().unwrap();
        let svc = service_in(&dir);
        let mut new = titled("original");
        new.description = Some("keep me".into());
        new.tags = vec!["keep".into()];
        new.status = Some(Status::InProgress);
        let id = svc.create(new).unwrap().id;
        svc.add_comment(&id, "ana", "hold on to this").unwrap();

        let patch = TaskPatch { title: Some("renamed".into()), ..TaskPatch::default() };
        let updated = svc.update(&id, &patch).unwrap();

        assert_eq!(updated.title, "renamed");
        assert_eq!(updated.description, "keep me");
        assert_eq!(updated.tags, vec!["keep".to_string()]);
        assert_eq!(updated.status, Status::InProgress);
        assert_eq!(updated.comments.len(), 1);
        assert_eq!(updated.id, id);
    }

    #[test]
    fn update_cannot_touch_id_or_created_at() {
        let dir = TempDir::new().unwrap();
        let svc = service_in(&dir);
        let created = svc.create(titled("fixed identity")).unwrap();
        let patch = TaskPatch { completed: Some(true), ..TaskPatch::default() };
        let updated = svc.update(&created.id, &patch).unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.created_at, created.created_at);
    }

    #[test]
    fn filters_are_conjunctive() {
        let dir = TempDir::new().unwrap();
        let svc = service_in(&dir);
        for (title, completed, priority) in [
            ("a", true, Priority::High),
            ("b", true, Priority::Low),
            ("c", false, Priority::High),
            ("d", true, Priority::High),
        ] {
            let mut new = titled(title);
            new.completed = Some(completed);
            new.priority = Some(priority);
            svc.create(new).unwrap();
        }

        let filter = ListFilter {
            completed: Some(true),
            priority: Some(Priority::High),
            ..ListFilter::default()
        };
        let result = svc.list(&filter);
        assert_eq!(result.count, result.tasks.len());
        assert_eq!(result.count, 2);
        assert!(result.tasks.iter().all(|t| t.completed && t.priority == Priority::High));
    }

    #[test]
    fn assignee_filter_matches_exactly() {
        let dir = TempDir::new().unwrap();
        let svc = service_in(&dir);
        let mut new = titled("mine");
        new.assignee = Some("ana".into());
        svc.create(new).unwrap();
        svc.create(titled("nobody's")).unwrap();

        let filter = ListFilter { assignee: Some("ana".into()), ..ListFilter::default() };
        assert_eq!(svc.list(&filter).count, 1);
        let filter = ListFilter { assignee: Some("bob".into()), ..ListFilter::default() };
        assert_eq!(svc.list(&filter).count, 0);
    }

    #[test]
    fn clear_resets_the_id_sequence() {
        let dir = TempDir::new().unwrap();
        let svc = service_in(&dir);
        svc.create(titled("one")).unwrap();
        svc.create(titled("two")).unwrap();
        svc.clear_all().unwrap();
        assert_eq!(svc.list(&ListFilter::default()).count, 0);
        let task = svc.create(titled("fresh start")).unwrap();
        assert_eq!(task.id, "1");
    }

    #[test]
    fn lifecycle_scenario() {
        let dir = TempDir::new().unwrap();
        let svc = service_in(&dir);
        let mut new = titled("Write spec");
        new.priority = Some(Priority::High);
        new.status = Some(Status::Todo);
        let task = svc.create(new).unwrap();
        assert_eq!(task.id, "1");

        let stats = svc.stats();
        assert_eq!(stats.total, 1);
        assert_eq!(stats.completed, 0);
        assert_eq!(stats.high_priority, 1);
        assert_eq!(stats.status_counts.todo, 1);

        let task = svc.set_status("1", "done").unwrap();
        assert_eq!(task.status, Status::Done);
        assert!(!task.completed);

        let task = svc.toggle("1").unwrap();
        assert!(task.completed);

        svc.delete("1").unwrap();
        assert_eq!(svc.stats().total, 0);
    }

    #[test]
    fn stats_counts_every_status_bucket() {
        let dir = TempDir::new().unwrap();
        let svc = service_in(&dir);
        let empty = svc.stats();
        assert_eq!(empty.status_counts, StatusCounts::default());

        for (status, completed, priority) in [
            (Status::Todo, false, Priority::Urgent),
            (Status::InProgress, false, Priority::Medium),
            (Status::InProgress, true, Priority::High),
            (Status::Done, true, Priority::Low),
        ] {
            let mut new = titled("t");
            new.status = Some(status);
            new.completed = Some(completed);
            new.priority = Some(priority);
            svc.create(new).unwrap();
        }

        let stats = svc.stats();
        assert_eq!(stats.total, 4);
        assert_eq!(stats.completed, 2);
        assert_eq!(stats.active, 2);
        assert_eq!(stats.in_progress, 2);
        assert_eq!(stats.high_priority, 2);
        assert_eq!(stats.status_counts.todo, 1);
        assert_eq!(stats.status_counts.in_progress, 2);
        assert_eq!(stats.status_counts.review, 0);
        assert_eq!(stats.status_counts.done, 1);
    }

    #[test]
    fn unknown_ids_signal_not_found_without_mutating() {
        let dir = TempDir::new().unwrap();
        let svc = service_in(&dir);
        svc.create(titled("only one")).unwrap();

        assert!(matches!(svc.get("99"), Err(ServiceError::NotFound(_))));
        assert!(matches!(svc.toggle("99"), Err(ServiceError::NotFound(_))));
        assert!(matches!(svc.delete("99"), Err(ServiceError::NotFound(_))));
        assert!(matches!(svc.set_status("99", "done"), Err(ServiceError::NotFound(_))));
        assert!(matches!(svc.add_comment("99", "ana", "hi"), Err(ServiceError::NotFound(_))));
        let patch = TaskPatch { title: Some("x".into()), ..TaskPatch::default() };
        assert!(matches!(svc.update("99", &patch), Err(ServiceError::NotFound(_))));

        assert_eq!(svc.stats().total, 1);
        assert_eq!(svc.get("1").unwrap().title, "only one");
    }

    #[test]
    fn bogus_status_is_invalid_and_leaves_task_unchanged() {
        let dir = TempDir::new().unwrap();
        let svc = service_in(&dir);
        let id = svc.create(titled("stable")).unwrap().id;
        let err = svc.set_status(&id, "bogus").unwrap_err();
        assert!(matches!(err, ServiceError::InvalidStatus(ref s) if s == "bogus"));
        assert_eq!(svc.get(&id).unwrap().status, Status::Todo);
    }

    #[test]
    fn comments_append_in_order_with_unique_ids() {
        let dir = TempDir::new().unwrap();
        let svc = service_in(&dir);
        let id = svc.create(titled("discussed")).unwrap().id;
        let first = svc.add_comment(&id, "ana", "first").unwrap();
        let second = svc.add_comment(&id, "bob", "second").unwrap();
        assert_ne!(first.id, second.id);

        let task = svc.get(&id).unwrap();
        assert_eq!(task.comments.len(), 2);
        assert_eq!(task.comments[0].author, "ana");
        assert_eq!(task.comments[0].text, "first");
        assert_eq!(task.comments[1].author, "bob");
    }

    #[test]
    fn delete_returns_the_removed_task() {
        let dir = TempDir::new().unwrap();
        let svc = service_in(&dir);
        let id = svc.create(titled("doomed")).unwrap().id;
        let removed = svc.delete(&id).unwrap();
        assert_eq!(removed.title, "doomed");
        assert!(matches!(svc.get(&id), Err(ServiceError::NotFound(_))));
    }

    #[test]
    fn coupled_policy_syncs_completed_with_status() {
        let dir = TempDir::new().unwrap();
        let svc = coupled_service_in(&dir);
        let id = svc.create(titled("coupled")).unwrap().id;

        let task = svc.set_status(&id, "done").unwrap();
        assert!(task.completed);
        let task = svc.set_status(&id, "review").unwrap();
        assert!(!task.completed);

        let task = svc.toggle(&id).unwrap();
        assert!(task.completed);
        assert_eq!(task.status, Status::Done);
        let task = svc.toggle(&id).unwrap();
        assert!(!task.completed);
        assert_eq!(task.status, Status::Todo);
    }

    #[test]
    fn persisted_file_uses_wire_field_names() {
        let dir = TempDir::new().unwrap();
        let svc = service_in(&dir);
        svc.create(titled("on disk")).unwrap();

        let raw = std::fs::read_to_string(dir.path().join("todos.json")).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed["next_id"], 2);
        assert_eq!(parsed["todos"][0]["id"], "1");
        assert_eq!(parsed["todos"][0]["status"], "todo");
        assert_eq!(parsed["todos"][0]["priority"], "medium");
        assert!(parsed["todos"][0]["createdAt"].is_string());
        assert!(parsed["todos"][0]["tags"].is_array());
    }
}
