//! Persistence for the task collection.
//!
//! This module provides the `Store` struct, which owns the single JSON data
//! file holding every task plus the id-allocation counter. Loads that fail
//! to read or parse start fresh; saves replace the whole file atomically
//! (temp file + rename) and report their failures.

use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::task::Task;

/// The full persisted state: every task plus the next id to issue.
///
/// Tasks are kept in insertion order, newest first. `next_id` is strictly
/// greater than the numeric value of every id this collection has issued.
#[derive(Debug, Serialize, Deserialize)]
pub struct Collection {
    #[serde(default)]
    pub todos: Vec<Task>,
    #[serde(default = "initial_id")]
    pub next_id: u64,
}

fn initial_id() -> u64 {
    1
}

impl Default for Collection {
    fn default() -> Self {
        Collection { todos: Vec::new(), next_id: 1 }
    }
}

impl Collection {
    /// Issue the next task id and advance the counter.
    pub fn allocate_id(&mut self) -> String {
        let id = self.next_id.to_string();
        self.next_id += 1;
        id
    }
}

/// File-backed store for the collection.
///
/// One `Store` instance is constructed at startup and handed to the task
/// service; it is never a process-wide singleton.
#[derive(Debug, Clone)]
pub struct Store {
    path: PathBuf,
}

impl Store {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Store { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the collection, starting fresh if the file is missing,
    /// unreadable, or unparseable. Failures are logged, never surfaced.
    pub fn load(&self) -> Collection {
        if !self.path.exists() {
            return Collection::default();
        }
        let mut buf = String::new();
        match File::open(&self.path).and_then(|mut f| f.read_to_string(&mut buf)) {
            Ok(_) => match serde_json::from_str(&buf) {
                Ok(data) => data,
                Err(e) => {
                    tracing::warn!(
                        target: "store",
                        path = %self.path.display(),
                        error = %e,
                        "unparseable data file, starting fresh"
                    );
                    Collection::default()
                }
            },
            Err(e) => {
                tracing::warn!(
                    target: "store",
                    path = %self.path.display(),
                    error = %e,
                    "unreadable data file, starting fresh"
                );
                Collection::default()
            }
        }
    }

    /// Save the whole collection using atomic write (temp file + rename).
    /// There is no incremental persistence; callers always write the full
    /// collection back.
    pub fn save(&self, data: &Collection) -> io::Result<()> {
        let tmp = self.path.with_extension("json.tmp");
        let mut f = File::create(&tmp)?;
        let json = serde_json::to_string_pretty(data).map_err(io::Error::other)?;
        f.write_all(json.as_bytes())?;
        f.flush()?;
        fs::rename(tmp, &self.path)?;
        Ok(())
    }
}
