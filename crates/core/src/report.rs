//! Outcome of a single pruning run.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    File,
    Directory,
    Other,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryKind::File => f.write_str("file"),
            EntryKind::Directory => f.write_str("directory"),
            EntryKind::Other => f.write_str("special entry"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Inspect,
    RemoveFile,
    RemoveDirectory,
    RemoveLink,
}

#[derive(Debug, Clone, Serialize)]
pub struct EntryFailure {
    pub name: String,
    pub kind: EntryKind,
    pub operation: Operation,
    pub error: String,
}

impl fmt::Display for EntryFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.operation {
            Operation::Inspect => write!(f, "cannot inspect {}: {}", self.name, self.error),
            _ => write!(
                f,
                "cannot remove {} {}: {}",
                self.kind, self.name, self.error
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Complete,
    Partial { failed: usize },
    Aborted { failed: usize, untouched: usize },
}

impl Outcome {
    pub fn is_complete(&self) -> bool {
        matches!(self, Outcome::Complete)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PruneReport {
    pub root: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcome: Outcome,
    pub deleted_files: Vec<String>,
    pub deleted_dirs: Vec<String>,
    pub kept: Vec<String>,
    pub skipped: Vec<String>,
    pub failures: Vec<EntryFailure>,
    /// Entries left alone because an earlier failure aborted the run.
    pub untouched: Vec<String>,
}

impl PruneReport {
    pub(crate) fn start(root: &Path) -> Self {
        let now = Utc::now();
        Self {
            root: root.to_string_lossy().into_owned(),
            started_at: now,
            finished_at: now,
            outcome: Outcome::Complete,
            deleted_files: Vec::new(),
            deleted_dirs: Vec::new(),
            kept: Vec::new(),
            skipped: Vec::new(),
            failures: Vec::new(),
            untouched: Vec::new(),
        }
    }

    pub(crate) fn finish(mut self, aborted: bool) -> Self {
        self.finished_at = Utc::now();
        let failed = self.failures.len();
        self.outcome = if aborted {
            Outcome::Aborted {
                failed,
                untouched: self.untouched.len(),
            }
        } else if failed > 0 {
            Outcome::Partial { failed }
        } else {
            Outcome::Complete
        };
        self
    }

    pub fn deleted_count(&self) -> usize {
        self.deleted_files.len() + self.deleted_dirs.len()
    }
}
