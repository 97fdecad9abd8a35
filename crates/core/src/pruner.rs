//! Removes every immediate child of a root directory that is not on a keep-list.
//!
//! Only the top level is listed. Files are matched against `keep_files`,
//! directories against `keep_dirs`, both by exact name. A symbolic link is
//! classified by what it points to, but removing it only ever unlinks the
//! link itself.

use crate::config::{ErrorPolicy, SpecialEntryPolicy};
use crate::error::PruneError;
use crate::guard;
use crate::report::{EntryFailure, EntryKind, Operation, PruneReport};
use std::collections::BTreeSet;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone)]
pub struct PrunePlan {
    pub root: PathBuf,
    pub keep_files: BTreeSet<String>,
    pub keep_dirs: BTreeSet<String>,
    pub on_error: ErrorPolicy,
    pub special_entries: SpecialEntryPolicy,
    /// When non-empty, the root must lie under one of these.
    pub allow_roots: Vec<PathBuf>,
    pub deny_roots: Vec<PathBuf>,
}

impl PrunePlan {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            keep_files: BTreeSet::new(),
            keep_dirs: BTreeSet::new(),
            on_error: ErrorPolicy::default(),
            special_entries: SpecialEntryPolicy::default(),
            allow_roots: Vec::new(),
            deny_roots: Vec::new(),
        }
    }

    pub fn with_keep_files<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keep_files.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn with_keep_dirs<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keep_dirs.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn with_error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.on_error = policy;
        self
    }

    pub fn with_special_entries(mut self, policy: SpecialEntryPolicy) -> Self {
        self.special_entries = policy;
        self
    }

    pub fn with_allowed_roots<I, P>(mut self, roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.allow_roots.extend(roots.into_iter().map(Into::into));
        self
    }

    pub fn with_denied_roots<I, P>(mut self, roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.deny_roots.extend(roots.into_iter().map(Into::into));
        self
    }

    fn keeps(&self, name: &OsString, kind: EntryKind) -> bool {
        // Names that are not valid UTF-8 can never appear on a keep-list.
        let Some(name) = name.to_str() else {
            return false;
        };
        match kind {
            EntryKind::Directory => self.keep_dirs.contains(name),
            EntryKind::File | EntryKind::Other => self.keep_files.contains(name),
        }
    }
}

/// Progress notifications, emitted before the matching filesystem change.
#[derive(Debug)]
pub enum PruneEvent<'a> {
    RemovingFile(&'a str),
    RemovingDirectory(&'a str),
    Kept { name: &'a str, kind: EntryKind },
    Skipped(&'a str),
    Failed(&'a EntryFailure),
}

/// Filesystem seam for the destructive calls.
pub trait EntryRemover {
    fn remove_file(&self, path: &Path) -> io::Result<()>;
    fn remove_dir_all(&self, path: &Path) -> io::Result<()>;
    /// Removes a symbolic link without touching its target.
    fn remove_link(&self, path: &Path, points_to_dir: bool) -> io::Result<()>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FsRemover;

impl EntryRemover for FsRemover {
    fn remove_file(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }

    fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::remove_dir_all(path)
    }

    #[cfg(windows)]
    fn remove_link(&self, path: &Path, points_to_dir: bool) -> io::Result<()> {
        if points_to_dir {
            fs::remove_dir(path)
        } else {
            fs::remove_file(path)
        }
    }

    #[cfg(not(windows))]
    fn remove_link(&self, path: &Path, _points_to_dir: bool) -> io::Result<()> {
        fs::remove_file(path)
    }
}

struct Entry {
    name: OsString,
    path: PathBuf,
    kind: EntryKind,
    is_link: bool,
}

pub fn prune(plan: &PrunePlan) -> Result<PruneReport, PruneError> {
    prune_with(plan, &FsRemover, |_| {})
}

pub fn prune_with<R, F>(
    plan: &PrunePlan,
    remover: &R,
    mut on_event: F,
) -> Result<PruneReport, PruneError>
where
    R: EntryRemover + ?Sized,
    F: FnMut(&PruneEvent<'_>),
{
    let root = resolve_root(&plan.root)?;
    if !guard::is_allowed(&root, &plan.allow_roots, &plan.deny_roots) {
        warn!(root = %root.display(), "root refused by safety settings");
        return Err(PruneError::RootRefused(plan.root.clone()));
    }
    let listing = list_root(&root)?;
    let mut report = PruneReport::start(&plan.root);
    let mut aborted = false;

    for (name, path) in listing {
        let label = name.to_string_lossy().into_owned();
        if aborted {
            report.untouched.push(label);
            continue;
        }

        let entry = match classify(name, path) {
            Ok(entry) => entry,
            Err((name, err)) => {
                let failure = EntryFailure {
                    name: name.to_string_lossy().into_owned(),
                    kind: EntryKind::Other,
                    operation: Operation::Inspect,
                    error: err.to_string(),
                };
                aborted = record_failure(plan, &mut report, failure, &mut on_event);
                continue;
            }
        };
        debug!(name = %label, kind = %entry.kind, link = entry.is_link, "classified entry");

        if plan.keeps(&entry.name, entry.kind) {
            on_event(&PruneEvent::Kept {
                name: &label,
                kind: entry.kind,
            });
            report.kept.push(label);
            continue;
        }

        if entry.kind == EntryKind::Other && plan.special_entries == SpecialEntryPolicy::Skip {
            warn!(name = %label, "skipping entry that is neither a file nor a directory");
            on_event(&PruneEvent::Skipped(&label));
            report.skipped.push(label);
            continue;
        }

        let (operation, result) = match (entry.kind, entry.is_link) {
            (EntryKind::Directory, false) => {
                on_event(&PruneEvent::RemovingDirectory(&label));
                (
                    Operation::RemoveDirectory,
                    remover.remove_dir_all(&entry.path),
                )
            }
            (EntryKind::Directory, true) => {
                on_event(&PruneEvent::RemovingDirectory(&label));
                (Operation::RemoveLink, remover.remove_link(&entry.path, true))
            }
            (_, true) => {
                on_event(&PruneEvent::RemovingFile(&label));
                (Operation::RemoveLink, remover.remove_link(&entry.path, false))
            }
            (_, false) => {
                on_event(&PruneEvent::RemovingFile(&label));
                (Operation::RemoveFile, remover.remove_file(&entry.path))
            }
        };

        match result {
            Ok(()) => {
                info!(name = %label, kind = %entry.kind, "removed");
                if entry.kind == EntryKind::Directory {
                    report.deleted_dirs.push(label);
                } else {
                    report.deleted_files.push(label);
                }
            }
            Err(err) => {
                let failure = EntryFailure {
                    name: label,
                    kind: entry.kind,
                    operation,
                    error: err.to_string(),
                };
                aborted = record_failure(plan, &mut report, failure, &mut on_event);
            }
        }
    }

    Ok(report.finish(aborted))
}

/// Returns true when the run has to stop.
fn record_failure<F>(
    plan: &PrunePlan,
    report: &mut PruneReport,
    failure: EntryFailure,
    on_event: &mut F,
) -> bool
where
    F: FnMut(&PruneEvent<'_>),
{
    error!(name = %failure.name, error = %failure.error, "entry failed");
    on_event(&PruneEvent::Failed(&failure));
    report.failures.push(failure);
    plan.on_error == ErrorPolicy::Abort
}

/// Resolves links and `..` so the safety check sees the directory that
/// will actually be pruned.
fn resolve_root(root: &Path) -> Result<PathBuf, PruneError> {
    let resolved = fs::canonicalize(root).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            PruneError::RootMissing(root.to_path_buf())
        } else {
            PruneError::ListRoot {
                path: root.to_path_buf(),
                source,
            }
        }
    })?;
    if !resolved.is_dir() {
        return Err(PruneError::NotADirectory(root.to_path_buf()));
    }
    Ok(resolved)
}

/// Lists the immediate children of `root`, sorted by name.
fn list_root(root: &Path) -> Result<Vec<(OsString, PathBuf)>, PruneError> {
    let list_err = |source: io::Error| PruneError::ListRoot {
        path: root.to_path_buf(),
        source,
    };
    let mut entries = Vec::new();
    for entry in fs::read_dir(root).map_err(list_err)? {
        let entry = entry.map_err(list_err)?;
        entries.push((entry.file_name(), entry.path()));
    }
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(entries)
}

fn classify(name: OsString, path: PathBuf) -> Result<Entry, (OsString, io::Error)> {
    let link_meta = match fs::symlink_metadata(&path) {
        Ok(meta) => meta,
        Err(err) => return Err((name, err)),
    };
    let is_link = link_meta.file_type().is_symlink();
    let kind = if is_link {
        // A dangling link has no target to classify.
        match fs::metadata(&path) {
            Ok(target) => kind_of(&target),
            Err(_) => EntryKind::Other,
        }
    } else {
        kind_of(&link_meta)
    };
    Ok(Entry {
        name,
        path,
        kind,
        is_link,
    })
}

fn kind_of(meta: &fs::Metadata) -> EntryKind {
    if meta.is_dir() {
        EntryKind::Directory
    } else if meta.is_file() {
        EntryKind::File
    } else {
        EntryKind::Other
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::Outcome;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, "x").unwrap();
    }

    #[test]
    fn keeps_listed_names_and_removes_the_rest() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path();
        touch(&root.join("a.txt"));
        touch(&root.join("b.txt"));
        touch(&root.join("frontend/index.html"));
        touch(&root.join("tmp/cache.bin"));

        let plan = PrunePlan::new(root)
            .with_keep_files(["a.txt"])
            .with_keep_dirs(["frontend"]);
        let report = prune(&plan).unwrap();

        assert!(root.join("a.txt").is_file());
        assert!(root.join("frontend/index.html").is_file());
        assert!(!root.join("b.txt").exists());
        assert!(!root.join("tmp").exists());
        assert_eq!(report.deleted_files, vec!["b.txt"]);
        assert_eq!(report.deleted_dirs, vec!["tmp"]);
        assert_eq!(report.kept, vec!["a.txt", "frontend"]);
        assert_eq!(report.outcome, Outcome::Complete);
    }

    #[test]
    fn file_name_in_keep_dirs_is_not_kept() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path();
        touch(&root.join("docker"));
        fs::create_dir(root.join("README.md")).unwrap();

        let plan = PrunePlan::new(root)
            .with_keep_files(["README.md"])
            .with_keep_dirs(["docker"]);
        let report = prune(&plan).unwrap();

        assert!(!root.join("docker").exists());
        assert!(!root.join("README.md").exists());
        assert_eq!(report.deleted_files, vec!["docker"]);
        assert_eq!(report.deleted_dirs, vec!["README.md"]);
    }

    #[test]
    fn matching_is_case_sensitive() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path();
        touch(&root.join("readme.md"));

        let plan = PrunePlan::new(root).with_keep_files(["README.md"]);
        prune(&plan).unwrap();
        assert!(!root.join("readme.md").exists());
    }

    #[test]
    fn missing_root_fails_before_starting() {
        let temp = tempfile::tempdir().unwrap();
        let plan = PrunePlan::new(temp.path().join("nope"));
        assert!(matches!(prune(&plan), Err(PruneError::RootMissing(_))));

        let file = temp.path().join("file.txt");
        touch(&file);
        let plan = PrunePlan::new(&file);
        assert!(matches!(prune(&plan), Err(PruneError::NotADirectory(_))));
        assert!(file.exists());
    }

    #[test]
    fn events_precede_removals_in_name_order() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path();
        touch(&root.join("c.txt"));
        touch(&root.join("a.txt"));
        fs::create_dir(root.join("b")).unwrap();

        let mut seen = Vec::new();
        prune_with(&PrunePlan::new(root), &FsRemover, |event| match event {
            PruneEvent::RemovingFile(n) => seen.push(format!("file:{n}")),
            PruneEvent::RemovingDirectory(n) => seen.push(format!("dir:{n}")),
            _ => {}
        })
        .unwrap();
        assert_eq!(seen, vec!["file:a.txt", "dir:b", "file:c.txt"]);
    }

    #[cfg(unix)]
    #[test]
    fn symlinks_are_unlinked_without_touching_targets() {
        use std::os::unix::fs::symlink;

        let outside = tempfile::tempdir().unwrap();
        touch(&outside.path().join("data/keep.txt"));
        touch(&outside.path().join("target.txt"));

        let temp = tempfile::tempdir().unwrap();
        let root = temp.path();
        symlink(outside.path().join("data"), root.join("linked_dir")).unwrap();
        symlink(outside.path().join("target.txt"), root.join("linked_file")).unwrap();
        symlink(outside.path().join("data"), root.join("shared")).unwrap();

        let plan = PrunePlan::new(root).with_keep_dirs(["shared"]);
        let report = prune(&plan).unwrap();

        assert!(fs::symlink_metadata(root.join("linked_dir")).is_err());
        assert!(fs::symlink_metadata(root.join("linked_file")).is_err());
        assert!(root.join("shared").exists());
        assert!(outside.path().join("data/keep.txt").is_file());
        assert!(outside.path().join("target.txt").is_file());
        assert_eq!(report.deleted_dirs, vec!["linked_dir"]);
        assert_eq!(report.deleted_files, vec!["linked_file"]);
    }

    #[cfg(unix)]
    #[test]
    fn dangling_links_follow_special_entry_policy() {
        use std::os::unix::fs::symlink;

        let temp = tempfile::tempdir().unwrap();
        let root = temp.path();
        symlink(root.join("gone"), root.join("dangling")).unwrap();

        let report = prune(&PrunePlan::new(root)).unwrap();
        assert_eq!(report.skipped, vec!["dangling"]);
        assert!(fs::symlink_metadata(root.join("dangling")).is_ok());

        let plan = PrunePlan::new(root).with_special_entries(SpecialEntryPolicy::Remove);
        let report = prune(&plan).unwrap();
        assert_eq!(report.deleted_files, vec!["dangling"]);
        assert!(fs::symlink_metadata(root.join("dangling")).is_err());
    }
    #[test]
    fn denied_root_is_refused_through_dot_dot() {
        let temp = tempfile::tempdir().unwrap();
        let base = temp.path();
        fs::create_dir(base.join("other")).unwrap();
        touch(&base.join("project/precious.txt"));

        let plan = PrunePlan::new(base.join("other/../project"))
            .with_denied_roots([base.join("project")]);
        assert!(matches!(prune(&plan), Err(PruneError::RootRefused(_))));
        assert!(base.join("project/precious.txt").is_file());
    }

    #[test]
    fn allow_list_matches_whole_components() {
        let temp = tempfile::tempdir().unwrap();
        let base = temp.path();
        fs::create_dir(base.join("dev")).unwrap();
        touch(&base.join("developer/build.log"));

        let plan =
            PrunePlan::new(base.join("developer")).with_allowed_roots([base.join("dev")]);
        assert!(matches!(prune(&plan), Err(PruneError::RootRefused(_))));
        assert!(base.join("developer/build.log").is_file());

        let plan = PrunePlan::new(base.join("developer"))
            .with_allowed_roots([base.join("developer")]);
        let report = prune(&plan).unwrap();
        assert_eq!(report.deleted_files, vec!["build.log"]);
    }

    /// Deletes a later sibling while removing the first entry, so that
    /// sibling vanishes between listing and inspection.
    struct RemovesSibling(PathBuf);

    impl EntryRemover for RemovesSibling {
        fn remove_file(&self, path: &Path) -> io::Result<()> {
            let _ = fs::remove_file(&self.0);
            fs::remove_file(path)
        }

        fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
            fs::remove_dir_all(path)
        }

        fn remove_link(&self, path: &Path, _points_to_dir: bool) -> io::Result<()> {
            fs::remove_file(path)
        }
    }

    #[test]
    fn entry_vanishing_before_inspection_is_a_failure() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path();
        touch(&root.join("a.txt"));
        touch(&root.join("b.txt"));
        touch(&root.join("c.txt"));

        let remover = RemovesSibling(fs::canonicalize(root).unwrap().join("b.txt"));
        let plan = PrunePlan::new(root).with_error_policy(ErrorPolicy::Continue);
        let report = prune_with(&plan, &remover, |_| {}).unwrap();

        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].name, "b.txt");
        assert_eq!(report.failures[0].operation, Operation::Inspect);
        assert_eq!(report.deleted_files, vec!["a.txt", "c.txt"]);
        assert_eq!(report.outcome, Outcome::Partial { failed: 1 });
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_names_are_never_kept() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let temp = tempfile::tempdir().unwrap();
        let root = temp.path();
        let odd = root.join(OsStr::from_bytes(b"\xff"));
        touch(&odd);

        let plan = PrunePlan::new(root).with_keep_files(["\u{FFFD}"]);
        let report = prune(&plan).unwrap();

        assert!(fs::symlink_metadata(&odd).is_err());
        assert_eq!(report.deleted_files, vec!["\u{FFFD}"]);
    }
}
