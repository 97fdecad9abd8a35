use crate::pruner::PrunePlan;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub prune: PruneConfig,
    #[serde(default)]
    pub safety: SafetyConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PruneConfig {
    #[serde(default)]
    pub root: Option<String>,
    #[serde(default)]
    pub keep_files: BTreeSet<String>,
    #[serde(default)]
    pub keep_dirs: BTreeSet<String>,
    #[serde(default)]
    pub on_error: ErrorPolicy,
    #[serde(default)]
    pub special_entries: SpecialEntryPolicy,
}

/// Roots are matched by whole path components after resolving links and `..`.
/// Deny always overrides allow.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SafetyConfig {
    #[serde(default)]
    pub allow_roots: Vec<String>,
    #[serde(default)]
    pub deny_roots: Vec<String>,
}

/// What to do when removing a single entry fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Stop at the first failure and leave the remaining entries alone.
    #[default]
    Abort,
    /// Record the failure and keep going.
    Continue,
}

/// Handling for entries that are neither a regular file nor a directory
/// (dangling links, sockets, FIFOs, devices).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpecialEntryPolicy {
    #[default]
    Skip,
    /// Unlink the entry unless its name is in the keep-files set.
    Remove,
}

/// Values supplied on the command line; each one replaces the file setting.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub root: Option<String>,
    pub keep_files: Option<Vec<String>>,
    pub keep_dirs: Option<Vec<String>>,
    pub on_error: Option<String>,
    pub special_entries: Option<String>,
}

impl AppConfig {
    pub fn plan(&self) -> anyhow::Result<PrunePlan> {
        let root = self
            .prune
            .root
            .as_deref()
            .filter(|r| !r.trim().is_empty())
            .ok_or_else(|| {
                anyhow::anyhow!("no root path configured (set prune.root or pass --root)")
            })?;
        Ok(PrunePlan::new(root)
            .with_keep_files(self.prune.keep_files.iter().cloned())
            .with_keep_dirs(self.prune.keep_dirs.iter().cloned())
            .with_error_policy(self.prune.on_error)
            .with_special_entries(self.prune.special_entries)
            .with_allowed_roots(self.safety.allow_roots.iter().map(PathBuf::from))
            .with_denied_roots(self.safety.deny_roots.iter().map(PathBuf::from)))
    }
}

pub fn load(path: Option<&str>, overrides: &Overrides) -> anyhow::Result<AppConfig> {
    let mut settings = config::Config::builder();
    if let Some(p) = path {
        settings = settings.add_source(config::File::with_name(p));
    } else {
        settings = settings.add_source(config::File::with_name("config/default").required(false));
    }
    if let Some(root) = &overrides.root {
        settings = settings.set_override("prune.root", root.as_str())?;
    }
    if let Some(files) = &overrides.keep_files {
        settings = settings.set_override("prune.keep_files", files.clone())?;
    }
    if let Some(dirs) = &overrides.keep_dirs {
        settings = settings.set_override("prune.keep_dirs", dirs.clone())?;
    }
    if let Some(policy) = &overrides.on_error {
        settings = settings.set_override("prune.on_error", policy.as_str())?;
    }
    if let Some(policy) = &overrides.special_entries {
        settings = settings.set_override("prune.special_entries", policy.as_str())?;
    }
    let cfg = settings.build()?;
    Ok(cfg.try_deserialize()?)
}
