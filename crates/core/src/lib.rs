//! Core library: configuration, the root-level pruner, and run reports.

pub mod config;
pub mod error;
pub mod guard;
pub mod pruner;
pub mod report;

pub use error::PruneError;
pub use pruner::{prune, prune_with, EntryRemover, FsRemover, PruneEvent, PrunePlan};
pub use report::{EntryFailure, EntryKind, Outcome, PruneReport};
