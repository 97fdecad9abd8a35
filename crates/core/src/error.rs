use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failures that stop a run before any entry has been touched.
#[derive(Debug, Error)]
pub enum PruneError {
    #[error("root path {} does not exist", .0.display())]
    RootMissing(PathBuf),
    #[error("root path {} is not a directory", .0.display())]
    NotADirectory(PathBuf),
    #[error("root path {} is refused by the safety settings", .0.display())]
    RootRefused(PathBuf),
    #[error("cannot list {}: {source}", path.display())]
    ListRoot { path: PathBuf, source: io::Error },
}
