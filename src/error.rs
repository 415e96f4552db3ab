use std::io;
use thiserror::Error;

pub type ExtractResult<T> = Result<T, ExtractError>;

/// Failure to build a [`crate::FileInfo`] for one observed path.
///
/// Extractors only report these; the traversal that called them decides whether to
/// skip the path or abort.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Failed to read content of {path}: {source}")]
    ContentRead { path: String, source: io::Error },

    #[error("Failed to resolve symlink target of {path}: {source}")]
    SymlinkResolve { path: String, source: io::Error },

    #[error("Failed to open {path} for reading: {source}")]
    FileOpen { path: String, source: io::Error },

    #[error("Failed to stat {path}: {source}")]
    Metadata { path: String, source: io::Error },

    #[error("Malformed archive entry: {source}")]
    Archive { source: io::Error },
}

impl ExtractError {
    /// The logical path the failure is attached to, if any.
    pub fn path(&self) -> Option<&str> {
        match self {
            ExtractError::ContentRead { path, .. }
            | ExtractError::SymlinkResolve { path, .. }
            | ExtractError::FileOpen { path, .. }
            | ExtractError::Metadata { path, .. } => Some(path),
            ExtractError::Archive { .. } => None,
        }
    }
}
