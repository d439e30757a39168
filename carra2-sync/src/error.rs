//! Error types for carra2-sync.

use std::path::PathBuf;

use thiserror::Error;

use carra2_core::DatasetKind;

/// All errors that can arise from sync operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The progress log was read but holds no `DTG=` line.
    #[error("DTG not found in {path}")]
    NoProgressMarker { path: PathBuf },

    /// No `OBS.<TYPE>.LOCALPATH` for a dataset that dispatch must visit.
    #[error("no destination path found for {dataset}")]
    MissingDestination { dataset: DatasetKind },

    /// An external tool could not be started.
    #[error("failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// An external tool ran and reported failure.
    #[error("`{program}` failed ({status}): {stderr}")]
    ToolFailed {
        program: String,
        status: String,
        stderr: String,
    },

    /// The reconcile step found no staged month directories to merge.
    #[error("nothing staged under {path}")]
    NothingStaged { path: PathBuf },

    /// A staging glob pattern could not be compiled.
    #[error("invalid staging pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}
