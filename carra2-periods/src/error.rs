//! Error types for carra2-periods.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise while tracking archive periods.
#[derive(Debug, Error)]
pub enum PeriodError {
    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The archive glob pattern for a stream could not be compiled.
    #[error("invalid archive pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
}

/// Convenience constructor for [`PeriodError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> PeriodError {
    PeriodError::Io {
        path: path.into(),
        source,
    }
}
