//! Error types for carra2-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise while loading the stream configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Underlying I/O failure while reading the document.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file did not exist at the given path.
    #[error("configuration not found at {path}")]
    NotFound { path: PathBuf },

    /// YAML parse error on load; includes file path and line context from serde_yaml.
    #[error("failed to parse configuration at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Rejections produced when parsing a `YYYYMMDDHH` date-time-group.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DtgError {
    #[error("DTG '{value}' must be exactly 10 digits (YYYYMMDDHH)")]
    Format { value: String },

    #[error("DTG '{value}' is not a valid calendar date")]
    Date { value: String },

    #[error("DTG '{value}' has hour out of range 00-23")]
    Hour { value: String },
}
