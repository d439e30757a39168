//! Progress log reader.
//!
//! Another pipeline stage appends lines such as
//! `DTG=2024120100 other fields ...` to each stream's `progress.log`. The
//! first line starting with `DTG=` is the stream's current position; only its
//! first whitespace-separated word is used.

use std::path::Path;

use crate::error::{io_err, SyncError};

/// Literal prefix of the progress marker line.
pub const DTG_MARKER: &str = "DTG=";

/// Return the raw DTG token from log `contents`, if a marker line exists.
///
/// The token is not validated here; an empty marker yields `Some("")`.
pub fn find_marker(contents: &str) -> Option<&str> {
    contents
        .lines()
        .find(|line| line.starts_with(DTG_MARKER))
        .map(|line| {
            let first = line.split_whitespace().next().unwrap_or_default();
            first.strip_prefix(DTG_MARKER).unwrap_or(first)
        })
}

/// Read the log at `path` and return its raw DTG token.
pub fn read_marker_at(path: &Path) -> Result<String, SyncError> {
    let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    find_marker(&contents)
        .map(str::to_owned)
        .ok_or_else(|| SyncError::NoProgressMarker {
            path: path.to_path_buf(),
        })
}
