//! Archive scanning and the filename date contract.
//!
//! Archived tarballs are named with a fixed-length prefix followed by the
//! `YYYYMMDD` date of their content, e.g. `carra2_ex_19840901_a.tar.gz`.
//! The date is read from a fixed byte offset of the name with the suffix
//! stripped; [`FilenameContract`] names that offset and width.

use std::path::{Path, PathBuf};

use carra2_core::StreamId;

use crate::error::PeriodError;

/// Fixed-offset location of the date token in an archive file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilenameContract {
    /// Suffix stripped before measuring the name.
    pub suffix: &'static str,
    /// Byte offset of the first token character (0-indexed).
    pub offset: usize,
    /// Token length in bytes.
    pub width: usize,
}

/// The contract for `<stream>/archive/extract/*.tar.gz` files.
pub const ARCHIVE_FILENAME: FilenameContract = FilenameContract {
    suffix: ".tar.gz",
    offset: 10,
    width: 8,
};

/// Classification of one file name against a [`FilenameContract`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateToken<'a> {
    /// A well-formed `YYYYMMDD` token.
    Date(&'a str),
    /// The stem is shorter than `offset + width`; skipped without comment.
    TooShort,
    /// Long enough, but the token is not eight ASCII digits.
    Malformed,
}

impl FilenameContract {
    /// Minimum stem length for a name to carry a token.
    pub fn min_len(&self) -> usize {
        self.offset + self.width
    }

    pub fn classify<'a>(&self, file_name: &'a str) -> DateToken<'a> {
        let stem = file_name.strip_suffix(self.suffix).unwrap_or(file_name);
        if stem.len() < self.min_len() {
            return DateToken::TooShort;
        }
        match stem.get(self.offset..self.min_len()) {
            Some(token) if token.bytes().all(|b| b.is_ascii_digit()) => DateToken::Date(token),
            _ => DateToken::Malformed,
        }
    }
}

/// Glob pattern matching the archived tarballs of `stream` under `root`.
///
/// The root and stream are escaped so only the trailing `*.tar.gz` is a wildcard.
pub fn archive_pattern(root: &Path, stream: &StreamId) -> String {
    let base = root.join(&stream.0).join("archive").join("extract");
    format!(
        "{}/*{}",
        glob::Pattern::escape(&base.to_string_lossy()),
        ARCHIVE_FILENAME.suffix
    )
}

/// Enumerate the archive files of `stream`.
///
/// A pattern error fails the whole stream; unreadable individual entries are
/// logged and left out.
pub fn list_archive_files(root: &Path, stream: &StreamId) -> Result<Vec<PathBuf>, PeriodError> {
    let pattern = archive_pattern(root, stream);
    let entries = glob::glob(&pattern).map_err(|source| PeriodError::Pattern {
        pattern: pattern.clone(),
        source,
    })?;

    let mut files = Vec::new();
    for entry in entries {
        match entry {
            Ok(path) => files.push(path),
            Err(err) => tracing::warn!(stream = %stream, error = %err, "unreadable archive entry"),
        }
    }
    Ok(files)
}

/// Extract the date tokens of `files`, sorted ascending.
///
/// Fixed-width zero-padded tokens sort chronologically as strings.
pub fn date_tokens(stream: &StreamId, files: &[PathBuf]) -> Vec<String> {
    let mut dates = Vec::with_capacity(files.len());
    for file in files {
        let Some(name) = file.file_name().map(|n| n.to_string_lossy()) else {
            continue;
        };
        match ARCHIVE_FILENAME.classify(&name) {
            DateToken::Date(token) => dates.push(token.to_owned()),
            DateToken::TooShort => {}
            DateToken::Malformed => {
                tracing::warn!(stream = %stream, file = %name, "malformed archive file name");
            }
        }
    }
    dates.sort();
    dates
}
