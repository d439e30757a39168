//! Flat-text period tables.
//!
//! Each line is `stream_id start end`, whitespace separated. The previous
//! run's table (`periods_prev.txt`) is read if present; the new table
//! (`periods.txt`) is always recreated from scratch.

use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use carra2_core::StreamId;

use crate::error::{io_err, PeriodError};

/// Default name of the previous run's table.
pub const PRIOR_TABLE: &str = "periods_prev.txt";

/// Default name of the table written by this run.
pub const OUTPUT_TABLE: &str = "periods.txt";

/// One `stream start end` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodRecord {
    pub stream: StreamId,
    pub start: String,
    pub end: String,
}

impl fmt::Display for PeriodRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.stream, self.start, self.end)
    }
}

/// Third column of the previous table, keyed by stream.
///
/// That column is the previous run's end date; it becomes the new start.
pub type PriorPeriods = HashMap<StreamId, String>;

/// Parse a previous table. Lines that do not have exactly three fields are ignored.
pub fn parse_prior(contents: &str) -> PriorPeriods {
    let mut prior = PriorPeriods::new();
    for line in contents.lines() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if let [stream, _start, end] = fields.as_slice() {
            prior.insert(StreamId::from(*stream), (*end).to_owned());
        } else if !fields.is_empty() {
            tracing::debug!(line, "ignoring period line without three fields");
        }
    }
    prior
}

/// Load the previous table at `path`.
///
/// Returns `Ok(None)` when the file does not exist (first run); any other
/// read failure is an error.
pub fn load_prior_at(path: &Path) -> Result<Option<PriorPeriods>, PeriodError> {
    match std::fs::read_to_string(path) {
        Ok(contents) => Ok(Some(parse_prior(&contents))),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(io_err(path, err)),
    }
}

/// Sequential writer for a fresh period table.
///
/// The file is truncated on [`create`](Self::create); lines are appended in
/// call order and flushed by [`finish`](Self::finish).
pub struct PeriodTableWriter {
    path: PathBuf,
    out: BufWriter<File>,
    lines: usize,
}

impl PeriodTableWriter {
    pub fn create(path: &Path) -> Result<Self, PeriodError> {
        let file = File::create(path).map_err(|e| io_err(path, e))?;
        Ok(Self {
            path: path.to_path_buf(),
            out: BufWriter::new(file),
            lines: 0,
        })
    }

    pub fn append(&mut self, record: &PeriodRecord) -> Result<(), PeriodError> {
        writeln!(self.out, "{record}").map_err(|e| io_err(&self.path, e))?;
        self.lines += 1;
        Ok(())
    }

    /// Flush buffered lines; returns the number of lines written.
    pub fn finish(mut self) -> Result<usize, PeriodError> {
        self.out.flush().map_err(|e| io_err(&self.path, e))?;
        Ok(self.lines)
    }
}
