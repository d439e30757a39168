//! Period tracker: observed coverage merged with the previous run's table.
//!
//! Per stream:
//! 1. list the archive tarballs and extract their date tokens;
//! 2. no tokens → the stream is left out of the table;
//! 3. observed start is `min + "00"`, observed end is `max + "23"`;
//! 4. the emitted start is the previous table's third column when the stream
//!    was listed there, otherwise the observed start;
//! 5. the emitted end is always the observed end.
//!
//! A stream whose archive cannot be globbed is logged and skipped. Failing to
//! read the previous table or to write the new one aborts the run.

use std::path::{Path, PathBuf};

use carra2_core::{config::DEFAULT_ARCHIVE_ROOT, StreamId};
use serde::Serialize;

use crate::archive;
use crate::error::PeriodError;
use crate::table::{self, PeriodRecord, PeriodTableWriter, PriorPeriods};

/// Streams tracked when no explicit list is given.
pub const DEFAULT_STREAMS: [&str; 8] = [
    "carra2_198409",
    "carra2_198909",
    "carra2_199409",
    "carra2_199909",
    "carra2_200409",
    "carra2_200909",
    "carra2_201409",
    "carra2_201909",
];

/// Where the emitted start date came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StartSource {
    /// Copied verbatim from the previous table.
    CarriedOver,
    /// Earliest archived date of this run.
    Observed,
}

/// Coverage of one stream as emitted by this run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreamPeriod {
    pub stream: StreamId,
    pub start: String,
    pub end: String,
    pub start_source: StartSource,
    /// Number of archive files that carried a date token.
    pub files: usize,
}

impl StreamPeriod {
    pub fn record(&self) -> PeriodRecord {
        PeriodRecord {
            stream: self.stream.clone(),
            start: self.start.clone(),
            end: self.end.clone(),
        }
    }
}

/// Inputs of a tracker run.
#[derive(Debug, Clone)]
pub struct TrackerOptions {
    pub streams: Vec<StreamId>,
    pub archive_root: PathBuf,
    pub prior_path: PathBuf,
    pub output_path: PathBuf,
}

impl Default for TrackerOptions {
    fn default() -> Self {
        Self {
            streams: DEFAULT_STREAMS.iter().map(|s| StreamId::from(*s)).collect(),
            archive_root: PathBuf::from(DEFAULT_ARCHIVE_ROOT),
            prior_path: PathBuf::from(table::PRIOR_TABLE),
            output_path: PathBuf::from(table::OUTPUT_TABLE),
        }
    }
}

/// Outcome of a tracker run.
#[derive(Debug, Default, Serialize)]
pub struct TrackerReport {
    /// `true` when a previous table was found and consulted.
    pub had_prior: bool,
    /// Lines written, in stream order.
    pub periods: Vec<StreamPeriod>,
    /// Streams with no dated archive files.
    pub empty: Vec<StreamId>,
    /// Streams skipped because their archive could not be listed.
    pub failed: Vec<(StreamId, String)>,
}

/// Merge sorted date tokens with the previous start for one stream.
///
/// Returns `None` when `dates` is empty.
pub fn merge(stream: &StreamId, dates: &[String], prior: Option<&PriorPeriods>) -> Option<StreamPeriod> {
    let (first, last) = (dates.first()?, dates.last()?);
    let observed_start = format!("{first}00");
    let end = format!("{last}23");

    let (start, start_source) = match prior.and_then(|p| p.get(stream)) {
        Some(previous) => (previous.clone(), StartSource::CarriedOver),
        None => (observed_start, StartSource::Observed),
    };

    Some(StreamPeriod {
        stream: stream.clone(),
        start,
        end,
        start_source,
        files: dates.len(),
    })
}

/// Run the tracker: read the previous table, scan every stream, rewrite the output table.
pub fn run(options: &TrackerOptions) -> Result<TrackerReport, PeriodError> {
    run_with(options, archive::list_archive_files)
}

/// [`run`] with the archive listing supplied by the caller.
fn run_with<F>(options: &TrackerOptions, list_files: F) -> Result<TrackerReport, PeriodError>
where
    F: Fn(&Path, &StreamId) -> Result<Vec<PathBuf>, PeriodError>,
{
    let prior = table::load_prior_at(&options.prior_path)?;
    match &prior {
        Some(p) => tracing::info!(
            path = %options.prior_path.display(),
            streams = p.len(),
            "loaded previous periods",
        ),
        None => tracing::info!(
            path = %options.prior_path.display(),
            "no previous periods; starting from observed dates",
        ),
    }

    let mut writer = PeriodTableWriter::create(&options.output_path)?;
    let mut report = TrackerReport {
        had_prior: prior.is_some(),
        ..TrackerReport::default()
    };

    for stream in &options.streams {
        tracing::info!(stream = %stream, "processing stream");

        let files = match list_files(&options.archive_root, stream) {
            Ok(files) => files,
            Err(err) => {
                tracing::error!(stream = %stream, error = %err, "cannot list archive; skipping stream");
                report.failed.push((stream.clone(), err.to_string()));
                continue;
            }
        };

        let dates = archive::date_tokens(stream, &files);
        let Some(period) = merge(stream, &dates, prior.as_ref()) else {
            tracing::info!(stream = %stream, "no archived files");
            report.empty.push(stream.clone());
            continue;
        };

        writer.append(&period.record())?;
        tracing::debug!(
            stream = %stream,
            start = %period.start,
            end = %period.end,
            source = ?period.start_source,
            "period recorded",
        );
        report.periods.push(period);
    }

    let written = writer.finish()?;
    tracing::info!(
        path = %options.output_path.display(),
        lines = written,
        "new periods written",
    );
    Ok(report)
}
