//! `carra2 periods`: rebuild the period table from archived tarballs.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use carra2_core::{Settings, StreamId};
use carra2_periods::{
    table::{OUTPUT_TABLE, PRIOR_TABLE},
    StartSource, TrackerOptions, TrackerReport,
};

/// Arguments for `carra2 periods`.
#[derive(Args, Debug)]
pub struct PeriodsArgs {
    /// Table written by the previous run.
    #[arg(long, default_value = PRIOR_TABLE)]
    pub prev: PathBuf,

    /// Table to (re)write.
    #[arg(long, default_value = OUTPUT_TABLE)]
    pub out: PathBuf,

    /// Root holding `<stream>/archive/extract/*.tar.gz`.
    #[arg(long)]
    pub archive_root: Option<PathBuf>,

    /// Restrict the scan to these streams (repeatable).
    #[arg(long = "stream", value_name = "ID")]
    pub streams: Vec<String>,
}

impl PeriodsArgs {
    pub fn run(self) -> Result<ExitCode> {
        let settings = Settings::from_env();
        let mut options = TrackerOptions {
            archive_root: self.archive_root.unwrap_or(settings.archive_root),
            prior_path: self.prev,
            output_path: self.out,
            ..TrackerOptions::default()
        };
        if !self.streams.is_empty() {
            options.streams = self.streams.into_iter().map(StreamId::from).collect();
        }

        let report = carra2_periods::run(&options).with_context(|| {
            format!("period tracking failed for '{}'", options.output_path.display())
        })?;
        print_report(&report, &options);
        Ok(ExitCode::SUCCESS)
    }
}

#[derive(Tabled)]
struct PeriodRow {
    #[tabled(rename = "stream")]
    stream: String,
    #[tabled(rename = "start")]
    start: String,
    #[tabled(rename = "end")]
    end: String,
    #[tabled(rename = "start from")]
    source: String,
    #[tabled(rename = "files")]
    files: usize,
}

fn print_report(report: &TrackerReport, options: &TrackerOptions) {
    println!(
        "carra2 v{} | {} streams | {} periods | {} empty | {} failed",
        env!("CARGO_PKG_VERSION"),
        options.streams.len(),
        report.periods.len(),
        report.empty.len(),
        report.failed.len(),
    );
    if !report.had_prior {
        println!(
            "{} no previous table at {}; starts are observed",
            "note:".yellow().bold(),
            options.prior_path.display()
        );
    }

    if !report.periods.is_empty() {
        let rows: Vec<PeriodRow> = report
            .periods
            .iter()
            .map(|p| PeriodRow {
                stream: p.stream.to_string(),
                start: p.start.clone(),
                end: p.end.clone(),
                source: match p.start_source {
                    StartSource::CarriedOver => "previous table".to_string(),
                    StartSource::Observed => "archive".to_string(),
                },
                files: p.files,
            })
            .collect();
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
    }

    for (stream, reason) in &report.failed {
        println!("{} {stream}: {reason}", "FAILED".red().bold());
    }
    println!("Wrote {}", options.output_path.display());
}
