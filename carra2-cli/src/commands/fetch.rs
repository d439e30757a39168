//! `carra2 fetch`: December-triggered observation fetch for every stream.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use carra2_core::{config, Settings, StreamId};
use carra2_sync::{
    pipeline::{self, FetchOptions, FetchScope},
    DatasetStatus, RunReport, StagingPolicy, StreamState, SystemRunner,
};

/// Arguments for `carra2 fetch`.
#[derive(Args, Debug)]
pub struct FetchArgs {
    /// Stream configuration file.
    #[arg(long, default_value = config::DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Evaluate a single stream instead of all of them.
    #[arg(long, value_name = "ID")]
    pub stream: Option<String>,

    /// Report what would be fetched without creating directories or running tools.
    #[arg(long)]
    pub dry_run: bool,

    /// Fail the staged dataset when its staging copy reports an error.
    #[arg(long)]
    pub require_staging: bool,

    /// Emit the run report as JSON.
    #[arg(long)]
    pub json: bool,

    /// Exit with status 1 when any stream or dataset failed.
    #[arg(long)]
    pub strict: bool,
}

impl FetchArgs {
    pub fn run(self) -> Result<ExitCode> {
        let settings = Settings::from_env();
        match &settings.lib_root {
            Some(root) => tracing::info!(lib_root = %root.display(), "using library root"),
            None => tracing::warn!("{} is not set", config::LIB_ROOT_ENV),
        }

        let cfg = config::load_at(&self.config)
            .with_context(|| format!("failed to load configuration '{}'", self.config.display()))?;

        let options = FetchOptions {
            scope: match self.stream {
                Some(name) => FetchScope::Stream(StreamId::from(name)),
                None => FetchScope::All,
            },
            dry_run: self.dry_run,
            staging: if self.require_staging {
                StagingPolicy::Require
            } else {
                StagingPolicy::Tolerate
            },
        };
        let report = pipeline::run(&cfg, &settings, &SystemRunner, &options);

        if self.json {
            println!(
                "{}",
                report
                    .to_json_pretty()
                    .context("failed to serialize fetch report")?
            );
        } else {
            print_table(&report, self.dry_run);
        }

        if self.strict && report.has_failures() {
            return Ok(ExitCode::FAILURE);
        }
        Ok(ExitCode::SUCCESS)
    }
}

#[derive(Tabled)]
struct StreamRow {
    #[tabled(rename = "stream")]
    stream: String,
    #[tabled(rename = "state")]
    state: String,
    #[tabled(rename = "dtg")]
    dtg: String,
    #[tabled(rename = "detail")]
    detail: String,
}

fn print_table(report: &RunReport, dry_run: bool) {
    let prefix = if dry_run { "[dry-run] " } else { "" };
    println!(
        "{prefix}carra2 v{} | {} streams | {} triggered | {} failed | {} staging warnings",
        env!("CARGO_PKG_VERSION"),
        report.streams.len(),
        report.triggered_count(),
        report.failure_count(),
        report.staging_warnings(),
    );
    if report.streams.is_empty() {
        println!("No streams configured.");
        return;
    }

    let rows: Vec<StreamRow> = report
        .streams
        .iter()
        .map(|outcome| StreamRow {
            stream: outcome.stream.to_string(),
            state: state_label(&outcome.state),
            dtg: match &outcome.state {
                StreamState::NotDecember { dtg } | StreamState::Triggered { dtg, .. } => dtg.to_string(),
                StreamState::ParseFailed { value, .. } => value.clone(),
                _ => "-".to_string(),
            },
            detail: state_detail(&outcome.state),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
}

fn state_label(state: &StreamState) -> String {
    match state {
        StreamState::Inactive => "INACTIVE".bright_black().to_string(),
        StreamState::ProgressUnknown { .. } => "NO PROGRESS".red().bold().to_string(),
        StreamState::ParseFailed { .. } => "BAD DTG".red().bold().to_string(),
        StreamState::NotDecember { .. } => "WAITING".green().to_string(),
        StreamState::Triggered { dispatch, .. } if dispatch.has_failures() => {
            "TRIGGERED".yellow().bold().to_string()
        }
        StreamState::Triggered { .. } => "TRIGGERED".green().bold().to_string(),
    }
}

fn state_detail(state: &StreamState) -> String {
    match state {
        StreamState::Inactive => "inactive".to_string(),
        StreamState::ProgressUnknown { reason } | StreamState::ParseFailed { reason, .. } => reason.clone(),
        StreamState::NotDecember { .. } => "no action needed".to_string(),
        StreamState::Triggered { dispatch, .. } => {
            let mut parts: Vec<String> = dispatch
                .datasets
                .iter()
                .map(|d| format!("{} {}", d.dataset, dataset_detail(&d.status)))
                .collect();
            if let Some(reason) = &dispatch.aborted {
                parts.push(format!("aborted: {reason}"));
            }
            format!("{}: {}", dispatch.year, parts.join(", "))
        }
    }
}

fn dataset_detail(status: &DatasetStatus) -> String {
    match status {
        DatasetStatus::Synced {
            staging_warnings: 0,
            ..
        } => "synced".to_string(),
        DatasetStatus::Synced {
            staging_warnings, ..
        } => format!("synced ({staging_warnings} staging warning)"),
        DatasetStatus::WouldSync { .. } => "would sync".to_string(),
        DatasetStatus::Ineligible { window } => format!("skipped ({window})"),
        DatasetStatus::Failed { reason } => format!("failed: {reason}"),
    }
}
