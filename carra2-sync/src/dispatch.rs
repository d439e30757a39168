//! Per-year dataset dispatch.
//!
//! ## Dispatch order for one year
//!
//! For each [`DatasetKind`] in [`DatasetKind::ALL`] order:
//!
//! 1. Resolve the destination root. Missing → abort the call; datasets not
//!    yet visited get no outcome.
//! 2. Year outside the dataset's window → [`DatasetStatus::Ineligible`].
//! 3. Direct copy: ensure `<root>/<year>`, bulk-copy the remote year into it.
//! 4. Stage and reshuffle: ensure `<root>/<year>`, stage the remote year into
//!    `<root>/<year>/<year>` (see [`StagingPolicy`]), merge the `??` month
//!    folders up into `<root>/<year>`, then remove the staging directory.
//!
//! A failing dataset is recorded and the next one is still visited.

use std::path::{Path, PathBuf};

use serde::Serialize;

use carra2_core::{Config, DatasetKind, ProcedureKind, Settings};

use crate::error::{io_err, SyncError};
use crate::policy::DatasetSyncPolicy;
use crate::tools::{self, ToolRunner};

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// What happened to one dataset for one year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DatasetStatus {
    /// Data was fetched into `year_dir`.
    Synced {
        year_dir: PathBuf,
        /// Staging failures tolerated on the way.
        staging_warnings: usize,
    },
    /// `--dry-run`: the dataset *would* have been fetched into `year_dir`.
    WouldSync { year_dir: PathBuf },
    /// The year lies outside the dataset's window; nothing was done.
    Ineligible { window: String },
    /// The fetch failed; later datasets were still visited.
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetOutcome {
    pub dataset: DatasetKind,
    #[serde(flatten)]
    pub status: DatasetStatus,
}

/// Result of dispatching one year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    pub year: i32,
    pub datasets: Vec<DatasetOutcome>,
    /// Set when the call stopped early on a missing destination root.
    pub aborted: Option<String>,
}

impl DispatchReport {
    pub fn has_failures(&self) -> bool {
        self.aborted.is_some()
            || self
                .datasets
                .iter()
                .any(|d| matches!(d.status, DatasetStatus::Failed { .. }))
    }

    pub fn staging_warnings(&self) -> usize {
        self.datasets
            .iter()
            .map(|d| match d.status {
                DatasetStatus::Synced {
                    staging_warnings, ..
                } => staging_warnings,
                _ => 0,
            })
            .sum()
    }
}

/// How a failed staging copy is treated by the stage-and-reshuffle procedure.
///
/// The remote directory copy tool is known to report failure even when it
/// staged the data, so the default is [`StagingPolicy::Tolerate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StagingPolicy {
    /// Log a warning, count it, and continue with the merge.
    #[default]
    Tolerate,
    /// Fail the dataset.
    Require,
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

/// Everything dispatch needs, borrowed from the caller.
pub struct Dispatcher<'a> {
    pub config: &'a Config,
    pub settings: &'a Settings,
    pub runner: &'a dyn ToolRunner,
    pub staging: StagingPolicy,
    pub dry_run: bool,
}

impl<'a> Dispatcher<'a> {
    pub fn new(config: &'a Config, settings: &'a Settings, runner: &'a dyn ToolRunner) -> Self {
        Self {
            config,
            settings,
            runner,
            staging: StagingPolicy::default(),
            dry_run: false,
        }
    }

    pub fn with_staging(mut self, staging: StagingPolicy) -> Self {
        self.staging = staging;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Dispatch every dataset for `year`.
    pub fn dispatch_year(&self, year: i32) -> DispatchReport {
        let mut report = DispatchReport {
            year,
            datasets: Vec::with_capacity(DatasetKind::ALL.len()),
            aborted: None,
        };

        for kind in DatasetKind::ALL {
            let policy = match DatasetSyncPolicy::resolve(self.config, kind) {
                Ok(policy) => policy,
                Err(err) => {
                    tracing::error!(dataset = %kind, year, error = %err, "aborting dispatch");
                    report.aborted = Some(err.to_string());
                    break;
                }
            };

            let status = self.dispatch_dataset(&policy, year);
            report.datasets.push(DatasetOutcome {
                dataset: kind,
                status,
            });
        }
        report
    }

    /// Dispatch one resolved dataset. Errors are folded into [`DatasetStatus::Failed`].
    pub fn dispatch_dataset(&self, policy: &DatasetSyncPolicy, year: i32) -> DatasetStatus {
        if !policy.is_eligible(year) {
            tracing::debug!(
                dataset = %policy.kind,
                year,
                window = %policy.eligible_years,
                "year outside dataset window",
            );
            return DatasetStatus::Ineligible {
                window: policy.eligible_years.to_string(),
            };
        }

        let year_dir = policy.year_dir(year);
        if self.dry_run {
            tracing::info!(dataset = %policy.kind, year_dir = %year_dir.display(), "[dry-run] would sync");
            return DatasetStatus::WouldSync { year_dir };
        }

        let result = match policy.procedure {
            ProcedureKind::DirectCopy => self.direct_copy(policy, year),
            ProcedureKind::StageAndReshuffle => self.stage_and_reshuffle(policy, year),
        };
        match result {
            Ok(status) => status,
            Err(err) => {
                tracing::error!(dataset = %policy.kind, year, error = %err, "dataset sync failed");
                DatasetStatus::Failed {
                    reason: err.to_string(),
                }
            }
        }
    }

    fn direct_copy(&self, policy: &DatasetSyncPolicy, year: i32) -> Result<DatasetStatus, SyncError> {
        let year_dir = policy.year_dir(year);
        ensure_dir(&year_dir)?;

        let copy = tools::remote_year_copy(&self.config.tools, self.settings, policy.kind, year, &year_dir);
        tools::run_checked(self.runner, &copy)?;

        tracing::info!(dataset = %policy.kind, year_dir = %year_dir.display(), "synced");
        Ok(DatasetStatus::Synced {
            year_dir,
            staging_warnings: 0,
        })
    }

    fn stage_and_reshuffle(&self, policy: &DatasetSyncPolicy, year: i32) -> Result<DatasetStatus, SyncError> {
        let year_dir = policy.year_dir(year);
        let staging_dir = year_dir.join(year.to_string());
        ensure_dir(&year_dir)?;

        let mut staging_warnings = 0;
        let stage = tools::remote_dir_stage(&self.config.tools, self.settings, year, &staging_dir);
        if let Err(err) = tools::run_checked(self.runner, &stage) {
            match self.staging {
                StagingPolicy::Tolerate => {
                    staging_warnings += 1;
                    tracing::warn!(dataset = %policy.kind, year, error = %err, "staging copy failed; continuing");
                }
                StagingPolicy::Require => return Err(err),
            }
        }

        let months = staged_months(&staging_dir)?;
        if months.is_empty() {
            return Err(SyncError::NothingStaged { path: staging_dir });
        }
        let merge = tools::month_merge(&self.config.tools, &months, &year_dir);
        tools::run_checked(self.runner, &merge)?;

        tracing::info!(path = %staging_dir.display(), "removing staging directory");
        std::fs::remove_dir_all(&staging_dir).map_err(|e| io_err(&staging_dir, e))?;

        tracing::info!(dataset = %policy.kind, year_dir = %year_dir.display(), "synced");
        Ok(DatasetStatus::Synced {
            year_dir,
            staging_warnings,
        })
    }
}

// ---------------------------------------------------------------------------
// Filesystem helpers
// ---------------------------------------------------------------------------

/// Create `dir` and its parents. An existing directory is left untouched.
pub fn ensure_dir(dir: &Path) -> Result<(), SyncError> {
    if dir.is_dir() {
        return Ok(());
    }
    tracing::info!(path = %dir.display(), "creating directory");
    std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))
}

/// Two-character month directories directly under `staging_dir`, sorted.
///
/// Hidden entries never match, as with a shell `??`. Unreadable entries are
/// logged and left out.
pub fn staged_months(staging_dir: &Path) -> Result<Vec<PathBuf>, SyncError> {
    let pattern = format!(
        "{}/??",
        glob::Pattern::escape(&staging_dir.to_string_lossy())
    );
    let options = glob::MatchOptions {
        require_literal_leading_dot: true,
        ..glob::MatchOptions::default()
    };
    let entries = glob::glob_with(&pattern, options).map_err(|source| SyncError::Pattern {
        pattern: pattern.clone(),
        source,
    })?;

    let mut months = Vec::new();
    for entry in entries {
        match entry {
            Ok(path) if path.is_dir() => months.push(path),
            Ok(_) => {}
            Err(err) => tracing::warn!(error = %err, "unreadable staging entry"),
        }
    }
    months.sort();
    Ok(months)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
