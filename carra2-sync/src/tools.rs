//! External tool invocations.
//!
//! Dispatch never spawns processes directly: it builds a [`ToolInvocation`]
//! and hands it to a [`ToolRunner`]. [`SystemRunner`] runs the program and
//! blocks until it exits; tests substitute a recording runner.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

use carra2_core::{DatasetKind, Settings, ToolSet};

use crate::error::SyncError;

/// A fully specified external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    pub program: String,
    pub args: Vec<String>,
}

impl ToolInvocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }
}

impl fmt::Display for ToolInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Captured result of a finished tool.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    pub success: bool,
    /// Exit code; `None` when the process was killed by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn status_label(&self) -> String {
        match self.code {
            Some(code) => format!("exit status {code}"),
            None => "terminated by signal".to_string(),
        }
    }
}

/// Runs external tools to completion.
pub trait ToolRunner {
    /// Run `invocation` and wait for it. `Err` only when the program could not
    /// be started; a non-zero exit is reported through [`ToolOutput::success`].
    fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput, SyncError>;
}

/// [`ToolRunner`] backed by `std::process::Command`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl ToolRunner for SystemRunner {
    fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput, SyncError> {
        tracing::info!(command = %invocation, "running external tool");
        let mut command = Command::new(&invocation.program);
        command.args(&invocation.args);
        let output = command.output().map_err(|source| SyncError::Spawn {
            program: invocation.program.clone(),
            source,
        })?;

        let result = ToolOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        };
        if !result.stdout.is_empty() {
            tracing::debug!(program = %invocation.program, stdout = %result.stdout, "tool output");
        }
        if !result.stderr.is_empty() {
            tracing::debug!(program = %invocation.program, stderr = %result.stderr, "tool stderr");
        }
        Ok(result)
    }
}

/// Run `invocation`, turning a non-zero exit into [`SyncError::ToolFailed`].
pub fn run_checked(runner: &dyn ToolRunner, invocation: &ToolInvocation) -> Result<ToolOutput, SyncError> {
    let output = runner.run(invocation)?;
    if output.success {
        return Ok(output);
    }
    Err(SyncError::ToolFailed {
        program: invocation.program.clone(),
        status: output.status_label(),
        stderr: output.stderr,
    })
}

// ---------------------------------------------------------------------------
// Invocation builders
// ---------------------------------------------------------------------------

/// Bulk copy of one remote year into `year_dir`.
///
/// `ecp ec:/.../<TYPE>/<year>/* <year_dir>`
pub fn remote_year_copy(
    tools: &ToolSet,
    settings: &Settings,
    kind: DatasetKind,
    year: i32,
    year_dir: &Path,
) -> ToolInvocation {
    ToolInvocation::new(&tools.ecp)
        .arg(format!("{}/{}/{year}/*", settings.remote_obs_root, kind.key()))
        .arg(year_dir.display().to_string())
}

/// Remote directory copy of one year into the staging directory.
///
/// `ecfsdir ec:/.../<staged_remote_dir>/<year> <staging_dir>`
pub fn remote_dir_stage(
    tools: &ToolSet,
    settings: &Settings,
    year: i32,
    staging_dir: &Path,
) -> ToolInvocation {
    ToolInvocation::new(&tools.ecfsdir)
        .arg(format!(
            "{}/{}/{year}",
            settings.remote_obs_root, settings.staged_remote_dir
        ))
        .arg(staging_dir.display().to_string())
}

/// Merge each staged month directory's contents into `year_dir`.
///
/// `rsync -vaux <month>/ [<month>/ ...] <year_dir>`
///
/// Paths are passed as given and resolve against the caller's working
/// directory, the same one `months` were globbed from.
pub fn month_merge(tools: &ToolSet, months: &[PathBuf], year_dir: &Path) -> ToolInvocation {
    let mut invocation = ToolInvocation::new(&tools.rsync).arg("-vaux");
    for month in months {
        invocation = invocation.arg(format!("{}/", month.display()));
    }
    invocation.arg(year_dir.display().to_string())
}
