//! Shared fetch pipeline entrypoint used by the CLI.

use carra2_core::{Config, Settings, StreamId};

use crate::dispatch::{Dispatcher, StagingPolicy};
use crate::orchestrator::{self, RunReport};
use crate::tools::ToolRunner;

/// Scope for a fetch pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FetchScope {
    /// Evaluate every configured stream.
    #[default]
    All,
    /// Evaluate a single named stream.
    Stream(StreamId),
}

/// Knobs for one pipeline run.
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    pub scope: FetchScope,
    pub dry_run: bool,
    pub staging: StagingPolicy,
}

/// Run the fetch pipeline for a scope.
///
/// A stream named in [`FetchScope::Stream`] that is not configured yields an
/// empty report.
pub fn run(
    config: &Config,
    settings: &Settings,
    runner: &dyn ToolRunner,
    options: &FetchOptions,
) -> RunReport {
    let dispatcher = Dispatcher::new(config, settings, runner)
        .with_staging(options.staging)
        .with_dry_run(options.dry_run);

    match &options.scope {
        FetchScope::All => orchestrator::run_all(&config.streams, &dispatcher),
        FetchScope::Stream(name) => {
            if !config.streams.contains_key(name) {
                tracing::warn!(stream = %name, "stream not found in configuration");
            }
            orchestrator::run_streams(config.streams.get_key_value(name), &dispatcher)
        }
    }
}
