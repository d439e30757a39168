//! # carra2-sync
//!
//! Calendar-gated synchronization of external observation datasets.
//!
//! Call [`pipeline::run`] to evaluate every configured stream: streams whose
//! progress log has reached December trigger a [`dispatch`] of each dataset
//! for the following year. The returned [`RunReport`] records every outcome.

pub mod dispatch;
pub mod error;
pub mod orchestrator;
pub mod pipeline;
pub mod policy;
pub mod progress;
pub mod tools;

pub use dispatch::{DatasetOutcome, DatasetStatus, DispatchReport, Dispatcher, StagingPolicy};
pub use error::SyncError;
pub use orchestrator::{RunReport, StreamOutcome, StreamState};
pub use pipeline::{FetchOptions, FetchScope};
pub use policy::DatasetSyncPolicy;
pub use tools::{SystemRunner, ToolInvocation, ToolOutput, ToolRunner};
