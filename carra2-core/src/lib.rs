//! CARRA2 core library: domain types, configuration loading, errors.
//!
//! Public API surface:
//! - [`types`]: newtypes, DTG parsing, dataset kinds and year ranges
//! - [`error`]: [`ConfigError`], [`DtgError`]
//! - [`config`]: `streams.yml` loading and process [`Settings`]

pub mod config;
pub mod error;
pub mod types;

pub use config::{Config, ObsPath, Settings, StreamConfig, ToolSet};
pub use error::{ConfigError, DtgError};
pub use types::{DatasetKind, Dtg, ProcedureKind, StreamId, YearRange};
