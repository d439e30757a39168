//! # carra2-periods
//!
//! Incremental period tracking for archived CARRA2 streams.
//!
//! Call [`tracker::run`] to scan every stream's archive, merge the observed
//! coverage with the previous run's table, and rewrite `periods.txt`.

pub mod archive;
pub mod error;
pub mod table;
pub mod tracker;

pub use archive::{DateToken, FilenameContract, ARCHIVE_FILENAME};
pub use error::PeriodError;
pub use table::{PeriodRecord, PriorPeriods};
pub use tracker::{run, StartSource, StreamPeriod, TrackerOptions, TrackerReport};
