//! Per-dataset sync policy: the hardcoded year window and procedure of a
//! [`DatasetKind`] joined with the destination root from configuration.

use std::path::PathBuf;

use carra2_core::{Config, DatasetKind, ProcedureKind, YearRange};

use crate::error::SyncError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetSyncPolicy {
    pub kind: DatasetKind,
    pub eligible_years: YearRange,
    pub destination_root: PathBuf,
    pub procedure: ProcedureKind,
}

impl DatasetSyncPolicy {
    /// Resolve the policy for `kind`; a missing destination root is an error.
    pub fn resolve(config: &Config, kind: DatasetKind) -> Result<Self, SyncError> {
        let root = config
            .destination_root(kind)
            .ok_or(SyncError::MissingDestination { dataset: kind })?;
        Ok(Self {
            kind,
            eligible_years: kind.eligible_years(),
            destination_root: root.to_path_buf(),
            procedure: kind.procedure(),
        })
    }

    pub fn is_eligible(&self, year: i32) -> bool {
        self.eligible_years.contains(year)
    }

    /// `<destination_root>/<year>`
    pub fn year_dir(&self, year: i32) -> PathBuf {
        self.destination_root.join(year.to_string())
    }
}
