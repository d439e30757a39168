//! Stream configuration (`streams.yml`) and process-wide settings.
//!
//! # Document layout
//!
//! ```text
//! STREAMS:
//!   <stream_id>:
//!     BEG_DATE: "YYYYMMDDHH"
//!     END_DATE: "YYYYMMDDHH"
//!     USER:     <owner>
//!     ACTIVE:   true | false
//!     PROGLOG:  <path to progress.log>     (optional)
//! OBS:
//!   <S3SICE|MODIS|AVHRR|OSISAF>:
//!     LOCALPATH: <destination root>
//! TOOLS:                                   (optional)
//!   ECP: ecp
//!   ECFSDIR: ecfsdir
//!   RSYNC: rsync
//! ```
//!
//! Streams are kept in a `BTreeMap`, so every run walks them in the same order.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;
use crate::types::{DatasetKind, StreamId};

/// Default configuration file name, relative to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "streams.yml";

/// Environment variable naming the installation root of the pipeline scripts.
pub const LIB_ROOT_ENV: &str = "ECFPROJ_LIB";

/// Scratch tree holding `<stream>/archive/extract/*.tar.gz`.
pub const DEFAULT_ARCHIVE_ROOT: &str = "/ec/res4/scratch/fac2/hm_home";

/// Remote archive holding `<TYPE>/<year>/` for the direct-copy datasets.
pub const DEFAULT_REMOTE_OBS_ROOT: &str = "ec:/fac2/CARRA2/obs";

/// Remote directory (under the obs root) holding the reshuffled dataset's years.
pub const DEFAULT_STAGED_REMOTE_DIR: &str = "OSISAF_v2_20240424";

// ---------------------------------------------------------------------------
// Document types
// ---------------------------------------------------------------------------

/// One `STREAMS` entry.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct StreamConfig {
    #[serde(rename = "BEG_DATE", default)]
    pub beg_date: Option<String>,
    #[serde(rename = "END_DATE", default)]
    pub end_date: Option<String>,
    #[serde(rename = "USER", default)]
    pub user: Option<String>,
    #[serde(rename = "ACTIVE", default)]
    pub active: bool,
    #[serde(rename = "PROGLOG", default)]
    pub progress_log: Option<PathBuf>,
}

impl StreamConfig {
    /// Where the stream's progress log lives.
    ///
    /// An explicit `PROGLOG` wins; otherwise the owner's
    /// `/home/<user>/hm_home/<stream>/progress.log` is used. `None` when
    /// neither is available.
    pub fn progress_log_path(&self, stream: &StreamId) -> Option<PathBuf> {
        if let Some(path) = self.progress_log.as_ref().filter(|p| !p.as_os_str().is_empty()) {
            return Some(path.clone());
        }
        let user = self.user.as_deref().filter(|u| !u.is_empty())?;
        Some(
            PathBuf::from("/home")
                .join(user)
                .join("hm_home")
                .join(&stream.0)
                .join("progress.log"),
        )
    }
}

/// One `OBS` entry.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct ObsPath {
    #[serde(rename = "LOCALPATH", default)]
    pub local_path: Option<PathBuf>,
}

/// Program names for the external tools. Each may be a bare name looked up on
/// `PATH` or an absolute path to a wrapper script.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ToolSet {
    #[serde(rename = "ECP", default = "default_ecp")]
    pub ecp: String,
    #[serde(rename = "ECFSDIR", default = "default_ecfsdir")]
    pub ecfsdir: String,
    #[serde(rename = "RSYNC", default = "default_rsync")]
    pub rsync: String,
}

impl Default for ToolSet {
    fn default() -> Self {
        Self {
            ecp: default_ecp(),
            ecfsdir: default_ecfsdir(),
            rsync: default_rsync(),
        }
    }
}

fn default_ecp() -> String {
    "ecp".to_string()
}

fn default_ecfsdir() -> String {
    "ecfsdir".to_string()
}

fn default_rsync() -> String {
    "rsync".to_string()
}

/// Root of `streams.yml`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct Config {
    #[serde(rename = "STREAMS", default)]
    pub streams: BTreeMap<StreamId, StreamConfig>,
    #[serde(rename = "OBS", default)]
    pub obs: BTreeMap<String, ObsPath>,
    #[serde(rename = "TOOLS", default)]
    pub tools: ToolSet,
}

impl Config {
    /// Destination root configured for `kind`. Empty paths count as missing.
    pub fn destination_root(&self, kind: DatasetKind) -> Option<&Path> {
        self.obs
            .get(kind.key())
            .and_then(|o| o.local_path.as_deref())
            .filter(|p| !p.as_os_str().is_empty())
    }
}

// ---------------------------------------------------------------------------
// Load
// ---------------------------------------------------------------------------

/// Load the configuration document at `path`.
///
/// Returns `ConfigError::NotFound` if absent,
/// `ConfigError::Parse` (with path + line context) if malformed YAML.
pub fn load_at(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse(path, &contents)
}

/// Parse an in-memory document; `path` is only used for error context.
pub fn parse(path: &Path, contents: &str) -> Result<Config, ConfigError> {
    serde_yaml::from_str(contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Process settings resolved once at startup and passed to each component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Installation root from `ECFPROJ_LIB`, when set.
    pub lib_root: Option<PathBuf>,
    /// Root of the per-stream archive trees scanned by the period tracker.
    pub archive_root: PathBuf,
    /// Remote root for the direct-copy datasets.
    pub remote_obs_root: String,
    /// Directory under `remote_obs_root` that holds the staged dataset.
    pub staged_remote_dir: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            lib_root: None,
            archive_root: PathBuf::from(DEFAULT_ARCHIVE_ROOT),
            remote_obs_root: DEFAULT_REMOTE_OBS_ROOT.to_string(),
            staged_remote_dir: DEFAULT_STAGED_REMOTE_DIR.to_string(),
        }
    }
}

impl Settings {
    /// Defaults plus the library root read from the process environment.
    pub fn from_env() -> Self {
        Self::default().with_lib_root(std::env::var_os(LIB_ROOT_ENV))
    }

    pub fn with_lib_root(mut self, value: Option<OsString>) -> Self {
        self.lib_root = value.filter(|v| !v.is_empty()).map(PathBuf::from);
        self
    }

    pub fn with_archive_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.archive_root = root.into();
        self
    }

    pub fn with_remote_obs_root(mut self, root: impl Into<String>) -> Self {
        self.remote_obs_root = root.into();
        self
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"
STREAMS:
  carra2_198409:
    BEG_DATE: "1984090100"
    END_DATE: "1989083123"
    USER: fac2
    ACTIVE: true
    PROGLOG: /tmp/carra2_198409/progress.log
  carra2_198909:
    USER: fac2
    ACTIVE: false
OBS:
  S3SICE:
    LOCALPATH: /scratch/obs/S3SICE
  MODIS:
    LOCALPATH: ""
"#;

    #[test]
    fn parses_streams_and_obs() {
        let cfg = parse(Path::new("streams.yml"), SAMPLE).expect("parse");
        assert_eq!(cfg.streams.len(), 2);
        let s = &cfg.streams[&StreamId::from("carra2_198409")];
        assert!(s.active);
        assert_eq!(s.beg_date.as_deref(), Some("1984090100"));
        assert_eq!(s.user.as_deref(), Some("fac2"));
        assert_eq!(
            cfg.destination_root(DatasetKind::S3sice),
            Some(Path::new("/scratch/obs/S3SICE"))
        );
    }

    #[test]
    fn empty_or_absent_destination_is_missing() {
        let cfg = parse(Path::new("streams.yml"), SAMPLE).expect("parse");
        assert_eq!(cfg.destination_root(DatasetKind::Modis), None);
        assert_eq!(cfg.destination_root(DatasetKind::Osisaf), None);
    }

    #[test]
    fn streams_iterate_in_lexical_order() {
        let cfg = parse(Path::new("streams.yml"), SAMPLE).expect("parse");
        let names: Vec<_> = cfg.streams.keys().map(|s| s.0.as_str()).collect();
        assert_eq!(names, vec!["carra2_198409", "carra2_198909"]);
    }

    #[test]
    fn tools_default_when_section_absent() {
        let cfg = parse(Path::new("streams.yml"), SAMPLE).expect("parse");
        assert_eq!(cfg.tools, ToolSet::default());
        assert_eq!(cfg.tools.rsync, "rsync");
    }

    #[test]
    fn tools_can_be_overridden_individually() {
        let cfg = parse(
            Path::new("streams.yml"),
            "TOOLS:\n  ECFSDIR: /opt/bin/call_ecfs.sh\n",
        )
        .expect("parse");
        assert_eq!(cfg.tools.ecfsdir, "/opt/bin/call_ecfs.sh");
        assert_eq!(cfg.tools.ecp, "ecp");
    }

    #[test]
    fn progress_log_prefers_explicit_path() {
        let stream = StreamId::from("carra2_198409");
        let cfg = StreamConfig {
            user: Some("fac2".into()),
            progress_log: Some(PathBuf::from("/tmp/p.log")),
            ..Default::default()
        };
        assert_eq!(cfg.progress_log_path(&stream), Some(PathBuf::from("/tmp/p.log")));
    }

    #[test]
    fn progress_log_falls_back_to_user_home() {
        let stream = StreamId::from("carra2_198409");
        let cfg = StreamConfig {
            user: Some("fac2".into()),
            ..Default::default()
        };
        assert_eq!(
            cfg.progress_log_path(&stream),
            Some(PathBuf::from("/home/fac2/hm_home/carra2_198409/progress.log"))
        );
        assert_eq!(StreamConfig::default().progress_log_path(&stream), None);
    }

    #[test]
    fn load_missing_file_is_not_found() {
        let dir = TempDir::new().expect("tempdir");
        let err = load_at(&dir.path().join("streams.yml")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }), "got: {err}");
    }

    #[test]
    fn settings_ignore_empty_lib_root() {
        let s = Settings::default().with_lib_root(Some(OsString::new()));
        assert_eq!(s.lib_root, None);
        let s = Settings::default().with_lib_root(Some(OsString::from("/perm/lib")));
        assert_eq!(s.lib_root, Some(PathBuf::from("/perm/lib")));
        assert_eq!(s.archive_root, PathBuf::from(DEFAULT_ARCHIVE_ROOT));
    }
}
