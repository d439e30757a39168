//! Domain types shared by the period tracker and the sync orchestrator.
//!
//! Date-hour values on disk are fixed-width `YYYYMMDDHH` strings. [`Dtg`] is
//! the validated form used wherever the value drives a decision; the period
//! table keeps raw strings because its start column is carried over verbatim.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize, Serializer};

use crate::error::DtgError;

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A strongly-typed stream identifier, e.g. `carra2_198409`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StreamId(pub String);

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for StreamId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for StreamId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl AsRef<str> for StreamId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A date-time-group: a processing position with hour resolution.
///
/// Parses and formats as `YYYYMMDDHH`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Dtg(NaiveDateTime);

impl Dtg {
    /// Number of characters in the textual form.
    pub const WIDTH: usize = 10;

    /// Build a DTG from calendar parts. Returns `None` for impossible values.
    pub fn from_parts(year: i32, month: u32, day: u32, hour: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|d| d.and_hms_opt(hour, 0, 0))
            .map(Self)
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn hour(&self) -> u32 {
        self.0.hour()
    }

    /// `true` when the position lies in the last month of its year.
    pub fn is_december(&self) -> bool {
        self.month() == 12
    }

    pub fn next_year(&self) -> i32 {
        self.year() + 1
    }
}

impl FromStr for Dtg {
    type Err = DtgError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != Self::WIDTH || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(DtgError::Format {
                value: s.to_owned(),
            });
        }
        // All ten bytes are ASCII digits, so the slices below are valid and parse.
        let number = |range: std::ops::Range<usize>| -> u32 {
            s[range]
                .bytes()
                .fold(0, |acc, b| acc * 10 + u32::from(b - b'0'))
        };
        let date = NaiveDate::from_ymd_opt(number(0..4) as i32, number(4..6), number(6..8))
            .ok_or_else(|| DtgError::Date {
                value: s.to_owned(),
            })?;
        let time = date
            .and_hms_opt(number(8..10), 0, 0)
            .ok_or_else(|| DtgError::Hour {
                value: s.to_owned(),
            })?;
        Ok(Self(time))
    }
}

impl fmt::Display for Dtg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y%m%d%H"))
    }
}

impl Serialize for Dtg {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// ---------------------------------------------------------------------------
// Dataset policy
// ---------------------------------------------------------------------------

/// Closed interval of calendar years; an absent bound is unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearRange {
    pub first: Option<i32>,
    pub last: Option<i32>,
}

impl YearRange {
    pub const fn always() -> Self {
        Self {
            first: None,
            last: None,
        }
    }

    pub const fn from(first: i32) -> Self {
        Self {
            first: Some(first),
            last: None,
        }
    }

    pub const fn between(first: i32, last: i32) -> Self {
        Self {
            first: Some(first),
            last: Some(last),
        }
    }

    pub fn contains(&self, year: i32) -> bool {
        self.first.map_or(true, |f| year >= f) && self.last.map_or(true, |l| year <= l)
    }
}

impl fmt::Display for YearRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.first, self.last) {
            (None, None) => write!(f, "any year"),
            (Some(first), None) => write!(f, "{first}-"),
            (None, Some(last)) => write!(f, "-{last}"),
            (Some(first), Some(last)) => write!(f, "{first}-{last}"),
        }
    }
}

/// How a dataset type is fetched for a new year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcedureKind {
    /// Bulk copy of the remote year straight into `<root>/<year>`.
    DirectCopy,
    /// Stage into `<root>/<year>/<year>`, merge the month folders up, remove the stage.
    StageAndReshuffle,
}

/// The fixed set of external observation products synchronized each year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DatasetKind {
    /// Sea-ice concentration.
    S3sice,
    /// Optical imager, modern era.
    Modis,
    /// Optical imager, legacy era.
    Avhrr,
    /// Sea-ice / ocean flux.
    Osisaf,
}

impl DatasetKind {
    /// Every kind, in dispatch order.
    pub const ALL: [DatasetKind; 4] = [
        DatasetKind::S3sice,
        DatasetKind::Modis,
        DatasetKind::Avhrr,
        DatasetKind::Osisaf,
    ];

    /// Key used in the `OBS` configuration section and in remote paths.
    pub fn key(&self) -> &'static str {
        match self {
            DatasetKind::S3sice => "S3SICE",
            DatasetKind::Modis => "MODIS",
            DatasetKind::Avhrr => "AVHRR",
            DatasetKind::Osisaf => "OSISAF",
        }
    }

    pub fn eligible_years(&self) -> YearRange {
        match self {
            DatasetKind::S3sice => YearRange::from(2021),
            DatasetKind::Modis => YearRange::between(2000, 2019),
            DatasetKind::Avhrr => YearRange::between(1985, 2000),
            DatasetKind::Osisaf => YearRange::always(),
        }
    }

    pub fn procedure(&self) -> ProcedureKind {
        match self {
            DatasetKind::Osisaf => ProcedureKind::StageAndReshuffle,
            _ => ProcedureKind::DirectCopy,
        }
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
