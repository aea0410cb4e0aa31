//! Core types for the Eventgrid pipeline
//!
//! This module defines the records that enter the pipeline (log records and
//! user start dates), the annotated cell value, and the report envelope that
//! leaves it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};

use crate::comparator::Presence;
use crate::error::GridError;
use crate::serializer::UserRow;

/// Marker written into the column preceding a user's start date
pub const START_MARKER: &str = "Start";

/// Observed event count for one user on one day.
///
/// A missing record for a (user, date) pair means the count is zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    pub user_id: String,
    /// Canonical date string
    pub date: String,
    pub count: u32,
}

impl LogRecord {
    pub fn new(user_id: impl Into<String>, date: impl Into<String>, count: u32) -> Self {
        Self {
            user_id: user_id.into(),
            date: date.into(),
            count,
        }
    }
}

/// Date a user's program window begins
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStart {
    pub user_id: String,
    /// Canonical date string
    pub start_date: String,
}

impl UserStart {
    pub fn new(user_id: impl Into<String>, start_date: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            start_date: start_date.into(),
        }
    }
}

/// A matrix cell that is either a plain value or the start marker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell<T> {
    Value(T),
    Start,
}

impl<T> Cell<T> {
    pub fn is_start(&self) -> bool {
        matches!(self, Cell::Start)
    }
}

impl<T: Default> Default for Cell<T> {
    fn default() -> Self {
        Cell::Value(T::default())
    }
}

impl<T> From<T> for Cell<T> {
    fn from(value: T) -> Self {
        Cell::Value(value)
    }
}

impl<T: Serialize> Serialize for Cell<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Cell::Value(v) => v.serialize(serializer),
            Cell::Start => serializer.serialize_str(START_MARKER),
        }
    }
}

/// Dashboard report variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    /// Raw daily counts
    Attendance,
    /// Two log sets reduced to presence codes
    Compare,
    /// Daily counts with start markers
    Daily,
    /// Fixed-width weekly windows anchored at each user's start date
    Monthly,
}

impl ReportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportKind::Attendance => "attendance",
            ReportKind::Compare => "compare",
            ReportKind::Daily => "daily",
            ReportKind::Monthly => "monthly",
        }
    }
}

impl std::str::FromStr for ReportKind {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "attendance" => Ok(ReportKind::Attendance),
            "compare" => Ok(ReportKind::Compare),
            "daily" => Ok(ReportKind::Daily),
            "monthly" => Ok(ReportKind::Monthly),
            other => Err(GridError::InvalidInput(format!("unknown report kind: {}", other))),
        }
    }
}

/// Per-user rows of a finished report
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ReportRows {
    Counts(Vec<UserRow<u32>>),
    Presence(Vec<UserRow<Presence>>),
    Annotated(Vec<UserRow<Cell<u32>>>),
}

impl ReportRows {
    pub fn len(&self) -> usize {
        match self {
            ReportRows::Counts(rows) => rows.len(),
            ReportRows::Presence(rows) => rows.len(),
            ReportRows::Annotated(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Producer metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridProducer {
    pub name: String,
    pub version: String,
}

/// Report envelope handed to the dashboard layer
#[derive(Debug, Clone, Serialize)]
pub struct GridReport {
    pub report_id: String,
    pub producer: GridProducer,
    pub generated_at_utc: DateTime<Utc>,
    pub kind: ReportKind,
    pub start_date: String,
    pub end_date: String,
    /// Column labels; window offsets for monthly reports
    pub columns: Vec<String>,
    pub rows: ReportRows,
}
