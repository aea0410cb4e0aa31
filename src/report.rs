//! Report pipeline orchestration
//!
//! This module provides the public API for Eventgrid. It runs a report request
//! through the stages:
//! 1. Date resolution - resolve `NOW` and expand the date range
//! 2. Indexing - user rows and date columns
//! 3. MatrixBuilder - dense count matrix from sparse logs
//! 4. MatrixComparator / StartDateAnnotator - depending on the report kind
//! 5. ResultSerializer - per-user rows wrapped in a report envelope

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::annotator::{StartDateAnnotator, DAYS_PER_WEEK};
use crate::builder::MatrixBuilder;
use crate::comparator::MatrixComparator;
use crate::config::GridConfig;
use crate::dates::{format_date, parse_date, DateRange, EndDate, ReferenceClock};
use crate::error::GridError;
use crate::index::KeyIndex;
use crate::serializer::ResultSerializer;
use crate::types::{GridProducer, GridReport, LogRecord, ReportKind, ReportRows, UserStart};
use crate::{GRID_VERSION, PRODUCER_NAME};

/// Everything a report build needs, already fetched by the caller
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRequest {
    /// User identifiers; order decides row order
    pub users: Vec<String>,
    /// First day of the report (canonical format)
    pub start_date: String,
    /// Last day of the report, or `NOW`
    pub end_date: String,
    /// Log records for the report's event
    #[serde(default)]
    pub logs: Vec<LogRecord>,
    /// Second log set for comparison reports
    #[serde(default)]
    pub compare_logs: Vec<LogRecord>,
    /// Program start dates for annotated reports
    #[serde(default)]
    pub starts: Vec<UserStart>,
}

/// Build a report from request JSON using the default configuration.
///
/// # Returns
/// The report envelope as JSON
///
/// # Example
/// ```ignore
/// let report = build_report(ReportKind::Attendance, request_json)?;
/// ```
pub fn build_report(kind: ReportKind, request_json: &str) -> Result<String, GridError> {
    let request: ReportRequest = serde_json::from_str(request_json)?;
    let report = GridProcessor::new().build(kind, &request)?;
    Ok(serde_json::to_string(&report)?)
}

/// Report builder bound to one configuration
#[derive(Debug, Clone)]
pub struct GridProcessor {
    config: GridConfig,
    clock: ReferenceClock,
}

impl Default for GridProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl GridProcessor {
    /// Create a processor with default settings
    pub fn new() -> Self {
        Self {
            config: GridConfig::default(),
            clock: ReferenceClock::default(),
        }
    }

    /// Create a processor from a validated configuration
    pub fn with_config(config: GridConfig) -> Result<Self, GridError> {
        config.validate()?;
        let clock = config.clock()?;
        Ok(Self { config, clock })
    }

    /// Load configuration from JSON
    pub fn from_config_json(json: &str) -> Result<Self, GridError> {
        Self::with_config(GridConfig::from_json(json)?)
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    /// Resolve the request's date window as of `now`
    pub fn resolve_range(
        &self,
        request: &ReportRequest,
        now: DateTime<Utc>,
    ) -> Result<DateRange, GridError> {
        let start = parse_date(&request.start_date)?;
        let end = EndDate::parse(&request.end_date)?.resolve(&self.clock, now);
        DateRange::new(start, end)
    }

    /// Build a report, resolving `NOW` against the current time
    pub fn build(&self, kind: ReportKind, request: &ReportRequest) -> Result<GridReport, GridError> {
        self.build_at(kind, request, Utc::now())
    }

    /// Build a report, resolving `NOW` against `now`.
    ///
    /// Any stage failure fails the whole build; no partial report is returned.
    pub fn build_at(
        &self,
        kind: ReportKind,
        request: &ReportRequest,
        now: DateTime<Utc>,
    ) -> Result<GridReport, GridError> {
        let range = self.resolve_range(request, now)?;
        let users = KeyIndex::build(request.users.iter().cloned())?;
        let dates = range.to_index()?;

        let counts = MatrixBuilder::build(&users, &dates, &request.logs)?;

        let (rows, columns) = match kind {
            ReportKind::Attendance => (
                ReportRows::Counts(ResultSerializer::to_user_rows(&counts, &users)),
                dates.keys().to_vec(),
            ),
            ReportKind::Compare => {
                let second = MatrixBuilder::build(&users, &dates, &request.compare_logs)?;
                let compared = MatrixComparator::compare(&counts, &second)?;
                (
                    ReportRows::Presence(ResultSerializer::to_user_rows(&compared, &users)),
                    dates.keys().to_vec(),
                )
            }
            ReportKind::Daily => {
                let annotated = StartDateAnnotator::annotate_daily(
                    &counts,
                    &request.starts,
                    &users,
                    &dates,
                    self.config.daily_underflow,
                )?;
                (
                    ReportRows::Annotated(ResultSerializer::to_user_rows(&annotated, &users)),
                    dates.keys().to_vec(),
                )
            }
            ReportKind::Monthly => {
                let windowed = StartDateAnnotator::annotate_windowed(
                    &counts,
                    &request.starts,
                    &users,
                    &dates,
                    self.config.num_weeks,
                    self.config.window_underflow,
                )?;
                (
                    ReportRows::Annotated(ResultSerializer::to_user_rows(&windowed, &users)),
                    window_labels(self.config.num_weeks),
                )
            }
        };

        info!(
            kind = kind.as_str(),
            users = users.len(),
            days = dates.len(),
            "report built"
        );

        Ok(GridReport {
            report_id: Uuid::new_v4().to_string(),
            producer: GridProducer {
                name: PRODUCER_NAME.to_string(),
                version: GRID_VERSION.to_string(),
            },
            generated_at_utc: now,
            kind,
            start_date: format_date(range.start()),
            end_date: format_date(range.end()),
            columns,
            rows,
        })
    }
}

/// Column labels for windowed reports: `W1D1` .. `W{n}D7`
fn window_labels(num_weeks: usize) -> Vec<String> {
    (1..=num_weeks)
        .flat_map(|week| (1..=DAYS_PER_WEEK).map(move |day| format!("W{}D{}", week, day)))
        .collect()
}
