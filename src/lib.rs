//! Eventgrid - Compute engine for per-user daily event-log dashboards
//!
//! Eventgrid turns sparse per-user, per-day event counts into dense grids
//! through a deterministic pipeline: date expansion → indexing → matrix
//! building → comparison or start-date annotation → per-user rows.
//!
//! ## Reports
//!
//! - **Attendance**: daily counts per user
//! - **Compare**: two log sets reduced to presence codes (0, 1, 2)
//! - **Daily**: daily counts with each user's program start marked
//! - **Monthly**: fixed-width weekly windows anchored at each user's start date
//!
//! Event description helpers for the same dashboards live in [`events`].

pub mod annotator;
pub mod builder;
pub mod comparator;
pub mod config;
pub mod dates;
pub mod error;
pub mod events;
pub mod fitness;
pub mod index;
pub mod matrix;
pub mod report;
pub mod serializer;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use annotator::{StartDateAnnotator, UnderflowPolicy};
pub use builder::MatrixBuilder;
pub use comparator::{MatrixComparator, Presence};
pub use config::GridConfig;
pub use dates::{DateRange, EndDate, ReferenceClock};
pub use error::GridError;
pub use events::{DescriptionContext, Event, EventKind, RawEvent};
pub use index::KeyIndex;
pub use matrix::Matrix;
pub use report::{build_report, GridProcessor, ReportRequest};
pub use serializer::{ResultSerializer, UserRow};
pub use types::{Cell, GridReport, LogRecord, ReportKind, UserStart};

/// Eventgrid version embedded in all reports
pub const GRID_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for reports
pub const PRODUCER_NAME: &str = "eventgrid";
