//! Error types for Eventgrid

use thiserror::Error;

/// Errors that can occur while building grids
#[derive(Debug, Error)]
pub enum GridError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid date range: start {start} is after end {end}")]
    InvalidRange { start: String, end: String },

    #[error("Unknown {kind} key: {key}")]
    KeyLookup { kind: KeyKind, key: String },

    #[error("Shape mismatch: {left_rows}x{left_cols} vs {right_rows}x{right_cols}")]
    ShapeMismatch {
        left_rows: usize,
        left_cols: usize,
        right_rows: usize,
        right_cols: usize,
    },

    #[error("Start marker for user {user_id} falls before the first column")]
    IndexUnderflow { user_id: String },

    #[error(
        "Window for user {user_id} starting at column {start_column} with width {width} exceeds {columns} columns"
    )]
    WindowOutOfBounds {
        user_id: String,
        start_column: usize,
        width: usize,
        columns: usize,
    },

    #[error("Window of {num_weeks} weeks does not fit in {columns} date columns")]
    WindowTooWide { num_weeks: usize, columns: usize },

    #[error("Date parse error: {0}")]
    DateParseError(String),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Missing event parameter {param} for {event}")]
    MissingParam { event: String, param: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Which index a failed lookup was made against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    User,
    Date,
}

impl std::fmt::Display for KeyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeyKind::User => write!(f, "user"),
            KeyKind::Date => write!(f, "date"),
        }
    }
}

impl GridError {
    pub(crate) fn unknown_user(key: impl Into<String>) -> Self {
        GridError::KeyLookup {
            kind: KeyKind::User,
            key: key.into(),
        }
    }

    pub(crate) fn unknown_date(key: impl Into<String>) -> Self {
        GridError::KeyLookup {
            kind: KeyKind::Date,
            key: key.into(),
        }
    }

    pub(crate) fn missing_param(event: &str, param: &str) -> Self {
        GridError::MissingParam {
            event: event.to_string(),
            param: param.to_string(),
        }
    }
}
