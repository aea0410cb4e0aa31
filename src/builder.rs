//! Count matrix construction
//!
//! Materializes sparse log records into a dense users x dates matrix.

use tracing::debug;

use crate::error::GridError;
use crate::index::KeyIndex;
use crate::matrix::Matrix;
use crate::types::LogRecord;

/// Builder for dense count matrices
pub struct MatrixBuilder;

impl MatrixBuilder {
    /// Build a `users.len() x dates.len()` count matrix.
    ///
    /// Every cell starts at zero; each record then overwrites its cell, so a
    /// (user, date) pair appearing twice keeps the later count. A record whose
    /// user or date is not in the supplied indices fails the whole build.
    pub fn build(
        users: &KeyIndex,
        dates: &KeyIndex,
        logs: &[LogRecord],
    ) -> Result<Matrix<u32>, GridError> {
        debug!(
            users = users.len(),
            dates = dates.len(),
            records = logs.len(),
            "building count matrix"
        );

        let mut matrix = Matrix::zeroed(users.len(), dates.len());

        for log in logs {
            let row = users
                .get(&log.user_id)
                .ok_or_else(|| GridError::unknown_user(&log.user_id))?;
            let col = dates
                .get(&log.date)
                .ok_or_else(|| GridError::unknown_date(&log.date))?;
            matrix.set(row, col, log.count);
        }

        Ok(matrix)
    }
}
