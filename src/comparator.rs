//! Two-period comparison
//!
//! Reduces two count matrices of the same shape to a tri-state presence code
//! per cell. Presence in the second matrix always takes precedence.

use serde::{Serialize, Serializer};
use tracing::debug;

use crate::error::GridError;
use crate::matrix::Matrix;

/// Tri-state presence code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum Presence {
    /// No events in either period
    #[default]
    Absent = 0,
    /// Events only in the first period
    First = 1,
    /// Events in the second period
    Second = 2,
}

impl Presence {
    pub fn code(&self) -> u8 {
        *self as u8
    }

    /// Presence code for a pair of counts
    pub fn of(first: u32, second: u32) -> Self {
        if second > 0 {
            Presence::Second
        } else if first > 0 {
            Presence::First
        } else {
            Presence::Absent
        }
    }
}

impl Serialize for Presence {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

/// Comparator for count matrices
pub struct MatrixComparator;

impl MatrixComparator {
    /// Compare two matrices cell by cell.
    ///
    /// Magnitudes are ignored; only whether a count is positive matters.
    pub fn compare(first: &Matrix<u32>, second: &Matrix<u32>) -> Result<Matrix<Presence>, GridError> {
        if first.shape() != second.shape() {
            return Err(GridError::ShapeMismatch {
                left_rows: first.rows(),
                left_cols: first.cols(),
                right_rows: second.rows(),
                right_cols: second.cols(),
            });
        }

        debug!(rows = first.rows(), cols = first.cols(), "comparing matrices");

        let mut compared = Matrix::filled(first.rows(), first.cols(), Presence::Absent);
        for (row, (a, b)) in first.iter_rows().zip(second.iter_rows()).enumerate() {
            for (col, (&x, &y)) in a.iter().zip(b.iter()).enumerate() {
                compared.set(row, col, Presence::of(x, y));
            }
        }

        Ok(compared)
    }
}
