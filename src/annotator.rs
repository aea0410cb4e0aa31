//! Start-date annotation
//!
//! Marks the column immediately preceding each user's start date with
//! [`Cell::Start`]. Two views are supported:
//! - daily: the full users x dates matrix, annotated in a copy
//! - windowed: a fresh `num_weeks * 7` wide matrix whose rows are copied from
//!   each user's own start column
//!
//! When the start date sits in the first column there is no preceding
//! column. What happens then is decided by an [`UnderflowPolicy`]; the marker
//! never wraps around to the last column.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::GridError;
use crate::index::KeyIndex;
use crate::matrix::Matrix;
use crate::types::{Cell, UserStart};

/// Days per window week
pub const DAYS_PER_WEEK: usize = 7;

/// What to do when the start marker would land before column 0
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnderflowPolicy {
    /// Fail the whole annotation with `IndexUnderflow`
    #[default]
    Reject,
    /// Leave that user's row without a marker
    Skip,
    /// Put the marker in column 0
    Clamp,
}

/// Annotator for start-date markers
pub struct StartDateAnnotator;

impl StartDateAnnotator {
    /// Annotate a daily matrix, returning an annotated copy.
    ///
    /// The matrix must be shaped `users.len() x dates.len()`. Start records whose
    /// date is outside the date index are left unannotated.
    pub fn annotate_daily<T: Clone>(
        matrix: &Matrix<T>,
        starts: &[UserStart],
        users: &KeyIndex,
        dates: &KeyIndex,
        policy: UnderflowPolicy,
    ) -> Result<Matrix<Cell<T>>, GridError> {
        check_shape(matrix, users, dates)?;
        debug!(starts = starts.len(), ?policy, "annotating daily matrix");

        let mut annotated = matrix.map(|v| Cell::from(v.clone()));

        for start in starts {
            let Some((row, col)) = locate_start(start, users, dates)? else {
                continue;
            };
            if let Some(marker) = marker_column(col, &start.user_id, policy)? {
                annotated.set(row, marker, Cell::Start);
            }
        }

        Ok(annotated)
    }

    /// Build a windowed view anchored at each user's start date.
    ///
    /// Each row holds `num_weeks * 7` consecutive daily values beginning at the
    /// user's start column. Users without a start inside the date index keep a
    /// default-valued row. Relative to the window the start date is column 0,
    /// so the marker placement is entirely governed by `policy`. A window wider
    /// than the date index fails before any row is built.
    pub fn annotate_windowed<T: Clone + Default>(
        matrix: &Matrix<T>,
        starts: &[UserStart],
        users: &KeyIndex,
        dates: &KeyIndex,
        num_weeks: usize,
        policy: UnderflowPolicy,
    ) -> Result<Matrix<Cell<T>>, GridError> {
        if num_weeks == 0 {
            return Err(GridError::InvalidInput(
                "window must span at least one week".to_string(),
            ));
        }
        check_shape(matrix, users, dates)?;

        let width = num_weeks
            .checked_mul(DAYS_PER_WEEK)
            .filter(|&width| width <= matrix.cols())
            .ok_or(GridError::WindowTooWide {
                num_weeks,
                columns: matrix.cols(),
            })?;
        debug!(starts = starts.len(), width, ?policy, "annotating windowed matrix");

        let mut windowed = Matrix::filled(users.len(), width, Cell::default());

        for start in starts {
            let Some((row, col)) = locate_start(start, users, dates)? else {
                continue;
            };

            if col.checked_add(width).map_or(true, |end| end > matrix.cols()) {
                return Err(GridError::WindowOutOfBounds {
                    user_id: start.user_id.clone(),
                    start_column: col,
                    width,
                    columns: matrix.cols(),
                });
            }

            if let Some(source) = matrix.row(row) {
                for (offset, value) in source[col..col + width].iter().enumerate() {
                    windowed.set(row, offset, Cell::from(value.clone()));
                }
            }

            if let Some(marker) = marker_column(0, &start.user_id, policy)? {
                windowed.set(row, marker, Cell::Start);
            }
        }

        Ok(windowed)
    }
}

fn check_shape<T>(matrix: &Matrix<T>, users: &KeyIndex, dates: &KeyIndex) -> Result<(), GridError> {
    if matrix.shape() != (users.len(), dates.len()) {
        return Err(GridError::ShapeMismatch {
            left_rows: matrix.rows(),
            left_cols: matrix.cols(),
            right_rows: users.len(),
            right_cols: dates.len(),
        });
    }
    Ok(())
}

/// Row and column of a user's start date, or `None` when the date is not indexed
fn locate_start(
    start: &UserStart,
    users: &KeyIndex,
    dates: &KeyIndex,
) -> Result<Option<(usize, usize)>, GridError> {
    let row = users
        .get(&start.user_id)
        .ok_or_else(|| GridError::unknown_user(&start.user_id))?;

    match dates.get(&start.start_date) {
        Some(col) => Ok(Some((row, col))),
        None => {
            debug!(
                user_id = %start.user_id,
                start_date = %start.start_date,
                "start date outside window; not annotated"
            );
            Ok(None)
        }
    }
}

fn marker_column(
    start_col: usize,
    user_id: &str,
    policy: UnderflowPolicy,
) -> Result<Option<usize>, GridError> {
    if start_col > 0 {
        return Ok(Some(start_col - 1));
    }

    match policy {
        UnderflowPolicy::Reject => Err(GridError::IndexUnderflow {
            user_id: user_id.to_string(),
        }),
        UnderflowPolicy::Skip => {
            warn!(user_id = %user_id, "start is the first column; marker skipped");
            Ok(None)
        }
        UnderflowPolicy::Clamp => {
            warn!(user_id = %user_id, "start is the first column; marker clamped to column 0");
            Ok(Some(0))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dates::DateRange;
    use pretty_assertions::assert_eq;

    fn v(n: u32) -> Cell<u32> {
        Cell::Value(n)
    }

    fn daily_fixture() -> (Matrix<u32>, KeyIndex, KeyIndex) {
        let users = KeyIndex::build(["u1", "u2"]).unwrap();
        let dates = DateRange::from_strs("2024-01-01", "2024-01-03")
            .unwrap()
            .to_index()
            .unwrap();
        let matrix = Matrix::from_rows(vec![vec![0, 3, 0], vec![0, 0, 0]]).unwrap();
        (matrix, users, dates)
    }

    #[test]
    fn test_daily_marks_day_before_start() {
        let (matrix, users, dates) = daily_fixture();
        let starts = vec![UserStart::new("u1", "2024-01-02")];

        let annotated = StartDateAnnotator::annotate_daily(
            &matrix,
            &starts,
            &users,
            &dates,
            UnderflowPolicy::Reject,
        )
        .unwrap();

        assert_eq!(
            annotated.to_rows(),
            vec![vec![Cell::Start, v(3), v(0)], vec![v(0), v(0), v(0)]]
        );
        assert_eq!(
            serde_json::to_string(&annotated).unwrap(),
            r#"[["Start",3,0],[0,0,0]]"#
        );
        // Source matrix is untouched
        assert_eq!(matrix.get(0, 0), Some(&0));
    }

    #[test]
    fn test_marker_overwrites_count() {
        let (matrix, users, dates) = daily_fixture();
        let starts = vec![UserStart::new("u1", "2024-01-03")];

        let annotated = StartDateAnnotator::annotate_daily(
            &matrix,
            &starts,
            &users,
            &dates,
            UnderflowPolicy::Reject,
        )
        .unwrap();

        assert_eq!(annotated.row(0), Some(&[v(0), Cell::Start, v(0)][..]));
    }

    #[test]
    fn test_start_on_first_column_underflows() {
        let (matrix, users, dates) = daily_fixture();
        let starts = vec![UserStart::new("u2", "2024-01-01")];

        let result = StartDateAnnotator::annotate_daily(
            &matrix,
            &starts,
            &users,
            &dates,
            UnderflowPolicy::Reject,
        );

        match result {
            Err(GridError::IndexUnderflow { user_id }) => assert_eq!(user_id, "u2"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_underflow_never_wraps() {
        let (matrix, users, dates) = daily_fixture();
        let starts = vec![
            UserStart::new("u1", "2024-01-02"),
            UserStart::new("u2", "2024-01-01"),
        ];

        let skipped = StartDateAnnotator::annotate_daily(
            &matrix,
            &starts,
            &users,
            &dates,
            UnderflowPolicy::Skip,
        )
        .unwrap();
        assert_eq!(skipped.row(1), Some(&[v(0), v(0), v(0)][..]));
        assert_eq!(skipped.get(0, 0), Some(&Cell::Start));

        let clamped = StartDateAnnotator::annotate_daily(
            &matrix,
            &starts,
            &users,
            &dates,
            UnderflowPolicy::Clamp,
        )
        .unwrap();
        assert_eq!(clamped.row(1), Some(&[Cell::Start, v(0), v(0)][..]));
    }

    #[test]
    fn test_start_outside_range_is_ignored() {
        let (matrix, users, dates) = daily_fixture();
        let starts = vec![UserStart::new("u1", "2023-12-25")];

        let annotated = StartDateAnnotator::annotate_daily(
            &matrix,
            &starts,
            &users,
            &dates,
            UnderflowPolicy::Reject,
        )
        .unwrap();

        assert!(annotated.iter_rows().flatten().all(|c| !c.is_start()));
    }

    #[test]
    fn test_unknown_user_start_fails() {
        let (matrix, users, dates) = daily_fixture();
        let starts = vec![UserStart::new("ghost", "2024-01-02")];

        assert!(matches!(
            StartDateAnnotator::annotate_daily(
                &matrix,
                &starts,
                &users,
                &dates,
                UnderflowPolicy::Reject
            ),
            Err(GridError::KeyLookup { .. })
        ));
    }

    fn windowed_fixture() -> (Matrix<u32>, KeyIndex, KeyIndex) {
        let users = KeyIndex::build(["u1", "u2"]).unwrap();
        let dates = DateRange::from_strs("2024-01-01", "2024-01-10")
            .unwrap()
            .to_index()
            .unwrap();
        let matrix = Matrix::from_rows(vec![
            (1..=10).collect::<Vec<u32>>(),
            (11..=20).collect::<Vec<u32>>(),
        ])
        .unwrap();
        (matrix, users, dates)
    }

    #[test]
    fn test_windowed_copies_from_start_column() {
        let (matrix, users, dates) = windowed_fixture();
        let starts = vec![UserStart::new("u2", "2024-01-03")];

        let windowed = StartDateAnnotator::annotate_windowed(
            &matrix,
            &starts,
            &users,
            &dates,
            1,
            UnderflowPolicy::Skip,
        )
        .unwrap();

        assert_eq!(windowed.shape(), (2, 7));
        assert_eq!(
            windowed.to_rows(),
            vec![
                vec![v(0); 7],
                (13..=19).map(v).collect::<Vec<_>>(),
            ]
        );
    }

    #[test]
    fn test_windowed_marker_follows_policy() {
        let (matrix, users, dates) = windowed_fixture();
        let starts = vec![UserStart::new("u1", "2024-01-02")];

        let clamped = StartDateAnnotator::annotate_windowed(
            &matrix,
            &starts,
            &users,
            &dates,
            1,
            UnderflowPolicy::Clamp,
        )
        .unwrap();
        assert_eq!(clamped.get(0, 0), Some(&Cell::Start));
        assert_eq!(clamped.get(0, 1), Some(&v(3)));

        let rejected = StartDateAnnotator::annotate_windowed(
            &matrix,
            &starts,
            &users,
            &dates,
            1,
            UnderflowPolicy::Reject,
        );
        assert!(matches!(rejected, Err(GridError::IndexUnderflow { .. })));
    }

    #[test]
    fn test_window_out_of_bounds() {
        let (matrix, users, dates) = windowed_fixture();
        let starts = vec![UserStart::new("u1", "2024-01-05")];

        match StartDateAnnotator::annotate_windowed(
            &matrix,
            &starts,
            &users,
            &dates,
            1,
            UnderflowPolicy::Skip,
        ) {
            Err(GridError::WindowOutOfBounds {
                start_column,
                width,
                columns,
                ..
            }) => {
                assert_eq!((start_column, width, columns), (4, 7, 10));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_window_exactly_fits() {
        let (matrix, users, dates) = windowed_fixture();
        let starts = vec![UserStart::new("u1", "2024-01-04")];

        let windowed = StartDateAnnotator::annotate_windowed(
            &matrix,
            &starts,
            &users,
            &dates,
            1,
            UnderflowPolicy::Skip,
        )
        .unwrap();

        assert_eq!(windowed.get(0, 6), Some(&v(10)));
    }

    #[test]
    fn test_zero_weeks_rejected() {
        let (matrix, users, dates) = windowed_fixture();
        assert!(matches!(
            StartDateAnnotator::annotate_windowed(
                &matrix,
                &[],
                &users,
                &dates,
                0,
                UnderflowPolicy::Skip
            ),
            Err(GridError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_window_wider_than_range_rejected_without_starts() {
        let (matrix, users, dates) = windowed_fixture();

        match StartDateAnnotator::annotate_windowed(
            &matrix,
            &[],
            &users,
            &dates,
            2,
            UnderflowPolicy::Skip,
        ) {
            Err(GridError::WindowTooWide { num_weeks, columns }) => {
                assert_eq!((num_weeks, columns), (2, 10));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_huge_week_counts_fail_cleanly() {
        let (matrix, users, dates) = windowed_fixture();
        let starts = vec![UserStart::new("u1", "2024-01-02")];

        for num_weeks in [usize::MAX, usize::MAX / DAYS_PER_WEEK] {
            let result = StartDateAnnotator::annotate_windowed(
                &matrix,
                &starts,
                &users,
                &dates,
                num_weeks,
                UnderflowPolicy::Skip,
            );
            assert!(matches!(result, Err(GridError::WindowTooWide { .. })));
        }
    }
}
