//! Per-user row flattening
//!
//! Turns a finished matrix back into `{user_id, logs}` records for transport.

use serde::{Deserialize, Serialize};

use crate::index::KeyIndex;
use crate::matrix::Matrix;

/// One user's row of a report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRow<T> {
    pub user_id: String,
    pub logs: Vec<T>,
}

/// Serializer from matrices to user rows
pub struct ResultSerializer;

impl ResultSerializer {
    /// One record per indexed user, in the index's iteration order.
    ///
    /// A user whose position has no row in the matrix gets an empty `logs`.
    pub fn to_user_rows<T: Clone>(matrix: &Matrix<T>, users: &KeyIndex) -> Vec<UserRow<T>> {
        users
            .iter()
            .map(|(user_id, position)| UserRow {
                user_id: user_id.to_string(),
                logs: matrix.row(position).map(<[T]>::to_vec).unwrap_or_default(),
            })
            .collect()
    }
}
