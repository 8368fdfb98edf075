//! Draw & Scoring Engine error types.

use derive_more::{Display, Error, From};

use crate::db::DbError;

/// Errors from digit draw and score operations.
#[derive(Debug, Clone, Display, Error, From)]
pub enum DrawError {
    /// The operation requires an administrator actor.
    #[display("administrator privileges required")]
    AdminRequired,
    /// The quarter is outside `1..=4`.
    #[display("invalid quarter: {quarter}")]
    InvalidQuarter {
        /// The offending quarter number.
        quarter: i32,
    },
    /// A negative score was passed.
    #[display("invalid score pair: ({rows_score}, {cols_score})")]
    InvalidScore {
        /// Row-axis team score.
        rows_score: i32,
        /// Column-axis team score.
        cols_score: i32,
    },
    /// A manually supplied digit assignment is not a pair of bijections
    /// on `{0..9}`; nothing is written.
    #[display("invalid digit assignment: each axis needs all ten digits exactly once")]
    InvalidDigitAssignment,
    /// A persistence failure.
    #[display("{_0}")]
    #[from]
    Db(DbError),
}
