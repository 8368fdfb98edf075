//! Board Authority error types.

use derive_more::{Display, Error, From};

use crate::db::DbError;

/// Errors that abort an ownership operation before any write.
///
/// Ordinary contention is not an error: racing changes surface as
/// per-item skips inside
/// [`ChangeOutcome`](crate::board::ChangeOutcome).
#[derive(Debug, Clone, Display, Error, From)]
pub enum BoardError {
    /// The board lock flag is set; all ownership mutation is rejected.
    #[display("board is locked")]
    BoardLocked,
    /// The batch would leave the user over the capacity cap.
    #[display("capacity exceeded: selection would leave you with {projected} squares, cap is {cap}")]
    CapacityExceeded {
        /// The configured cap.
        cap: u32,
        /// Squares the user would own after the batch.
        projected: u32,
    },
    /// A square id outside `0..=99` was passed; the whole batch is rejected.
    #[display("invalid square id: {id}")]
    InvalidSquareId {
        /// The offending id.
        id: i32,
    },
    /// The operation requires an administrator actor.
    #[display("administrator privileges required")]
    AdminRequired,
    /// A persistence failure.
    #[display("{_0}")]
    #[from]
    Db(DbError),
}
