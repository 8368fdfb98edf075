//! Error type for the board store.

use derive_more::{Display, Error};
use tracing::instrument;

/// A failure in the board store, tagged with the repository call site
/// that raised it.
///
/// Covers connection setup, diesel statement failures, and missing rows
/// the seeding contract guarantees (squares, score quarters). Component
/// errors ([`BoardError`](crate::BoardError),
/// [`DrawError`](crate::DrawError)) wrap this in their `Db` variant.
#[derive(Debug, Clone, Display, Error)]
#[display("Database error: {} at {}:{}", message, file, line)]
pub struct DbError {
    /// What went wrong.
    pub message: String,
    /// Line of the repository call that failed.
    pub line: u32,
    /// Source file of the repository call that failed.
    pub file: &'static str,
}

impl DbError {
    /// Creates a store error, capturing the caller's location.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}

impl From<diesel::result::Error> for DbError {
    #[track_caller]
    fn from(err: diesel::result::Error) -> Self {
        Self::new(format!("Diesel error: {}", err))
    }
}

impl From<diesel::ConnectionError> for DbError {
    #[track_caller]
    fn from(err: diesel::ConnectionError) -> Self {
        Self::new(format!("Connection error: {}", err))
    }
}
