//! Board Authority: square ownership transitions under capacity and lock
//! invariants.

mod authority;
mod error;
mod outcome;

pub use authority::{BoardAuthority, BoardSnapshot};
pub use error::BoardError;
pub use outcome::{ChangeOutcome, SkipReason};
