//! Betting-pool squares board core.
//!
//! A 10x10 grid of squares for a single sporting event, each claimable by
//! exactly one registered participant. Quarter-end scores map through a
//! random digit permutation to a winning square per quarter.
//!
//! # Architecture
//!
//! - **Board Authority** ([`BoardAuthority`]): owns square ownership
//!   transitions, enforcing exclusivity, capacity caps, and the board lock.
//! - **Draw & Scoring Engine** ([`DrawEngine`]): derives and stores the
//!   row/column digit permutations and computes quarter winners.
//! - **Persistence** ([`BoardRepository`]): SQLite-backed storage; all
//!   durable state lives here and is read fresh per operation.
//!
//! Page rendering, forms, and session/auth plumbing are external
//! collaborators: they hand the core an authenticated [`User`] and a set
//! of desired changes, and display the resulting [`ChangeOutcome`],
//! [`BoardSnapshot`], and [`QuarterWinner`] values.
//!
//! # Example
//!
//! ```no_run
//! use superbowl_squares::{BoardAuthority, BoardRepository};
//!
//! # fn example() -> Result<(), superbowl_squares::BoardError> {
//! let repo = BoardRepository::new("squares.db".to_string())?;
//! repo.initialize()?;
//!
//! let board = BoardAuthority::new(repo.clone());
//! let user = repo.create_user("alice", "Alice", false)?;
//! let outcome = board.apply_changes(&user, &[0, 1, 2], &[])?;
//! println!("{}", outcome.summary());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod board;
mod db;
mod draw;
mod grid;
mod settings;

// Crate-level exports - Board Authority
pub use board::{BoardAuthority, BoardError, BoardSnapshot, ChangeOutcome, SkipReason};

// Crate-level exports - Draw & Scoring Engine
pub use draw::{Axis, Digits, DrawEngine, DrawError, QuarterWinner};

// Crate-level exports - Persistence
pub use db::{
    AuditAction, AuditEvent, BoardRepository, DbError, QUARTERS, ScoreRow, SquareView, User,
};

// Crate-level exports - Grid math and settings
pub use grid::{GRID_SIZE, SQUARE_COUNT, SquareId};
pub use settings::{BoardSettings, SettingsUpdate};
