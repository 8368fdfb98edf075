//! Database persistence layer for board state, settings, scores, users,
//! and the audit log.

mod error;
mod models;
mod repository;
mod schema; // Diesel generated schema - internal use only

pub use error::DbError;
pub use models::{AuditAction, AuditEvent, NewAuditEvent, NewUser, ScoreRow, SquareView, User};
pub use repository::{BoardRepository, QUARTERS};
